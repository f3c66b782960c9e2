//! Run outcome reporting and exit-code mapping.

use serde::Serialize;

/// Terminal status of one executor run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    AllCompleted,
    SomeFailed,
    /// Cumulative budget hit with tasks still unrun.
    BudgetExhausted,
    Interrupted,
}

impl RunStatus {
    /// Process exit code for this status. Code 4 (config/startup error) is
    /// produced before an executor run ever starts.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::AllCompleted => 0,
            Self::SomeFailed => 1,
            Self::BudgetExhausted => 2,
            Self::Interrupted => 3,
        }
    }
}

/// End-of-run accounting handed back to the CLI.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub status: RunStatus,
    pub session_id: String,
    pub completed: usize,
    pub failed: usize,
    /// Tasks skipped at startup because a resumed session had already
    /// finished them.
    pub skipped_resumed: usize,
    /// Tasks still queued when the run stopped (budget or interrupt).
    pub unrun: usize,
    pub total_cost_usd: f64,
    /// Percentage in [0, 100]; 0 when nothing finished.
    pub success_rate: f64,
}

impl RunReport {
    pub fn exit_code(&self) -> i32 {
        self.status.exit_code()
    }
}
