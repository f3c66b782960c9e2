//! Session state types.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Crash-resumable record of one executor session.
///
/// Field names serialize camelCase; the on-disk schema is part of the
/// product surface (other tooling reads these files).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionState {
    /// ULID, assigned at first start and preserved across resume.
    pub session_id: String,

    pub started_at: DateTime<Utc>,

    /// The validated configuration the session started with.
    pub config_snapshot: serde_json::Value,

    /// Issues that finished successfully. Superset-monotonic: an issue in
    /// this set has truly completed; an issue absent may still be running.
    #[serde(default)]
    pub completed_issue_numbers: BTreeSet<u64>,

    /// Issues that terminally failed in this session.
    #[serde(default)]
    pub failed_issue_numbers: BTreeSet<u64>,

    /// Cumulative agent spend across the whole session, resumed runs
    /// included.
    #[serde(default)]
    pub total_cost_usd: f64,

    pub last_checkpoint_at: DateTime<Utc>,
}

impl SessionState {
    pub fn new(session_id: impl Into<String>, config_snapshot: serde_json::Value) -> Self {
        let now = Utc::now();
        Self {
            session_id: session_id.into(),
            started_at: now,
            config_snapshot,
            completed_issue_numbers: BTreeSet::new(),
            failed_issue_numbers: BTreeSet::new(),
            total_cost_usd: 0.0,
            last_checkpoint_at: now,
        }
    }

    pub fn record_completed(&mut self, issue_number: u64) {
        self.completed_issue_numbers.insert(issue_number);
    }

    pub fn record_failed(&mut self, issue_number: u64) {
        self.failed_issue_numbers.insert(issue_number);
    }

    pub fn add_cost(&mut self, cost_usd: f64) {
        self.total_cost_usd += cost_usd;
    }

    /// Whether this issue already finished (either way) in this session.
    pub fn is_finished(&self, issue_number: u64) -> bool {
        self.completed_issue_numbers.contains(&issue_number)
            || self.failed_issue_numbers.contains(&issue_number)
    }

    pub fn finished_count(&self) -> usize {
        self.completed_issue_numbers.len() + self.failed_issue_numbers.len()
    }

    /// Stamp the checkpoint time; called by the store on every save.
    pub fn touch(&mut self) {
        self.last_checkpoint_at = Utc::now();
    }
}
