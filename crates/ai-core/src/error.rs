use std::path::PathBuf;

#[derive(thiserror::Error, Debug)]
pub enum AppError {
    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Failed to fetch issues: {0}")]
    IssueSource(String),

    #[error(
        "Worktree operation failed at {}: {message} \
         (recovery hint: git worktree prune && rm -rf .worktrees/)",
        .path.display()
    )]
    Worktree { path: PathBuf, message: String },

    #[error("Agent run for issue #{issue} failed: {message}")]
    Agent { issue: u64, message: String },

    #[error("Branch '{branch}' pushed but PR creation failed: {message}")]
    PrCreation { branch: String, message: String },

    #[error("Budget exhausted: ${spent:.2} spent of ${limit:.2} total limit")]
    BudgetExhausted { spent: f64, limit: f64 },

    #[error("Interrupted by signal")]
    Interrupted,

    #[error("Invalid session ID '{0}': expected ULID format (26 chars Crockford Base32)")]
    InvalidSessionId(String),
}
