//! Shared data model and error types for autoissue.

pub mod domain;
pub mod error;
pub mod types;

pub use domain::{Domain, are_domains_compatible, is_valid_domain};
pub use error::AppError;
pub use types::{AgentModel, IssueRecord, IssueState, OutputFormat, Task, TaskStatus};
