//! The external code-generation agent: trait, Claude CLI runner, dry-run
//! stub, and the subprocess plumbing they share.
//!
//! The agent is opaque to the rest of the system: it gets a working
//! directory, prompts, and budgets, and reports back success, cost, and
//! duration. Failure is terminal for the task — there is no retry here.

mod claude;
mod process;
mod runner;

pub use claude::ClaudeAgent;
pub use process::{ProcessResult, check_tool_installed, run_with_timeout};
pub use runner::{AgentFailure, AgentOutcome, AgentRequest, AgentRunner, DryRunAgent};
