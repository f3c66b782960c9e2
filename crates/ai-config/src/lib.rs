//! Configuration loading and validation for autoissue.
//!
//! Configuration lives in an `autoissue.toml` next to the target checkout
//! (or wherever `--config` points). Every recognized option has a serde
//! default; [`Config::validate`] enforces the documented bounds and is the
//! gate between "file parsed" and "safe to run".

mod config;
mod validate;

pub use config::{AgentConfig, Config, ExecutorConfig, ProjectConfig};
