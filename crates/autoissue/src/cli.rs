use std::path::PathBuf;

use clap::{Parser, Subcommand};

use ai_core::OutputFormat;

#[derive(Parser)]
#[command(name = "autoissue", version)]
#[command(about = "Parallel issue-to-PR automation driven by coding agents")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Output format (text or json)
    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Execute a batch of issues: one isolated worktree and agent run each
    Run {
        /// Select open issues carrying this label
        #[arg(long, conflicts_with = "issues")]
        label: Option<String>,

        /// Explicit issue numbers (comma-separated)
        #[arg(long, value_delimiter = ',')]
        issues: Vec<u64>,

        /// Resume a previous session by ID (ULID)
        #[arg(long)]
        resume: Option<String>,

        /// Classify and schedule, but stub out the agent and skip PRs
        #[arg(long)]
        dry_run: bool,

        /// Config file path (defaults to autoissue.toml in the working directory)
        #[arg(long)]
        config: Option<PathBuf>,

        /// Working directory (defaults to CWD)
        #[arg(long)]
        cd: Option<PathBuf>,
    },

    /// Classify issues and print domain, confidence, and evidence
    Classify {
        /// Select open issues carrying this label
        #[arg(long, conflicts_with = "issues")]
        label: Option<String>,

        /// Explicit issue numbers (comma-separated)
        #[arg(long, value_delimiter = ',')]
        issues: Vec<u64>,

        /// Config file path (defaults to autoissue.toml in the working directory)
        #[arg(long)]
        config: Option<PathBuf>,

        /// Working directory (defaults to CWD)
        #[arg(long)]
        cd: Option<PathBuf>,
    },

    /// Inspect sessions
    Sessions {
        #[command(subcommand)]
        cmd: SessionCommands,
    },

    /// Inspect configuration
    Config {
        #[command(subcommand)]
        cmd: ConfigCommands,
    },
}

#[derive(Subcommand)]
pub enum SessionCommands {
    /// List sessions, newest first
    List,
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Print the effective configuration
    Show {
        /// Config file path (defaults to autoissue.toml in the working directory)
        #[arg(long)]
        config: Option<PathBuf>,

        /// Working directory (defaults to CWD)
        #[arg(long)]
        cd: Option<PathBuf>,
    },

    /// Load the configuration and report validation errors
    Validate {
        /// Config file path (defaults to autoissue.toml in the working directory)
        #[arg(long)]
        config: Option<PathBuf>,

        /// Working directory (defaults to CWD)
        #[arg(long)]
        cd: Option<PathBuf>,
    },
}
