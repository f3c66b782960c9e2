use anyhow::Result;
use clap::Parser;

mod classify_cmd;
mod cli;
mod common;
mod config_cmds;
mod run_cmd;
mod session_cmds;

use cli::{Cli, Commands, ConfigCommands, SessionCommands};

/// Exit code for configuration or startup errors (before any task ran).
const EXIT_STARTUP_ERROR: i32 = 4;

#[tokio::main]
async fn main() {
    // Initialize tracing (output to stderr, initialize only once)
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init()
        .ok();

    let cli = Cli::parse();

    let exit_code = match dispatch(cli).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {e:#}");
            EXIT_STARTUP_ERROR
        }
    };
    std::process::exit(exit_code);
}

async fn dispatch(cli: Cli) -> Result<i32> {
    let output_format = cli.format;

    match cli.command {
        Commands::Run {
            label,
            issues,
            resume,
            dry_run,
            config,
            cd,
        } => {
            run_cmd::handle_run(label, issues, resume, dry_run, config, cd, output_format).await
        }
        Commands::Classify {
            label,
            issues,
            config,
            cd,
        } => classify_cmd::handle_classify(label, issues, config, cd, output_format).await,
        Commands::Sessions { cmd } => match cmd {
            SessionCommands::List => session_cmds::handle_sessions_list(output_format),
        },
        Commands::Config { cmd } => match cmd {
            ConfigCommands::Show { config, cd } => {
                config_cmds::handle_config_show(config, cd, output_format)
            }
            ConfigCommands::Validate { config, cd } => {
                config_cmds::handle_config_validate(config, cd)
            }
        },
    }
}
