//! The `config` commands.

use std::path::PathBuf;

use anyhow::Result;

use ai_core::OutputFormat;

use crate::common::load_config;

pub(crate) fn handle_config_show(
    config: Option<PathBuf>,
    cd: Option<PathBuf>,
    output_format: OutputFormat,
) -> Result<i32> {
    let config = load_config(config, cd)?;
    match output_format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&config)?),
        OutputFormat::Text => print!("{}", toml::to_string_pretty(&config)?),
    }
    Ok(0)
}

pub(crate) fn handle_config_validate(config: Option<PathBuf>, cd: Option<PathBuf>) -> Result<i32> {
    // Load performs validation; reaching here means the file is sound.
    let config = load_config(config, cd)?;
    println!(
        "Configuration OK ({} on {})",
        config.project.repo, config.project.base_branch
    );
    Ok(0)
}
