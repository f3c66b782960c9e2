//! The `classify` command: show what the scheduler would see, without
//! running anything.

use std::path::PathBuf;

use anyhow::Result;
use serde::Serialize;

use ai_classifier::{Classification, classify};
use ai_core::OutputFormat;
use ai_github::{GhIssueSource, IssueSource};

use crate::common::{build_filter, load_config};

#[derive(Serialize)]
struct ClassifiedIssue {
    number: u64,
    title: String,
    #[serde(flatten)]
    classification: Classification,
}

pub(crate) async fn handle_classify(
    label: Option<String>,
    issues: Vec<u64>,
    config: Option<PathBuf>,
    cd: Option<PathBuf>,
    output_format: OutputFormat,
) -> Result<i32> {
    let config = load_config(config, cd)?;
    let filter = build_filter(label, issues)?;

    let source = GhIssueSource::new(&config.project.repo);
    let records = source.fetch_issues(&filter).await?;

    let classified: Vec<ClassifiedIssue> = records
        .iter()
        .map(|issue| ClassifiedIssue {
            number: issue.number,
            title: issue.title.clone(),
            classification: classify(issue),
        })
        .collect();

    match output_format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&classified)?);
        }
        OutputFormat::Text => {
            for item in &classified {
                println!(
                    "#{:<6} {:<15} {:>4.2}  {}",
                    item.number,
                    item.classification.domain.to_string(),
                    item.classification.confidence,
                    item.title
                );
                for reason in &item.classification.reasons {
                    println!("        - {reason}");
                }
            }
            println!();
            println!("{} issues classified", classified.len());
        }
    }

    Ok(0)
}
