//! Fetching issues through `gh issue list` / `gh issue view`.

use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use tokio::process::Command;
use tracing::info;

use ai_core::{AppError, IssueRecord, IssueState};

const GH_JSON_FIELDS: &str = "number,title,body,labels,state,createdAt,updatedAt,url";
const LIST_LIMIT: &str = "200";

/// Which issues to pull into the session.
#[derive(Debug, Clone)]
pub enum IssueFilter {
    /// Open issues carrying this label.
    Label(String),
    /// An explicit set of issue numbers.
    Numbers(Vec<u64>),
}

/// Where issue records come from.
#[async_trait::async_trait]
pub trait IssueSource: Send + Sync {
    async fn fetch_issues(&self, filter: &IssueFilter) -> Result<Vec<IssueRecord>>;
}

/// Issue shape returned by `gh --json`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GhIssue {
    number: u64,
    title: String,
    #[serde(default)]
    body: String,
    #[serde(default)]
    labels: Vec<GhLabel>,
    state: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    url: String,
}

#[derive(Debug, Deserialize)]
struct GhLabel {
    name: String,
}

impl From<GhIssue> for IssueRecord {
    fn from(issue: GhIssue) -> Self {
        let state = if issue.state.eq_ignore_ascii_case("open") {
            IssueState::Open
        } else {
            IssueState::Closed
        };
        IssueRecord {
            number: issue.number,
            title: issue.title,
            body: issue.body,
            labels: issue.labels.into_iter().map(|l| l.name).collect(),
            state,
            created_at: issue.created_at,
            updated_at: issue.updated_at,
            url: issue.url,
        }
    }
}

/// The real issue source, backed by the `gh` CLI.
#[derive(Debug, Clone)]
pub struct GhIssueSource {
    repo: String,
}

impl GhIssueSource {
    pub fn new(repo: impl Into<String>) -> Self {
        Self { repo: repo.into() }
    }
}

fn list_args(repo: &str, label: &str) -> Vec<String> {
    vec![
        "issue".into(),
        "list".into(),
        "--repo".into(),
        repo.into(),
        "--label".into(),
        label.into(),
        "--state".into(),
        "open".into(),
        "--limit".into(),
        LIST_LIMIT.into(),
        "--json".into(),
        GH_JSON_FIELDS.into(),
    ]
}

fn view_args(repo: &str, number: u64) -> Vec<String> {
    vec![
        "issue".into(),
        "view".into(),
        number.to_string(),
        "--repo".into(),
        repo.into(),
        "--json".into(),
        GH_JSON_FIELDS.into(),
    ]
}

async fn run_gh(args: &[String]) -> Result<String> {
    let output = Command::new("gh")
        .args(args)
        .output()
        .await
        .map_err(|e| AppError::IssueSource(format!("failed to run gh: {e}")))?;

    if !output.status.success() {
        return Err(AppError::IssueSource(format!(
            "gh {} failed: {}",
            args.first().map(String::as_str).unwrap_or(""),
            String::from_utf8_lossy(&output.stderr).trim()
        ))
        .into());
    }

    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

#[async_trait::async_trait]
impl IssueSource for GhIssueSource {
    async fn fetch_issues(&self, filter: &IssueFilter) -> Result<Vec<IssueRecord>> {
        let issues = match filter {
            IssueFilter::Label(label) => {
                let stdout = run_gh(&list_args(&self.repo, label)).await?;
                let parsed: Vec<GhIssue> = serde_json::from_str(&stdout)
                    .map_err(|e| AppError::IssueSource(format!("malformed gh output: {e}")))?;
                parsed.into_iter().map(IssueRecord::from).collect()
            }
            IssueFilter::Numbers(numbers) => {
                let mut records = Vec::with_capacity(numbers.len());
                for number in numbers {
                    let stdout = run_gh(&view_args(&self.repo, *number)).await?;
                    let parsed: GhIssue = serde_json::from_str(&stdout).map_err(|e| {
                        AppError::IssueSource(format!("malformed gh output for #{number}: {e}"))
                    })?;
                    records.push(IssueRecord::from(parsed));
                }
                records
            }
        };

        info!(repo = %self.repo, count = issues.len(), "fetched issues");
        Ok(issues)
    }
}
