//! Pull request creation through `gh pr create`.

use anyhow::Result;
use tokio::process::Command;
use tracing::info;

use ai_core::AppError;

/// Inputs for one PR.
#[derive(Debug, Clone)]
pub struct PullRequestParams {
    pub base_branch: String,
    pub head_branch: String,
    pub title: String,
    pub body: String,
    pub draft: bool,
}

#[derive(Debug, Clone)]
pub struct CreatedPr {
    pub url: String,
}

/// Where change requests go.
#[async_trait::async_trait]
pub trait SourceControlHost: Send + Sync {
    async fn create_pull_request(&self, params: &PullRequestParams) -> Result<CreatedPr>;
}

/// The real host, backed by the `gh` CLI.
#[derive(Debug, Clone)]
pub struct GhHost {
    repo: String,
}

impl GhHost {
    pub fn new(repo: impl Into<String>) -> Self {
        Self { repo: repo.into() }
    }
}

fn create_args(repo: &str, params: &PullRequestParams) -> Vec<String> {
    let mut args = vec![
        "pr".into(),
        "create".into(),
        "--repo".into(),
        repo.into(),
        "--base".into(),
        params.base_branch.clone(),
        "--head".into(),
        params.head_branch.clone(),
        "--title".into(),
        params.title.clone(),
        "--body".into(),
        params.body.clone(),
    ];
    if params.draft {
        args.push("--draft".into());
    }
    args
}

#[async_trait::async_trait]
impl SourceControlHost for GhHost {
    async fn create_pull_request(&self, params: &PullRequestParams) -> Result<CreatedPr> {
        let args = create_args(&self.repo, params);
        let output = Command::new("gh").args(&args).output().await.map_err(|e| {
            AppError::PrCreation {
                branch: params.head_branch.clone(),
                message: format!("failed to run gh: {e}"),
            }
        })?;

        if !output.status.success() {
            return Err(AppError::PrCreation {
                branch: params.head_branch.clone(),
                message: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            }
            .into());
        }

        // gh prints the PR URL as the last line of stdout.
        let stdout = String::from_utf8_lossy(&output.stdout);
        let url = stdout
            .lines()
            .rev()
            .find(|line| !line.trim().is_empty())
            .unwrap_or("")
            .trim()
            .to_string();

        info!(branch = %params.head_branch, %url, "pull request created");
        Ok(CreatedPr { url })
    }
}
