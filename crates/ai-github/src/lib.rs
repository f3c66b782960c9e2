//! Source-control host integration via the `gh` CLI.
//!
//! Both collaborators the executor needs from GitHub — fetching issues and
//! opening pull requests — are expressed as traits so tests (and dry runs)
//! can substitute fakes. The real implementations shell out to `gh` with
//! `--json` output.

mod issues;
mod pr;

pub use issues::{GhIssueSource, IssueFilter, IssueSource};
pub use pr::{CreatedPr, GhHost, PullRequestParams, SourceControlHost};
