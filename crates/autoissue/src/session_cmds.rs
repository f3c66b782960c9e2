//! The `sessions` commands.

use anyhow::Result;

use ai_core::OutputFormat;
use ai_session::SessionStore;

pub(crate) fn handle_sessions_list(output_format: OutputFormat) -> Result<i32> {
    let store = SessionStore::new(SessionStore::default_root()?);
    let sessions = store.list()?;

    match output_format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&sessions)?);
        }
        OutputFormat::Text => {
            if sessions.is_empty() {
                println!("No sessions found under {}", store.sessions_dir().display());
                return Ok(0);
            }
            for session in &sessions {
                println!(
                    "{}  started {}  completed {:<3} failed {:<3} ${:.2}",
                    session.session_id,
                    session.started_at.format("%Y-%m-%d %H:%M"),
                    session.completed_issue_numbers.len(),
                    session.failed_issue_numbers.len(),
                    session.total_cost_usd,
                );
            }
        }
    }

    Ok(0)
}
