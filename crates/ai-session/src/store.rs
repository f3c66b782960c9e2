//! Session persistence: one JSON file per session, written atomically.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::{debug, warn};

use crate::state::SessionState;
use crate::validate::validate_session_id;

/// Reads and writes session state files under `<root>/sessions/`.
#[derive(Debug, Clone)]
pub struct SessionStore {
    root: PathBuf,
}

impl SessionStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Default state root: `~/.local/state/autoissue` on Linux, the local
    /// data dir elsewhere.
    pub fn default_root() -> Result<PathBuf> {
        let proj_dirs = directories::ProjectDirs::from("", "", "autoissue")
            .context("Failed to determine project directories")?;
        let state_dir = proj_dirs
            .state_dir()
            .unwrap_or_else(|| proj_dirs.data_local_dir());
        Ok(state_dir.to_path_buf())
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn sessions_dir(&self) -> PathBuf {
        self.root.join("sessions")
    }

    pub fn state_path(&self, session_id: &str) -> PathBuf {
        self.sessions_dir().join(format!("{session_id}.json"))
    }

    pub(crate) fn lock_path(&self, session_id: &str) -> PathBuf {
        self.sessions_dir().join(format!("{session_id}.lock"))
    }

    pub fn exists(&self, session_id: &str) -> bool {
        self.state_path(session_id).exists()
    }

    /// Persist the state atomically: write to a temp file in the sessions
    /// directory, then rename over the target. Stamps `lastCheckpointAt`.
    pub fn save(&self, state: &mut SessionState) -> Result<()> {
        validate_session_id(&state.session_id)?;
        let dir = self.sessions_dir();
        fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create sessions dir: {}", dir.display()))?;

        state.touch();
        let json = serde_json::to_string_pretty(state).context("Failed to serialize session state")?;

        let target = self.state_path(&state.session_id);
        let mut tmp = tempfile::NamedTempFile::new_in(&dir)
            .with_context(|| format!("Failed to create temp file in {}", dir.display()))?;
        std::io::Write::write_all(&mut tmp, json.as_bytes())
            .context("Failed to write session state")?;
        tmp.persist(&target)
            .with_context(|| format!("Failed to persist session state: {}", target.display()))?;

        debug!(session_id = %state.session_id, path = %target.display(), "checkpoint written");
        Ok(())
    }

    pub fn load(&self, session_id: &str) -> Result<SessionState> {
        validate_session_id(session_id)?;
        let path = self.state_path(session_id);
        let content = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read session state: {}", path.display()))?;
        serde_json::from_str(&content)
            .with_context(|| format!("Malformed session state: {}", path.display()))
    }

    /// All parseable sessions, newest first. Unreadable files are skipped
    /// with a warning rather than failing the listing.
    pub fn list(&self) -> Result<Vec<SessionState>> {
        let dir = self.sessions_dir();
        if !dir.exists() {
            return Ok(Vec::new());
        }

        let mut sessions = Vec::new();
        for entry in fs::read_dir(&dir)
            .with_context(|| format!("Failed to read sessions dir: {}", dir.display()))?
        {
            let entry = entry?;
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            match fs::read_to_string(&path)
                .map_err(anyhow::Error::from)
                .and_then(|text| serde_json::from_str::<SessionState>(&text).map_err(Into::into))
            {
                Ok(state) => sessions.push(state),
                Err(e) => warn!(path = %path.display(), error = %e, "skipping unreadable session file"),
            }
        }

        sessions.sort_by(|a, b| b.started_at.cmp(&a.started_at));
        Ok(sessions)
    }
}
