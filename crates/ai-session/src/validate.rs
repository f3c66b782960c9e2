//! Session ID generation and validation.

use anyhow::Result;

use ai_core::AppError;

/// Mint a fresh session ID (ULID, 26 chars Crockford Base32).
pub fn new_session_id() -> String {
    ulid::Ulid::new().to_string()
}

/// Reject anything that is not a well-formed ULID before it touches the
/// filesystem — session IDs become path components.
pub fn validate_session_id(id: &str) -> Result<()> {
    if id.len() != 26 || ulid::Ulid::from_string(id).is_err() {
        return Err(AppError::InvalidSessionId(id.to_string()).into());
    }
    Ok(())
}
