//! Durable, crash-resumable session state with single-writer locking.
//!
//! A session is one executor invocation. Its state is a JSON file under
//! `<stateRoot>/sessions/`, written atomically after every task completion
//! so a crashed or interrupted run can resume without repeating finished
//! work. An advisory `flock(2)` on a sibling lock file keeps two processes
//! from driving the same session at once.

pub mod lock;
pub mod state;
pub mod store;
pub mod validate;

pub use lock::SessionLock;
pub use state::SessionState;
pub use store::SessionStore;
pub use validate::{new_session_id, validate_session_id};
