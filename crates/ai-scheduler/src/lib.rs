//! Sliding-window scheduler with domain-conflict admission control.
//!
//! The scheduler owns a fixed set of execution slots and a FIFO queue of
//! pending tasks. An admission pass walks the queue and moves every task
//! that is pairwise-compatible with the currently running set into a free
//! slot; skipped tasks keep their queue position. The scheduler is
//! single-owner state: only the executor's coordinator mutates it, so no
//! locking is needed.

mod scheduler;

pub use scheduler::{BlockedTask, MAX_SLOTS, MIN_SLOTS, RunSummary, Scheduler, SchedulerStatus};
