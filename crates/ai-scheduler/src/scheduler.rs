use std::collections::{HashSet, VecDeque};

use anyhow::{Result, bail};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, info};

use ai_core::{Task, TaskStatus, are_domains_compatible};

pub const MIN_SLOTS: usize = 1;
pub const MAX_SLOTS: usize = 10;

/// One of the N concurrent execution positions. Reused across tasks.
#[derive(Debug, Clone, Default)]
struct Slot {
    task: Option<Task>,
    started_at: Option<DateTime<Utc>>,
}

/// Point-in-time counts for progress output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SchedulerStatus {
    pub running: usize,
    pub queued: usize,
    pub completed: usize,
    pub failed: usize,
    pub total: usize,
}

/// End-of-session accounting.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RunSummary {
    pub completed: usize,
    pub failed: usize,
    /// Percentage in [0, 100]; 0 when nothing finished yet.
    pub success_rate: f64,
}

/// Why a queued task could not be admitted right now.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BlockedTask {
    pub issue_number: u64,
    pub reasons: Vec<String>,
}

/// Slot/queue state for one executor session.
///
/// Invariants, preserved by every operation:
/// - a task appears at most once across queue and slots;
/// - running tasks are pairwise domain-compatible;
/// - `completed + failed + running + queued == |scheduled|`.
#[derive(Debug)]
pub struct Scheduler {
    max_slots: usize,
    slots: Vec<Slot>,
    queue: VecDeque<Task>,
    scheduled: HashSet<u64>,
    completed: usize,
    failed: usize,
}

impl Scheduler {
    /// Allocate a scheduler with `max_slots` empty slots.
    pub fn new(max_slots: usize) -> Result<Self> {
        if !(MIN_SLOTS..=MAX_SLOTS).contains(&max_slots) {
            bail!(
                "max_slots must be in {}..={} (got {})",
                MIN_SLOTS,
                MAX_SLOTS,
                max_slots
            );
        }
        Ok(Self {
            max_slots,
            slots: vec![Slot::default(); max_slots],
            queue: VecDeque::new(),
            scheduled: HashSet::new(),
            completed: 0,
            failed: 0,
        })
    }

    pub fn max_slots(&self) -> usize {
        self.max_slots
    }

    /// Append a task to the queue. Idempotent per issue number: a task that
    /// was ever scheduled in this session is not accepted again.
    pub fn enqueue(&mut self, task: Task) -> bool {
        if !self.scheduled.insert(task.issue_number) {
            debug!(issue = task.issue_number, "already scheduled, ignoring enqueue");
            return false;
        }
        debug!(issue = task.issue_number, domain = %task.domain, "enqueued");
        self.queue.push_back(task);
        true
    }

    /// Admission pass: walk the queue in FIFO order and move every task
    /// compatible with the running set into a free slot.
    ///
    /// Skipped tasks keep their queue position and later tasks are still
    /// considered, so cross-domain work interleaves past a blocked head.
    /// This means a task can in principle wait behind an arbitrarily long
    /// stream of compatible later arrivals; that starvation is accepted,
    /// and `block_reasons` keeps the wait observable.
    ///
    /// Returns the newly admitted tasks (status already set to running).
    pub fn fill_slots(&mut self) -> Vec<Task> {
        let mut admitted = Vec::new();
        let mut index = 0;

        while index < self.queue.len() {
            let Some(slot_index) = self.free_slot_index() else {
                break;
            };

            let candidate = &self.queue[index];
            let compatible = self
                .running_tasks()
                .all(|running| are_domains_compatible(candidate.domain, running.domain));

            if !compatible {
                index += 1;
                continue;
            }

            // remove() shifts the remainder left, so `index` now points at
            // the next candidate already.
            let mut task = self
                .queue
                .remove(index)
                .unwrap_or_else(|| unreachable!("index bounded by queue length"));
            task.status = TaskStatus::Running;
            info!(issue = task.issue_number, domain = %task.domain, slot = slot_index, "admitted");
            self.slots[slot_index] = Slot {
                task: Some(task.clone()),
                started_at: Some(Utc::now()),
            };
            admitted.push(task);
        }

        admitted
    }

    /// Free the slot occupied by `issue_number` and record the outcome.
    /// Returns false (and changes nothing) when no slot holds that task.
    pub fn complete(&mut self, issue_number: u64, success: bool) -> bool {
        let Some(slot) = self
            .slots
            .iter_mut()
            .find(|s| s.task.as_ref().is_some_and(|t| t.issue_number == issue_number))
        else {
            debug!(issue = issue_number, "complete() for task not in any slot");
            return false;
        };

        let mut task = slot
            .task
            .take()
            .unwrap_or_else(|| unreachable!("slot matched on occupied task"));
        slot.started_at = None;

        if success {
            task.status = TaskStatus::Completed;
            task.completed_at = Some(Utc::now());
            self.completed += 1;
        } else {
            task.status = TaskStatus::Failed;
            self.failed += 1;
        }
        info!(issue = issue_number, success, "slot freed");

        debug_assert_eq!(
            self.completed + self.failed + self.running_count() + self.queue.len(),
            self.scheduled.len(),
            "scheduler accounting drifted"
        );
        true
    }

    /// Whether anything is queued or running.
    pub fn has_work(&self) -> bool {
        !self.queue.is_empty() || self.running_count() > 0
    }

    pub fn is_complete(&self) -> bool {
        !self.has_work()
    }

    pub fn status(&self) -> SchedulerStatus {
        SchedulerStatus {
            running: self.running_count(),
            queued: self.queue.len(),
            completed: self.completed,
            failed: self.failed,
            total: self.scheduled.len(),
        }
    }

    pub fn summary(&self) -> RunSummary {
        let finished = self.completed + self.failed;
        let success_rate = if finished == 0 {
            0.0
        } else {
            self.completed as f64 / finished as f64 * 100.0
        };
        RunSummary {
            completed: self.completed,
            failed: self.failed,
            success_rate,
        }
    }

    /// Tasks currently occupying slots.
    pub fn running(&self) -> Vec<&Task> {
        self.running_tasks().collect()
    }

    /// For each queued task, why it cannot be admitted right now: the
    /// running tasks whose domain blocks it, or the absence of a free slot.
    pub fn block_reasons(&self) -> Vec<BlockedTask> {
        let has_free_slot = self.free_slot_index().is_some();

        self.queue
            .iter()
            .map(|queued| {
                let mut reasons: Vec<String> = self
                    .running_tasks()
                    .filter(|running| !are_domains_compatible(queued.domain, running.domain))
                    .map(|running| {
                        if running.domain == queued.domain {
                            format!(
                                "Blocked by {} task #{} (same domain)",
                                running.domain, running.issue_number
                            )
                        } else {
                            format!("Blocked by {} task #{}", running.domain, running.issue_number)
                        }
                    })
                    .collect();
                if reasons.is_empty() && !has_free_slot {
                    reasons.push("No free slots".to_string());
                }
                BlockedTask {
                    issue_number: queued.issue_number,
                    reasons,
                }
            })
            .collect()
    }

    fn running_tasks(&self) -> impl Iterator<Item = &Task> {
        self.slots.iter().filter_map(|s| s.task.as_ref())
    }

    fn running_count(&self) -> usize {
        self.running_tasks().count()
    }

    fn free_slot_index(&self) -> Option<usize> {
        self.slots.iter().position(|s| s.task.is_none())
    }
}

#[cfg(test)]
#[path = "scheduler_tests.rs"]
mod tests;
