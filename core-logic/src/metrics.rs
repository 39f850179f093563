use crate::traits::TaskStatus;
use std::sync::atomic::{AtomicU64, Ordering};

/// "Accounts completed" out of a fixed total, shared by all workers.
#[derive(Debug)]
pub struct ProgressCounter {
    completed: AtomicU64,
    total: u64,
}

impl ProgressCounter {
    pub fn new(total: u64) -> Self {
        Self {
            completed: AtomicU64::new(0),
            total,
        }
    }

    /// Records one finished account and returns the new completed count.
    pub fn increment(&self) -> u64 {
        self.completed.fetch_add(1, Ordering::SeqCst) + 1
    }

    pub fn completed(&self) -> u64 {
        self.completed.load(Ordering::SeqCst)
    }

    pub fn total(&self) -> u64 {
        self.total
    }

    /// `[completed/total]`, used as a log-line prefix.
    pub fn tag(&self) -> String {
        format!("[{}/{}]", self.completed(), self.total)
    }
}

/// Per-run tally of account outcomes.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    pub succeeded: u64,
    pub unverified: u64,
    pub failed: u64,
    /// Accounts never dispatched because the run was cancelled.
    pub skipped: u64,
}

impl RunSummary {
    pub fn record(&mut self, status: TaskStatus) {
        match status {
            TaskStatus::Success => self.succeeded += 1,
            TaskStatus::Unverified => self.unverified += 1,
            TaskStatus::Failed => self.failed += 1,
        }
    }

    pub fn finished(&self) -> u64 {
        self.succeeded + self.unverified + self.failed
    }

    pub fn success_rate(&self) -> f64 {
        let total = self.finished();
        if total == 0 {
            return 0.0;
        }
        ((self.succeeded + self.unverified) as f64 / total as f64) * 100.0
    }
}
