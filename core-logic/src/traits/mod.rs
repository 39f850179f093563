use anyhow::Result;
use async_trait::async_trait;
use std::fmt;

/// Outcome of one account's task.
///
/// `success = true` together with an `error` means the on-chain part went
/// through but a follow-up step (verification) did not.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskResult {
    pub success: bool,
    pub message: String,
    pub tx_hash: Option<String>,
    pub error: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskStatus {
    Success,
    Unverified,
    Failed,
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TaskStatus::Success => f.write_str("SUCCESS"),
            TaskStatus::Unverified => f.write_str("UNVERIFIED"),
            TaskStatus::Failed => f.write_str("FAILED"),
        }
    }
}

impl TaskResult {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
            tx_hash: None,
            error: None,
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        let error = error.into();
        Self {
            success: false,
            message: error.clone(),
            tx_hash: None,
            error: Some(error),
        }
    }

    pub fn unverified(message: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
            tx_hash: None,
            error: Some(error.into()),
        }
    }

    pub fn with_tx_hash(mut self, tx_hash: impl Into<String>) -> Self {
        self.tx_hash = Some(tx_hash.into());
        self
    }

    pub fn status(&self) -> TaskStatus {
        match (self.success, &self.error) {
            (true, None) => TaskStatus::Success,
            (true, Some(_)) => TaskStatus::Unverified,
            (false, _) => TaskStatus::Failed,
        }
    }
}

#[async_trait]
pub trait Task<Ctx>: Send + Sync {
    /// Returns the name of the task
    fn name(&self) -> &str;

    /// Executes the task for one unit of work
    async fn run(&self, ctx: Ctx) -> Result<TaskResult>;
}
