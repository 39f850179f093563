use crate::config::DelayRange;
use crate::metrics::{ProgressCounter, RunSummary};
use crate::traits::{Task, TaskResult, TaskStatus};
use std::sync::Arc;
use tokio::signal;
use tokio::sync::Semaphore;
use tokio::task::{JoinError, JoinSet};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn, Instrument};

/// Cancels `token` on the first Ctrl+C.
pub fn spawn_shutdown_listener(token: CancellationToken) {
    tokio::spawn(async move {
        match signal::ctrl_c().await {
            Ok(()) => {
                info!("🛑 Received Ctrl+C. Initiating graceful shutdown...");
                token.cancel();
            }
            Err(err) => {
                error!("Unable to listen for shutdown signal: {}", err);
            }
        }
    });
}

/// Bounded fan-out of one task over a list of accounts.
///
/// At most `threads` accounts are in flight. A worker keeps its slot until
/// its task has finished and the inter-account delay has elapsed, so the
/// next dispatch into that slot waits for both.
pub struct Scheduler {
    threads: usize,
    delay_between: DelayRange,
    cancel: CancellationToken,
}

impl Scheduler {
    pub fn new(threads: usize, delay_between: DelayRange, cancel: CancellationToken) -> Self {
        Self {
            threads: threads.max(1),
            delay_between,
            cancel,
        }
    }

    pub async fn run<A, T>(
        &self,
        accounts: Vec<A>,
        task: Arc<T>,
        progress: Arc<ProgressCounter>,
    ) -> RunSummary
    where
        A: Send + 'static,
        T: Task<A> + ?Sized + 'static,
    {
        let total = accounts.len();
        let slots = Arc::new(Semaphore::new(self.threads));
        let mut set = JoinSet::new();
        let mut summary = RunSummary::default();
        let start_time = std::time::Instant::now();

        info!(
            "Starting '{}' for {} accounts on {} threads",
            task.name(),
            total,
            self.threads
        );

        for (i, account) in accounts.into_iter().enumerate() {
            // finished accounts are tallied as we go so the set only holds live tasks
            while let Some(res) = set.try_join_next() {
                tally(&mut summary, res);
            }

            let permit = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => {
                    summary.skipped = (total - i) as u64;
                    warn!("Shutdown requested, {} accounts left undispatched", summary.skipped);
                    break;
                }
                permit = slots.clone().acquire_owned() => match permit {
                    Ok(permit) => permit,
                    Err(_) => break,
                },
            };

            let task = task.clone();
            let progress = progress.clone();
            let cancel = self.cancel.clone();
            let pause = if i + 1 < total {
                self.delay_between.sample()
            } else {
                std::time::Duration::ZERO
            };
            let span = tracing::info_span!("account", idx = format!("{:03}", i + 1));

            set.spawn(
                async move {
                    let result = match task.run(account).await {
                        Ok(result) => result,
                        Err(e) => TaskResult::failed(format!("{:#}", e)),
                    };
                    progress.increment();
                    log_outcome(task.name(), &progress, &result);

                    if !pause.is_zero() {
                        tokio::select! {
                            _ = cancel.cancelled() => {}
                            _ = tokio::time::sleep(pause) => {}
                        }
                    }
                    drop(permit);
                    result.status()
                }
                .instrument(span),
            );
        }

        while let Some(res) = set.join_next().await {
            tally(&mut summary, res);
        }

        info!(
            target: "task_result",
            "Total Time: {:.1}s | Success: {} | Unverified: {} | Failed: {} | Skipped: {} | Success Rate: {:.2}%",
            start_time.elapsed().as_secs_f64(),
            summary.succeeded,
            summary.unverified,
            summary.failed,
            summary.skipped,
            summary.success_rate()
        );

        summary
    }
}

fn tally(summary: &mut RunSummary, res: Result<TaskStatus, JoinError>) {
    match res {
        Ok(status) => summary.record(status),
        Err(e) => {
            error!("An account task panicked or failed to join: {:?}", e);
            summary.record(TaskStatus::Failed);
        }
    }
}

fn log_outcome(task_name: &str, progress: &ProgressCounter, result: &TaskResult) {
    let tx = result
        .tx_hash
        .as_deref()
        .map(|h| format!(" | tx: {}", h))
        .unwrap_or_default();

    match result.status() {
        TaskStatus::Success => info!(
            target: "task_result",
            "{} {} | SUCCESS | {}{}",
            progress.tag(),
            task_name,
            result.message,
            tx
        ),
        TaskStatus::Unverified => warn!(
            target: "task_result",
            "{} {} | UNVERIFIED | {} | {}{}",
            progress.tag(),
            task_name,
            result.message,
            result.error.as_deref().unwrap_or_default(),
            tx
        ),
        TaskStatus::Failed => error!(
            target: "task_result",
            "{} {} | FAILED | {}",
            progress.tag(),
            task_name,
            result.message
        ),
    }
}
