// src/pipeline/scheduler.rs

//! Periodic sync runner.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::error::AppError;
use crate::pipeline::sync::SyncJob;

/// Handle to a running scheduler task.
pub struct Scheduler {
    shutdown: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl Scheduler {
    /// Spawn a task that runs `job` every `period`.
    ///
    /// The first tick fires immediately when `run_on_startup` is set,
    /// otherwise one period after spawning. Ticks missed while a run is in
    /// flight are skipped.
    pub fn spawn(job: Arc<SyncJob>, period: Duration, run_on_startup: bool) -> Self {
        let (shutdown, mut signal) = watch::channel(false);

        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            if !run_on_startup {
                ticker.tick().await;
            }

            log::info!("Sync scheduler started (every {:?})", period);
            loop {
                tokio::select! {
                    biased;
                    changed = signal.changed() => {
                        if changed.is_err() || *signal.borrow() {
                            break;
                        }
                    }
                    _ = ticker.tick() => run_scheduled(&job).await,
                }
            }
            log::info!("Sync scheduler stopped");
        });

        Self { shutdown, task }
    }

    /// Stop scheduling and wait for an in-flight run to finish.
    pub async fn shutdown(self) {
        let _ = self.shutdown.send(true);
        if let Err(e) = self.task.await {
            log::error!("Sync scheduler task failed: {}", e);
        }
    }
}

async fn run_scheduled(job: &SyncJob) {
    match job.run().await {
        Ok(report) => log::debug!(
            "Scheduled sync: {:?} ({} records)",
            report.outcome,
            report.record_count
        ),
        Err(AppError::SyncInProgress) => {
            log::info!("Scheduled sync skipped: a run is already in progress")
        }
        Err(e) => log::error!("Scheduled sync failed, keeping current data: {}", e),
    }
}
