//! Triggering trust store updates: on demand, on start-up and on a cron schedule.

use std::sync::Arc;

use tokio::sync::Semaphore;
use tokio_cron_scheduler::{Job, JobScheduler, JobSchedulerError};
use tracing::{error, info, warn};

use crate::ingest::DataUpdater;

/// Starts update runs in the background, at most one at a time.
#[derive(Clone)]
pub struct UpdateTrigger {
    updater: Arc<DataUpdater>,
    gate: Arc<Semaphore>,
}

impl UpdateTrigger {
    pub fn new(updater: Arc<DataUpdater>) -> Self {
        Self {
            updater,
            gate: Arc::new(Semaphore::new(1)),
        }
    }

    /// Spawns a run unless one is already in flight. Returns whether a run
    /// was started.
    pub fn trigger(&self) -> bool {
        let Ok(permit) = self.gate.clone().try_acquire_owned() else {
            warn!("Update already running, trigger ignored");
            return false;
        };

        let updater = self.updater.clone();
        tokio::spawn(async move {
            let _permit = permit;
            match updater.run().await {
                Ok(report) => info!(?report, "Update run completed"),
                Err(e) => error!(error = %e, "Update run failed"),
            }
        });
        true
    }

    /// Whether a run currently holds the gate.
    pub fn is_running(&self) -> bool {
        self.gate.available_permits() == 0
    }
}

/// Cron-driven update trigger.
pub struct UpdateScheduler {
    scheduler: JobScheduler,
}

impl UpdateScheduler {
    /// Registers `trigger` under the six-field cron expression `schedule`
    /// (seconds first, UTC) and starts ticking.
    pub async fn start(schedule: &str, trigger: UpdateTrigger) -> Result<Self, JobSchedulerError> {
        let scheduler = JobScheduler::new().await?;
        let job = Job::new_async(schedule, move |_id, _scheduler| {
            let trigger = trigger.clone();
            Box::pin(async move {
                info!("Scheduled update fired");
                trigger.trigger();
            })
        })?;
        scheduler.add(job).await?;
        scheduler.start().await?;
        info!(schedule, "Update scheduler started");
        Ok(Self { scheduler })
    }

    pub async fn shutdown(mut self) -> Result<(), JobSchedulerError> {
        self.scheduler.shutdown().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingest::{CertificateUpdater, CrlUpdater, CrlUrlUpdater, HttpFetcher};
    use crate::store::{MemoryCertificateStore, MemoryCrlStore, MemoryCrlUrlStore};
    use std::time::Duration;

    fn trigger() -> UpdateTrigger {
        let certificates = Arc::new(MemoryCertificateStore::new());
        let crls = Arc::new(MemoryCrlStore::new());
        let crl_urls = Arc::new(MemoryCrlUrlStore::new());
        let fetcher = HttpFetcher::new(Duration::from_secs(1)).unwrap();
        let updater = DataUpdater::new(
            CertificateUpdater::new(certificates, crl_urls.clone()),
            CrlUrlUpdater::new(crl_urls.clone()),
            CrlUpdater::new(fetcher, crls, crl_urls, 1),
        );
        UpdateTrigger::new(Arc::new(updater))
    }

    #[tokio::test]
    async fn test_second_trigger_is_rejected_while_running() {
        let trigger = trigger();
        let held = trigger.gate.clone().try_acquire_owned().unwrap();

        assert!(trigger.is_running());
        assert!(!trigger.trigger());

        drop(held);
        assert!(!trigger.is_running());
        assert!(trigger.trigger());
    }

    #[tokio::test]
    async fn test_gate_is_released_after_run() {
        let trigger = trigger();
        assert!(trigger.trigger());

        for _ in 0..50 {
            if !trigger.is_running() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        assert!(!trigger.is_running());
    }

    #[tokio::test]
    async fn test_invalid_schedule_is_rejected() {
        assert!(UpdateScheduler::start("not a cron", trigger()).await.is_err());
    }
}
