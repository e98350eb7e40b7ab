//! Periodic tick driver built on tokio-cron-scheduler.

use std::sync::Arc;
use tokio::sync::Mutex;
use tokio_cron_scheduler::{Job, JobScheduler};
use tracing::{info, warn};

use crate::error::SchedulerError;
use crate::services::router::SignalRouter;

/// Runs `router.tick()` on a cron schedule.
///
/// Ticks that fire while the previous one is still running are skipped by
/// the router itself.
pub struct TickScheduler {
    router: Arc<SignalRouter>,
    cron: String,
    running: Mutex<Option<JobScheduler>>,
}

impl TickScheduler {
    /// * `cron` - six-field cron expression, e.g. `"0 * * * * *"` for every minute
    pub fn new(router: Arc<SignalRouter>, cron: impl Into<String>) -> Self {
        Self {
            router,
            cron: cron.into(),
            running: Mutex::new(None),
        }
    }

    pub fn cron(&self) -> &str {
        &self.cron
    }

    pub async fn is_running(&self) -> bool {
        self.running.lock().await.is_some()
    }

    pub async fn start(&self) -> Result<(), SchedulerError> {
        let mut running = self.running.lock().await;
        if running.is_some() {
            return Err(SchedulerError::AlreadyRunning);
        }

        let scheduler = JobScheduler::new().await?;
        let router = self.router.clone();
        let job = Job::new_async(self.cron.as_str(), move |_uuid, _l| {
            let router = router.clone();
            Box::pin(async move {
                if router.tick().await.is_none() {
                    warn!("⚠️ [SCHEDULER] Tick produced no decision");
                }
            })
        })?;

        scheduler.add(job).await?;
        scheduler.start().await?;
        *running = Some(scheduler);

        info!("🔔 [SCHEDULER] Tick job started with schedule: {}", self.cron);
        Ok(())
    }

    pub async fn stop(&self) -> Result<(), SchedulerError> {
        let mut running = self.running.lock().await;
        let mut scheduler = running.take().ok_or(SchedulerError::NotRunning)?;
        scheduler.shutdown().await?;
        info!("🔕 [SCHEDULER] Tick job stopped");
        Ok(())
    }
}
