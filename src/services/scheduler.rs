use anyhow::Result;
use chrono::Utc;
use std::sync::Arc;
use tokio::sync::RwLock;
use tokio::time::Duration;
use tokio_cron_scheduler::{Job, JobScheduler};
use tracing::{error, info};

use crate::config::CacheConfig;
use crate::db::{ReapSummary, Store};

pub struct Scheduler {
    store: Store,
    config: CacheConfig,
    running: Arc<RwLock<bool>>,
}

impl Scheduler {
    #[must_use]
    pub fn new(store: Store, config: CacheConfig) -> Self {
        Self {
            store,
            config,
            running: Arc::new(RwLock::new(false)),
        }
    }

    /// Runs the expiry reaper on its cron schedule until [`Scheduler::stop`] is called.
    pub async fn start(&self) -> Result<()> {
        if !self.config.reaper_enabled {
            info!("Expiry reaper is disabled in config");
            return Ok(());
        }

        *self.running.write().await = true;
        info!("Starting background scheduler");

        let mut sched = JobScheduler::new().await?;

        let store = self.store.clone();
        let running = Arc::clone(&self.running);
        let job = Job::new_async(self.config.reaper_cron.as_str(), move |_uuid, _lock| {
            let store = store.clone();
            let running = Arc::clone(&running);
            Box::pin(async move {
                if !*running.read().await {
                    return;
                }
                let start = std::time::Instant::now();
                info!(event = "job_started", job_name = "reap_expired", "Starting scheduled expiry sweep");

                match reap(&store).await {
                    Ok(summary) => info!(
                        event = "job_finished",
                        job_name = "reap_expired",
                        daily_picks = summary.daily_picks,
                        pokemon = summary.pokemon,
                        duration_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX),
                        "Scheduled expiry sweep finished"
                    ),
                    Err(e) => {
                        error!(event = "job_failed", job_name = "reap_expired", error = %e, "Scheduled expiry sweep failed");
                    }
                }
            })
        })?;

        sched.add(job).await?;
        sched.start().await?;

        info!("Scheduler running with cron: {}", self.config.reaper_cron);

        loop {
            if !*self.running.read().await {
                break;
            }
            tokio::time::sleep(Duration::from_secs(1)).await;
        }

        sched.shutdown().await?;
        Ok(())
    }

    pub async fn stop(&self) {
        info!("Stopping scheduler...");
        *self.running.write().await = false;
    }

    pub async fn is_running(&self) -> bool {
        *self.running.read().await
    }

    pub async fn run_once(&self) -> Result<ReapSummary> {
        info!("Running manual expiry sweep...");
        reap(&self.store).await
    }
}

async fn reap(store: &Store) -> Result<ReapSummary> {
    let summary = store.reap_expired(Utc::now()).await?;
    metrics::counter!("cache_reaped_total", "kind" => "daily_pick").increment(summary.daily_picks);
    metrics::counter!("cache_reaped_total", "kind" => "pokemon").increment(summary.pokemon);
    Ok(summary)
}
