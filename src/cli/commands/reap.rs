use super::open_store;
use crate::config::Config;
use crate::services::Scheduler;

pub async fn cmd_reap(config: &Config) -> anyhow::Result<()> {
    let store = open_store(config).await?;

    let summary = Scheduler::new(store.clone(), config.cache.clone())
        .run_once()
        .await?;

    println!(
        "Removed {} expired daily pick(s) and {} expired Pokemon",
        summary.daily_picks, summary.pokemon
    );

    store.close().await
}
