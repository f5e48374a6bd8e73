use super::{open_provider, open_store};
use crate::config::Config;
use crate::services::{POPULAR_IDS, SeedService};
use std::time::Duration;

pub async fn cmd_seed(
    config: &Config,
    all: bool,
    batch_size: Option<usize>,
    delay_ms: Option<u64>,
) -> anyhow::Result<()> {
    let store = open_store(config).await?;
    let seeder = SeedService::new(store.clone(), open_provider(config)?);

    let batch_size = batch_size.unwrap_or(config.seed.batch_size);
    let delay = Duration::from_millis(delay_ms.unwrap_or(config.seed.delay_ms));

    let summary = if all {
        println!(
            "Seeding Pokemon #1 to #{}. This will take a while...",
            config.provider.max_pokemon_id
        );
        seeder
            .seed_all(config.provider.max_pokemon_id, batch_size, delay)
            .await
    } else {
        println!("Seeding {} popular Pokemon...", POPULAR_IDS.len());
        seeder.seed_popular(batch_size, delay).await
    };

    println!();
    println!("Seed Summary:");
    println!("  Seeded:  {}", summary.seeded);
    println!("  Skipped: {}", summary.skipped);
    println!("  Errors:  {}", summary.errors);
    println!("  Total:   {}", summary.total());
    println!("  Cached:  {}", store.pokemon_count().await?);

    store.close().await
}
