use crate::clients::{PokemonProvider, ProviderError};
use crate::db::Store;
use crate::models::pokemon::Identifier;
use futures::future::join_all;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info};

/// Starters, the rest of the first generation's favourites and a handful
/// from later generations.
pub const POPULAR_IDS: &[i32] = &[
    1, 4, 7, 25, 39, 52, 54, 56, 58, 60, 63, 66, 72, 74, 77, 79, 81, 84, 86, 88, 90, 92, 95, 96,
    98, 100, 102, 104, 108, 109, 111, 113, 114, 115, 116, 118, 120, 121, 122, 123, 124, 125, 126,
    127, 128, 129, 130, 131, 132, 133, 134, 135, 136, 137, 138, 139, 140, 141, 142, 143, 144, 145,
    146, 147, 148, 149, 150, 151, 152, 155, 158, 172, 173, 174, 175, 249, 250, 251, 387, 390,
    393, 494, 650, 656, 722, 725, 810, 813, 816,
];

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SeedSummary {
    pub seeded: usize,
    pub skipped: usize,
    pub errors: usize,
}

impl SeedSummary {
    #[must_use]
    pub const fn total(&self) -> usize {
        self.seeded + self.skipped + self.errors
    }
}

enum SeedOutcome {
    Seeded,
    Skipped,
    Failed,
}

pub struct SeedService {
    store: Store,
    provider: Arc<dyn PokemonProvider>,
}

impl SeedService {
    #[must_use]
    pub fn new(store: Store, provider: Arc<dyn PokemonProvider>) -> Self {
        Self { store, provider }
    }

    /// Stores every id that is not already cached. Each batch is fetched
    /// concurrently; `delay` is slept between batches, not after the last.
    pub async fn seed_ids(&self, ids: &[i32], batch_size: usize, delay: Duration) -> SeedSummary {
        let mut summary = SeedSummary::default();
        let batch_size = batch_size.max(1);
        let batches = ids.chunks(batch_size).count();

        for (index, batch) in ids.chunks(batch_size).enumerate() {
            if let (Some(first), Some(last)) = (batch.first(), batch.last()) {
                info!("Processing batch #{} to #{}", first, last);
            }

            let outcomes = join_all(batch.iter().map(|&id| self.seed_one(id))).await;
            for outcome in outcomes {
                match outcome {
                    SeedOutcome::Seeded => summary.seeded += 1,
                    SeedOutcome::Skipped => summary.skipped += 1,
                    SeedOutcome::Failed => summary.errors += 1,
                }
            }

            info!(
                seeded = summary.seeded,
                skipped = summary.skipped,
                errors = summary.errors,
                "Batch complete"
            );

            if index + 1 < batches && !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
        }

        summary
    }

    pub async fn seed_popular(&self, batch_size: usize, delay: Duration) -> SeedSummary {
        self.seed_ids(POPULAR_IDS, batch_size, delay).await
    }

    /// Seeds ids `1..=max_id`.
    pub async fn seed_all(&self, max_id: i32, batch_size: usize, delay: Duration) -> SeedSummary {
        let ids: Vec<i32> = (1..=max_id).collect();
        self.seed_ids(&ids, batch_size, delay).await
    }

    async fn seed_one(&self, id: i32) -> SeedOutcome {
        match self.store.get_pokemon(id).await {
            Ok(Some(_)) => {
                debug!(pokemon_id = id, "Already cached, skipping");
                return SeedOutcome::Skipped;
            }
            Ok(None) => {}
            Err(e) => {
                error!(pokemon_id = id, error = %e, "Error seeding Pokemon");
                return SeedOutcome::Failed;
            }
        }

        let pokemon = match self.provider.fetch_one(&Identifier::Id(id)).await {
            Ok(pokemon) => pokemon,
            Err(ProviderError::NotFound(_)) => return SeedOutcome::Skipped,
            Err(e) => {
                error!(pokemon_id = id, error = %e, "Error seeding Pokemon");
                return SeedOutcome::Failed;
            }
        };

        match self.store.insert_pokemon_if_absent(&pokemon).await {
            Ok(true) => {
                debug!(pokemon_id = id, name = %pokemon.name, "Seeded Pokemon");
                SeedOutcome::Seeded
            }
            Ok(false) => SeedOutcome::Skipped,
            Err(e) => {
                error!(pokemon_id = id, error = %e, "Error seeding Pokemon");
                SeedOutcome::Failed
            }
        }
    }
}
