//! `SeaORM`-backed implementation of [`PokemonService`].

use crate::clients::PokemonProvider;
use crate::config::CacheConfig;
use crate::db::Store;
use crate::models::pokemon::{Identifier, Pokemon, date_key};
use crate::services::pokemon_service::{PokemonError, PokemonService, merge_unique};
use chrono::{Duration, Utc};
use std::sync::Arc;
use tracing::{debug, info, warn};

pub struct SeaOrmPokemonService {
    store: Store,
    provider: Arc<dyn PokemonProvider>,
    settings: CacheConfig,
}

impl SeaOrmPokemonService {
    #[must_use]
    pub fn new(store: Store, provider: Arc<dyn PokemonProvider>, settings: CacheConfig) -> Self {
        Self {
            store,
            provider,
            settings,
        }
    }

    async fn find_stored(&self, identifier: &Identifier) -> Result<Option<Pokemon>, PokemonError> {
        if let Some(id) = identifier.as_id()
            && let Some(pokemon) = self.store.get_pokemon(id).await?
        {
            return Ok(Some(pokemon));
        }

        Ok(self
            .store
            .get_pokemon_by_name(&identifier.to_string())
            .await?)
    }

    /// Write-back after a provider fetch. Failures are logged; the caller
    /// still gets the fetched record.
    async fn cache_quietly(&self, pokemon: &Pokemon) {
        match self.store.insert_pokemon_if_absent(pokemon).await {
            Ok(true) => debug!(pokemon_id = pokemon.id, name = %pokemon.name, "Cached Pokemon"),
            Ok(false) => {}
            Err(e) => warn!(pokemon_id = pokemon.id, error = %e, "Error caching Pokemon"),
        }
    }

    async fn resolve_by_id(&self, id: i32) -> Result<Pokemon, PokemonError> {
        if let Some(pokemon) = self.store.get_pokemon(id).await? {
            return Ok(pokemon);
        }

        let fetched = self.provider.fetch_one(&Identifier::Id(id)).await?;
        self.store.insert_pokemon_if_absent(&fetched).await?;

        Ok(self.store.get_pokemon(id).await?.unwrap_or(fetched))
    }
}

#[async_trait::async_trait]
impl PokemonService for SeaOrmPokemonService {
    async fn get_pokemon(&self, identifier: &str) -> Result<Pokemon, PokemonError> {
        let identifier = Identifier::parse(identifier)
            .ok_or_else(|| PokemonError::BadRequest("Pokemon ID or name is required".into()))?;

        if let Some(pokemon) = self.find_stored(&identifier).await? {
            metrics::counter!("pokemon_cache_hits_total", "operation" => "get").increment(1);
            return Ok(pokemon);
        }

        metrics::counter!("pokemon_cache_misses_total", "operation" => "get").increment(1);
        debug!(%identifier, "Pokemon not cached, asking provider");

        let pokemon = self.provider.fetch_one(&identifier).await?;
        self.cache_quietly(&pokemon).await;

        Ok(pokemon)
    }

    async fn get_daily_pokemon(&self) -> Result<Pokemon, PokemonError> {
        let now = Utc::now();
        let today = date_key(now);

        if let Some(pick) = self.store.get_daily_pick(&today).await? {
            if let Some(pokemon) = self.store.get_pokemon(pick.pokemon_id).await? {
                metrics::counter!("pokemon_cache_hits_total", "operation" => "daily").increment(1);
                return Ok(pokemon);
            }
            debug!(date = %today, pokemon_id = pick.pokemon_id, "Daily pick no longer resolves");
        }

        metrics::counter!("pokemon_cache_misses_total", "operation" => "daily").increment(1);

        let random_id = self.provider.random_identifier();
        let pokemon = self.resolve_by_id(random_id).await?;

        let expires_at = now + Duration::hours(self.settings.daily_ttl_hours);
        let pokemon_ref = self
            .store
            .get_pokemon(pokemon.id)
            .await?
            .map(|stored| stored.id);

        self.store
            .upsert_daily_pick(&today, pokemon.id, pokemon_ref, expires_at)
            .await?;

        info!(date = %today, pokemon_id = pokemon.id, name = %pokemon.name, "Picked Pokemon of the day");

        Ok(pokemon)
    }

    async fn search_pokemon(&self, query: &str) -> Result<Vec<Pokemon>, PokemonError> {
        let query = query.trim().to_lowercase();
        if query.is_empty() {
            return Err(PokemonError::BadRequest("Search query is required".into()));
        }

        let limit = self.settings.search_result_limit;

        let mut results = self.store.search_pokemon_by_name(&query, limit).await?;

        if let Ok(id) = query.parse::<i32>()
            && let Some(pokemon) = self.store.get_pokemon(id).await?
        {
            merge_unique(&mut results, [pokemon]);
        }

        let by_type = self.store.search_pokemon_by_type(&query, limit).await?;
        merge_unique(&mut results, by_type);

        if !results.is_empty() {
            metrics::counter!("pokemon_cache_hits_total", "operation" => "search").increment(1);
            return Ok(results);
        }

        metrics::counter!("pokemon_cache_misses_total", "operation" => "search").increment(1);
        debug!(%query, "No stored matches, searching provider");

        let found = self.provider.search(&query).await?;
        for pokemon in &found {
            self.cache_quietly(pokemon).await;
        }

        Ok(found)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clients::ProviderError;
    use crate::models::pokemon::fixtures;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct FakeProvider {
        known: Vec<Pokemon>,
        draws: Mutex<Vec<i32>>,
        fetches: AtomicUsize,
        searches: AtomicUsize,
    }

    impl FakeProvider {
        fn with(known: Vec<Pokemon>) -> Self {
            Self {
                known,
                ..Self::default()
            }
        }

        fn drawing(self, ids: &[i32]) -> Self {
            *self.draws.lock().unwrap() = ids.iter().rev().copied().collect();
            self
        }

        fn calls(&self) -> usize {
            self.fetches.load(Ordering::SeqCst) + self.searches.load(Ordering::SeqCst)
        }
    }

    #[async_trait::async_trait]
    impl PokemonProvider for FakeProvider {
        async fn fetch_one(&self, identifier: &Identifier) -> Result<Pokemon, ProviderError> {
            self.fetches.fetch_add(1, Ordering::SeqCst);
            self.known
                .iter()
                .find(|p| match identifier {
                    Identifier::Id(id) => p.id == *id,
                    Identifier::Name(name) => &p.name == name,
                })
                .cloned()
                .ok_or_else(|| ProviderError::NotFound(identifier.to_string()))
        }

        async fn search(&self, query: &str) -> Result<Vec<Pokemon>, ProviderError> {
            self.searches.fetch_add(1, Ordering::SeqCst);
            Ok(self
                .known
                .iter()
                .filter(|p| p.name.contains(query) || p.has_type_matching(query))
                .cloned()
                .collect())
        }

        fn random_identifier(&self) -> i32 {
            self.draws.lock().unwrap().pop().unwrap_or(1)
        }
    }

    async fn service(provider: Arc<FakeProvider>) -> (SeaOrmPokemonService, Store) {
        let store = Store::in_memory().await.unwrap();
        let service = SeaOrmPokemonService::new(store.clone(), provider, CacheConfig::default());
        (service, store)
    }

    #[tokio::test]
    async fn get_pokemon_reads_through_then_serves_from_store() {
        let provider = Arc::new(FakeProvider::with(vec![fixtures::pokemon(
            25,
            "pikachu",
            &["electric"],
        )]));
        let (service, store) = service(provider.clone()).await;

        let fetched = service.get_pokemon("25").await.unwrap();
        assert_eq!(fetched.name, "pikachu");
        assert_eq!(provider.calls(), 1);
        assert!(store.get_pokemon(25).await.unwrap().is_some());

        let by_name = service.get_pokemon(" Pikachu ").await.unwrap();
        assert_eq!(by_name.id, 25);
        assert_eq!(by_name, fetched);
        assert_eq!(provider.calls(), 1);
    }

    #[tokio::test]
    async fn get_pokemon_rejects_blank_and_reports_missing() {
        let provider = Arc::new(FakeProvider::default());
        let (service, _) = service(provider.clone()).await;

        assert!(matches!(
            service.get_pokemon("   ").await,
            Err(PokemonError::BadRequest(_))
        ));
        assert_eq!(provider.calls(), 0);

        assert!(matches!(
            service.get_pokemon("nonexistent-xyz").await,
            Err(PokemonError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn daily_pokemon_is_stable_within_the_day() {
        let provider = Arc::new(
            FakeProvider::with(vec![
                fixtures::pokemon(1, "bulbasaur", &["grass"]),
                fixtures::pokemon(7, "squirtle", &["water"]),
            ])
            .drawing(&[7, 1]),
        );
        let (service, store) = service(provider.clone()).await;

        let first = service.get_daily_pokemon().await.unwrap();
        let second = service.get_daily_pokemon().await.unwrap();
        assert_eq!(first.id, 7);
        assert_eq!(second.id, 7);
        assert_eq!(provider.fetches.load(Ordering::SeqCst), 1);

        let pick = store
            .get_daily_pick(&date_key(Utc::now()))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(pick.pokemon_id, 7);
        assert_eq!(pick.pokemon_ref, Some(7));
        assert!(pick.expires_at > Utc::now() + Duration::hours(23));
    }

    #[tokio::test]
    async fn daily_pokemon_redraws_after_pointer_is_reaped() {
        let provider = Arc::new(
            FakeProvider::with(vec![
                fixtures::pokemon(1, "bulbasaur", &["grass"]),
                fixtures::pokemon(7, "squirtle", &["water"]),
            ])
            .drawing(&[7, 1]),
        );
        let (service, store) = service(provider).await;

        assert_eq!(service.get_daily_pokemon().await.unwrap().id, 7);

        let summary = store
            .reap_expired(Utc::now() + Duration::hours(25))
            .await
            .unwrap();
        assert_eq!(summary.daily_picks, 1);

        assert_eq!(service.get_daily_pokemon().await.unwrap().id, 1);
    }

    #[tokio::test]
    async fn daily_pokemon_repoints_a_dangling_pointer_in_place() {
        let provider = Arc::new(
            FakeProvider::with(vec![fixtures::pokemon(1, "bulbasaur", &["grass"])])
                .drawing(&[1]),
        );
        let (service, store) = service(provider).await;
        let today = date_key(Utc::now());

        store
            .upsert_daily_pick(&today, 999, None, Utc::now() + Duration::hours(1))
            .await
            .unwrap();

        assert_eq!(service.get_daily_pokemon().await.unwrap().id, 1);

        let pick = store.get_daily_pick(&today).await.unwrap().unwrap();
        assert_eq!(pick.pokemon_id, 1);
        assert!(pick.expires_at > Utc::now() + Duration::hours(23));
    }

    #[tokio::test]
    async fn search_prefers_store_and_deduplicates() {
        let provider = Arc::new(FakeProvider::default());
        let (service, store) = service(provider.clone()).await;

        for pokemon in [
            fixtures::pokemon(4, "charmander", &["fire"]),
            fixtures::pokemon(6, "charizard", &["fire", "flying"]),
            fixtures::pokemon(12, "firefly", &["fire", "bug"]),
            fixtures::pokemon(7, "squirtle", &["water"]),
        ] {
            store.insert_pokemon_if_absent(&pokemon).await.unwrap();
        }

        let results = service.search_pokemon("CHAR").await.unwrap();
        assert_eq!(results.iter().map(|p| p.id).collect::<Vec<_>>(), vec![4, 6]);

        // firefly matches by name and by type but is listed once, name match first.
        let results = service.search_pokemon("fire").await.unwrap();
        assert_eq!(
            results.iter().map(|p| p.id).collect::<Vec<_>>(),
            vec![12, 4, 6]
        );

        let results = service.search_pokemon("7").await.unwrap();
        assert_eq!(results.iter().map(|p| p.id).collect::<Vec<_>>(), vec![7]);

        assert_eq!(provider.calls(), 0);
    }

    #[tokio::test]
    async fn search_falls_back_to_provider_and_caches_results() {
        let provider = Arc::new(FakeProvider::with(vec![
            fixtures::pokemon(25, "pikachu", &["electric"]),
            fixtures::pokemon(26, "raichu", &["electric"]),
        ]));
        let (service, store) = service(provider.clone()).await;

        assert!(matches!(
            service.search_pokemon("  ").await,
            Err(PokemonError::BadRequest(_))
        ));

        let results = service.search_pokemon("electric").await.unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(provider.searches.load(Ordering::SeqCst), 1);
        assert_eq!(store.pokemon_count().await.unwrap(), 2);

        let again = service.search_pokemon("electric").await.unwrap();
        assert_eq!(again.len(), 2);
        assert_eq!(provider.searches.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn failed_cache_writes_only_fail_the_daily_pick() {
        use sea_orm::ConnectionTrait;

        let provider = Arc::new(
            FakeProvider::with(vec![
                fixtures::pokemon(25, "pikachu", &["electric"]),
                fixtures::pokemon(26, "raichu", &["electric"]),
            ])
            .drawing(&[26]),
        );
        let (service, store) = service(provider.clone()).await;

        store
            .conn
            .execute_unprepared(
                "CREATE TRIGGER reject_pokemon BEFORE INSERT ON pokemon \
                 BEGIN SELECT RAISE(ABORT, 'disk full'); END;",
            )
            .await
            .unwrap();

        let fetched = service.get_pokemon("25").await.unwrap();
        assert_eq!(fetched.id, 25);

        let found = service.search_pokemon("electric").await.unwrap();
        assert_eq!(found.iter().map(|p| p.id).collect::<Vec<_>>(), vec![25, 26]);
        assert_eq!(store.pokemon_count().await.unwrap(), 0);

        let daily = service.get_daily_pokemon().await;
        assert!(matches!(daily, Err(PokemonError::Internal(ref cause)) if cause.contains("disk full")));
        assert!(
            store
                .get_daily_pick(&date_key(Utc::now()))
                .await
                .unwrap()
                .is_none()
        );
    }
}
