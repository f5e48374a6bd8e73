use crate::config::ProviderConfig;
use crate::models::pokemon::{
    Identifier, NamedResource, Pokemon, PokemonAbility, PokemonSprites, PokemonStat,
    cache_timestamp,
};
use rand::Rng;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::{debug, warn};

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("Pokemon not found: {0}")]
    NotFound(String),

    #[error("PokeAPI returned {status} for {url}")]
    Status { url: String, status: u16 },

    #[error("Request to {url} failed: {message}")]
    Transport { url: String, message: String },

    #[error("Invalid response from {url}: {message}")]
    Decode { url: String, message: String },
}

impl ProviderError {
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

/// Source of truth for Pokémon data.
#[async_trait::async_trait]
pub trait PokemonProvider: Send + Sync {
    /// Fetches a single Pokémon by id or name.
    ///
    /// # Errors
    ///
    /// - Returns [`ProviderError::NotFound`] when the provider answers 404
    /// - Returns any other variant for non-success statuses or transport failures
    async fn fetch_one(&self, identifier: &Identifier) -> Result<Pokemon, ProviderError>;

    /// Best-effort search: exact id, then name/URL substring over the listing,
    /// then members of a type with the query's name. Deduplicated by id.
    async fn search(&self, query: &str) -> Result<Vec<Pokemon>, ProviderError>;

    /// Draws an id uniformly from the provider's valid range.
    fn random_identifier(&self) -> i32;
}

#[derive(Debug, Deserialize)]
struct ApiPokemon {
    id: i32,
    name: String,
    types: Vec<ApiPokemonType>,
    stats: Vec<PokemonStat>,
    abilities: Vec<PokemonAbility>,
    sprites: PokemonSprites,
    height: i32,
    weight: i32,
    base_experience: Option<i32>,
}

#[derive(Debug, Deserialize)]
struct ApiPokemonType {
    #[serde(rename = "type")]
    kind: NamedResource,
}

impl ApiPokemon {
    fn into_pokemon(self) -> Pokemon {
        Pokemon {
            id: self.id,
            name: self.name,
            types: self.types.into_iter().map(|t| t.kind).collect(),
            stats: self.stats,
            abilities: self.abilities,
            sprites: self.sprites,
            height: self.height,
            weight: self.weight,
            base_experience: self.base_experience,
            cached_at: cache_timestamp(),
            expires_at: None,
        }
    }
}

#[derive(Debug, Deserialize)]
struct ListResponse {
    results: Vec<NamedResource>,
}

#[derive(Debug, Deserialize)]
struct TypeResponse {
    pokemon: Vec<TypeMember>,
}

#[derive(Debug, Deserialize)]
struct TypeMember {
    pokemon: NamedResource,
}

struct CachedBody {
    fetched_at: Instant,
    body: String,
}

#[derive(Clone)]
pub struct PokeApiClient {
    client: Client,
    settings: ProviderConfig,
    responses: Arc<RwLock<HashMap<String, CachedBody>>>,
}

/// Build an HTTP client with the configured timeout and user agent.
pub fn build_http_client(settings: &ProviderConfig) -> anyhow::Result<Client> {
    Client::builder()
        .timeout(Duration::from_secs(settings.request_timeout_seconds.into()))
        .user_agent(settings.user_agent.as_str())
        .pool_max_idle_per_host(10)
        .build()
        .map_err(|e| anyhow::anyhow!("Failed to build HTTP client: {e}"))
}

impl PokeApiClient {
    pub fn new(settings: ProviderConfig) -> anyhow::Result<Self> {
        let client = build_http_client(&settings)?;
        Ok(Self::with_shared_client(client, settings))
    }

    #[must_use]
    pub fn with_shared_client(client: Client, settings: ProviderConfig) -> Self {
        Self {
            client,
            settings,
            responses: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    fn base_url(&self) -> &str {
        self.settings.base_url.trim_end_matches('/')
    }

    fn reuse_window(&self) -> Option<Duration> {
        (self.settings.response_cache_seconds > 0)
            .then(|| Duration::from_secs(self.settings.response_cache_seconds))
    }

    async fn cached_body(&self, url: &str) -> Option<String> {
        let window = self.reuse_window()?;
        let responses = self.responses.read().await;
        responses
            .get(url)
            .filter(|c| c.fetched_at.elapsed() < window)
            .map(|c| c.body.clone())
    }

    async fn remember_body(&self, url: &str, body: &str) {
        let Some(window) = self.reuse_window() else {
            return;
        };

        let mut responses = self.responses.write().await;
        responses.retain(|_, c| c.fetched_at.elapsed() < window);
        responses.insert(
            url.to_string(),
            CachedBody {
                fetched_at: Instant::now(),
                body: body.to_string(),
            },
        );
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        url: &str,
        not_found: &str,
    ) -> Result<T, ProviderError> {
        let body = if let Some(body) = self.cached_body(url).await {
            debug!(url, "Reusing cached provider response");
            body
        } else {
            metrics::counter!("provider_requests_total").increment(1);

            let response =
                self.client
                    .get(url)
                    .send()
                    .await
                    .map_err(|e| ProviderError::Transport {
                        url: url.to_string(),
                        message: e.to_string(),
                    })?;

            let status = response.status();
            if status == StatusCode::NOT_FOUND {
                return Err(ProviderError::NotFound(not_found.to_string()));
            }

            if !status.is_success() {
                return Err(ProviderError::Status {
                    url: url.to_string(),
                    status: status.as_u16(),
                });
            }

            let body = response
                .text()
                .await
                .map_err(|e| ProviderError::Transport {
                    url: url.to_string(),
                    message: e.to_string(),
                })?;

            self.remember_body(url, &body).await;
            body
        };

        serde_json::from_str(&body).map_err(|e| ProviderError::Decode {
            url: url.to_string(),
            message: e.to_string(),
        })
    }

    async fn fetch_resource(&self, resource: &NamedResource) -> Option<Pokemon> {
        let Some(identifier) = resource_identifier(&resource.url) else {
            warn!(url = %resource.url, "Listing entry has no trailing id");
            return None;
        };

        match self.fetch_one(&identifier).await {
            Ok(pokemon) => Some(pokemon),
            Err(e) => {
                warn!(pokemon = %resource.name, error = %e, "Error fetching Pokemon during search");
                None
            }
        }
    }

    async fn search_listing(
        &self,
        query: &str,
        results: &mut Vec<Pokemon>,
    ) -> Result<(), ProviderError> {
        let batch = self.settings.list_batch_size.max(1);

        for offset in (0..self.settings.list_limit).step_by(batch as usize) {
            let url = format!(
                "{}/pokemon?limit={}&offset={}",
                self.base_url(),
                batch,
                offset
            );

            let page: ListResponse = match self.get_json(&url, &url).await {
                Ok(page) => page,
                Err(e @ (ProviderError::NotFound(_) | ProviderError::Status { .. })) => {
                    warn!(offset, error = %e, "Stopping listing scan");
                    break;
                }
                Err(e) => return Err(e),
            };

            for entry in page.results.iter().filter(|e| listing_matches(e, query)) {
                if let Some(pokemon) = self.fetch_resource(entry).await {
                    results.push(pokemon);
                }
            }

            if !results.is_empty() && query.chars().count() > 3 {
                break;
            }
        }

        Ok(())
    }

    async fn search_type(&self, query: &str, results: &mut Vec<Pokemon>) {
        let url = format!("{}/type/{}", self.base_url(), urlencoding::encode(query));

        let listing: TypeResponse = match self.get_json(&url, query).await {
            Ok(listing) => listing,
            Err(e) => {
                debug!(query, error = %e, "Query is not a type name");
                return;
            }
        };

        for member in listing.pokemon.iter().take(self.settings.type_member_limit) {
            if let Some(pokemon) = self.fetch_resource(&member.pokemon).await
                && !results.iter().any(|p| p.id == pokemon.id)
            {
                results.push(pokemon);
            }
        }
    }
}

#[async_trait::async_trait]
impl PokemonProvider for PokeApiClient {
    async fn fetch_one(&self, identifier: &Identifier) -> Result<Pokemon, ProviderError> {
        let key = identifier.to_string();
        let url = format!(
            "{}/pokemon/{}",
            self.base_url(),
            urlencoding::encode(&key)
        );

        let data: ApiPokemon = self.get_json(&url, &key).await?;
        Ok(data.into_pokemon())
    }

    async fn search(&self, query: &str) -> Result<Vec<Pokemon>, ProviderError> {
        let query = query.trim().to_lowercase();

        if let Ok(id) = query.parse::<i32>() {
            match self.fetch_one(&Identifier::Id(id)).await {
                Ok(pokemon) => return Ok(vec![pokemon]),
                Err(e) => debug!(id, error = %e, "No exact id match, continuing search"),
            }
        }

        let mut results = Vec::new();
        self.search_listing(&query, &mut results).await?;
        self.search_type(&query, &mut results).await;

        Ok(results)
    }

    fn random_identifier(&self) -> i32 {
        rand::rng().random_range(1..=self.settings.max_pokemon_id.max(1))
    }
}

/// Whether a listing entry matches an already-lowercased query.
fn listing_matches(entry: &NamedResource, query: &str) -> bool {
    entry.name.contains(query) || entry.url.contains(&format!("/pokemon/{query}/"))
}

/// Extracts the trailing path segment of a resource URL as an identifier.
fn resource_identifier(url: &str) -> Option<Identifier> {
    url.split('/')
        .filter(|s| !s.is_empty())
        .next_back()
        .and_then(Identifier::parse)
}

#[cfg(test)]
mod tests {
    use super::*;

    const PIKACHU_JSON: &str = r#"{
        "id": 25,
        "name": "pikachu",
        "base_experience": 112,
        "height": 4,
        "weight": 60,
        "order": 35,
        "types": [
            {"slot": 1, "type": {"name": "electric", "url": "https://pokeapi.co/api/v2/type/13/"}}
        ],
        "stats": [
            {"base_stat": 35, "effort": 0, "stat": {"name": "hp", "url": "https://pokeapi.co/api/v2/stat/1/"}},
            {"base_stat": 90, "effort": 2, "stat": {"name": "speed", "url": "https://pokeapi.co/api/v2/stat/6/"}}
        ],
        "abilities": [
            {"ability": {"name": "static", "url": "https://pokeapi.co/api/v2/ability/9/"}, "is_hidden": false, "slot": 1},
            {"ability": {"name": "lightning-rod", "url": "https://pokeapi.co/api/v2/ability/31/"}, "is_hidden": true, "slot": 3}
        ],
        "sprites": {
            "front_default": "https://example.test/25.png",
            "front_shiny": null,
            "back_default": null,
            "back_shiny": null,
            "other": {
                "dream_world": {"front_default": null},
                "official-artwork": {"front_default": "https://example.test/art/25.png", "front_shiny": null}
            }
        }
    }"#;

    #[test]
    fn maps_provider_payload_into_record() {
        let data: ApiPokemon = serde_json::from_str(PIKACHU_JSON).unwrap();
        let pokemon = data.into_pokemon();

        assert_eq!(pokemon.id, 25);
        assert_eq!(pokemon.name, "pikachu");
        assert_eq!(pokemon.type_names().collect::<Vec<_>>(), vec!["electric"]);
        assert_eq!(pokemon.stats[1].stat.name, "speed");
        assert_eq!(pokemon.stats[1].effort, 2);
        assert!(pokemon.abilities[1].is_hidden);
        assert_eq!(pokemon.base_experience, Some(112));
        assert_eq!(pokemon.display_image(), "https://example.test/art/25.png");
        assert!(pokemon.expires_at.is_none());
    }

    #[test]
    fn missing_base_experience_is_accepted() {
        let json = PIKACHU_JSON.replace("\"base_experience\": 112", "\"base_experience\": null");
        let data: ApiPokemon = serde_json::from_str(&json).unwrap();
        assert_eq!(data.into_pokemon().base_experience, None);
    }

    #[test]
    fn resource_identifier_reads_trailing_segment() {
        assert_eq!(
            resource_identifier("https://pokeapi.co/api/v2/pokemon/25/"),
            Some(Identifier::Id(25))
        );
        assert_eq!(
            resource_identifier("https://pokeapi.co/api/v2/pokemon/10034"),
            Some(Identifier::Id(10034))
        );
        assert_eq!(resource_identifier(""), None);
    }

    #[test]
    fn listing_matches_name_or_exact_url_segment() {
        let entry = NamedResource {
            name: "charmander".to_string(),
            url: "https://pokeapi.co/api/v2/pokemon/4/".to_string(),
        };

        assert!(listing_matches(&entry, "char"));
        assert!(listing_matches(&entry, "4"));
        assert!(!listing_matches(&entry, "40"));
        assert!(!listing_matches(&entry, "squirt"));
    }

    #[test]
    fn random_identifier_stays_in_range() {
        let settings = ProviderConfig {
            max_pokemon_id: 3,
            ..ProviderConfig::default()
        };
        let client = PokeApiClient::new(settings).unwrap();

        for _ in 0..200 {
            let id = client.random_identifier();
            assert!((1..=3).contains(&id));
        }
    }

    #[test]
    fn not_found_is_distinguished() {
        assert!(ProviderError::NotFound("missingno".to_string()).is_not_found());
        assert!(
            !ProviderError::Status {
                url: "u".to_string(),
                status: 500
            }
            .is_not_found()
        );
    }

    mod http {
        use super::*;
        use axum::{
            Json, Router,
            extract::{Path, Query, State},
            response::{IntoResponse, Response},
            routing::get,
        };
        use serde_json::json;
        use std::sync::Mutex;
        use std::sync::atomic::{AtomicUsize, Ordering};

        #[derive(Default)]
        struct FakeApi {
            listing_calls: AtomicUsize,
            requested: Mutex<Vec<String>>,
        }

        impl FakeApi {
            fn requests_for(&self, key: &str) -> usize {
                self.requested
                    .lock()
                    .unwrap()
                    .iter()
                    .filter(|k| *k == key)
                    .count()
            }
        }

        fn entry(name: &str, id: i32) -> serde_json::Value {
            json!({"name": name, "url": format!("https://pokeapi.co/api/v2/pokemon/{id}/")})
        }

        fn pokemon_json(id: i32, name: &str, kind: &str) -> Response {
            Json(json!({
                "id": id,
                "name": name,
                "height": 6,
                "weight": 85,
                "base_experience": 62,
                "types": [{"slot": 1, "type": {"name": kind, "url": format!("https://pokeapi.co/api/v2/type/{kind}/")}}],
                "stats": [],
                "abilities": [],
                "sprites": {"front_default": null, "front_shiny": null, "back_default": null, "back_shiny": null}
            }))
            .into_response()
        }

        async fn fake_listing(
            State(api): State<Arc<FakeApi>>,
            Query(params): Query<HashMap<String, String>>,
        ) -> Response {
            api.listing_calls.fetch_add(1, Ordering::SeqCst);
            match params.get("offset").map(String::as_str) {
                Some("0") => Json(json!({
                    "results": [entry("charmander", 2), entry("charmeleon", 3)]
                }))
                .into_response(),
                Some("100") => Json(json!({"results": [entry("squirtle", 7)]})).into_response(),
                Some("200") => StatusCode::INTERNAL_SERVER_ERROR.into_response(),
                _ => Json(json!({"results": []})).into_response(),
            }
        }

        async fn fake_pokemon(State(api): State<Arc<FakeApi>>, Path(key): Path<String>) -> Response {
            api.requested.lock().unwrap().push(key.clone());
            match key.as_str() {
                "2" | "charmander" => pokemon_json(2, "charmander", "fire"),
                "3" => StatusCode::INTERNAL_SERVER_ERROR.into_response(),
                "4" => pokemon_json(4, "charizard", "fire"),
                "5" => pokemon_json(5, "vulpix", "fire"),
                "7" | "squirtle" => pokemon_json(7, "squirtle", "water"),
                _ => StatusCode::NOT_FOUND.into_response(),
            }
        }

        async fn fake_type(Path(name): Path<String>) -> Response {
            if name == "char" {
                Json(json!({
                    "pokemon": [
                        {"pokemon": entry("charmander", 2)},
                        {"pokemon": entry("charizard", 4)},
                        {"pokemon": entry("vulpix", 5)}
                    ]
                }))
                .into_response()
            } else {
                StatusCode::NOT_FOUND.into_response()
            }
        }

        async fn spawn_fake_api(response_cache_seconds: u64) -> (PokeApiClient, Arc<FakeApi>) {
            let api = Arc::new(FakeApi::default());
            let app = Router::new()
                .route("/pokemon", get(fake_listing))
                .route("/pokemon/{key}", get(fake_pokemon))
                .route("/type/{name}", get(fake_type))
                .with_state(Arc::clone(&api));

            let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
            let addr = listener.local_addr().unwrap();
            tokio::spawn(async move {
                axum::serve(listener, app).await.unwrap();
            });

            let settings = ProviderConfig {
                base_url: format!("http://{addr}"),
                list_limit: 400,
                list_batch_size: 100,
                type_member_limit: 2,
                response_cache_seconds,
                ..ProviderConfig::default()
            };
            (PokeApiClient::new(settings).unwrap(), api)
        }

        fn ids(results: &[Pokemon]) -> Vec<i32> {
            results.iter().map(|p| p.id).collect()
        }

        #[tokio::test]
        async fn fetch_one_maps_statuses() {
            let (client, _) = spawn_fake_api(0).await;

            let charmander = client.fetch_one(&Identifier::Id(2)).await.unwrap();
            assert_eq!(charmander.name, "charmander");
            assert_eq!(charmander.type_names().collect::<Vec<_>>(), vec!["fire"]);

            let missing = client
                .fetch_one(&Identifier::Name("missingno".to_string()))
                .await;
            assert!(matches!(missing, Err(ProviderError::NotFound(ref id)) if id == "missingno"));

            let broken = client.fetch_one(&Identifier::Id(3)).await;
            assert!(matches!(broken, Err(ProviderError::Status { status: 500, .. })));
        }

        #[tokio::test]
        async fn search_skips_failed_entries_and_stops_early_for_long_queries() {
            let (client, api) = spawn_fake_api(0).await;

            let results = client.search("char").await.unwrap();

            // charmeleon (3) fails and is dropped; charizard comes from the type
            // step, charmander is not repeated, vulpix is past the member limit.
            assert_eq!(ids(&results), vec![2, 4]);
            assert_eq!(api.listing_calls.load(Ordering::SeqCst), 1);
            assert_eq!(api.requests_for("5"), 0);
        }

        #[tokio::test]
        async fn short_queries_page_until_a_page_fails() {
            let (client, api) = spawn_fake_api(0).await;

            let results = client.search("cha").await.unwrap();

            assert_eq!(ids(&results), vec![2]);
            // offsets 0, 100 and the failing 200; 300 is never requested.
            assert_eq!(api.listing_calls.load(Ordering::SeqCst), 3);
        }

        #[tokio::test]
        async fn numeric_query_returns_the_exact_id() {
            let (client, api) = spawn_fake_api(0).await;

            let results = client.search(" 2 ").await.unwrap();

            assert_eq!(ids(&results), vec![2]);
            assert_eq!(api.listing_calls.load(Ordering::SeqCst), 0);
        }

        #[tokio::test]
        async fn responses_are_reused_within_the_window() {
            let (client, api) = spawn_fake_api(3600).await;
            client.fetch_one(&Identifier::Id(7)).await.unwrap();
            client.fetch_one(&Identifier::Id(7)).await.unwrap();
            assert_eq!(api.requests_for("7"), 1);

            let (client, api) = spawn_fake_api(0).await;
            client.fetch_one(&Identifier::Id(7)).await.unwrap();
            client.fetch_one(&Identifier::Id(7)).await.unwrap();
            assert_eq!(api.requests_for("7"), 2);
        }
    }
}
