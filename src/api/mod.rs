use axum::{Router, http::HeaderValue, middleware, routing::get};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::clients::{PokeApiClient, PokemonProvider};
use crate::config::Config;
use crate::db::Store;
use crate::services::{PokemonService, SeaOrmPokemonService};

mod error;
mod observability;
mod pokemon;
mod system;
mod types;
mod validation;

pub use error::ApiError;
pub use types::*;

use metrics_exporter_prometheus::PrometheusHandle;

#[derive(Clone)]
pub struct AppState {
    pub config: Config,

    pub store: Store,

    pub pokemon_service: Arc<dyn PokemonService>,

    pub start_time: std::time::Instant,

    pub prometheus_handle: Option<PrometheusHandle>,
}

/// Wires the store and the live provider client from `config`.
pub async fn create_app_state(
    config: Config,
    prometheus_handle: Option<PrometheusHandle>,
) -> anyhow::Result<Arc<AppState>> {
    let store = Store::with_pool_options(
        &config.general.database_path,
        config.general.max_db_connections,
        config.general.min_db_connections,
    )
    .await?;

    let provider: Arc<dyn PokemonProvider> = Arc::new(PokeApiClient::new(config.provider.clone())?);

    Ok(create_app_state_with_provider(
        config,
        store,
        provider,
        prometheus_handle,
    ))
}

#[must_use]
pub fn create_app_state_with_provider(
    config: Config,
    store: Store,
    provider: Arc<dyn PokemonProvider>,
    prometheus_handle: Option<PrometheusHandle>,
) -> Arc<AppState> {
    let pokemon_service: Arc<dyn PokemonService> = Arc::new(SeaOrmPokemonService::new(
        store.clone(),
        provider,
        config.cache.clone(),
    ));

    Arc::new(AppState {
        config,
        store,
        pokemon_service,
        start_time: std::time::Instant::now(),
        prometheus_handle,
    })
}

pub fn router(state: Arc<AppState>) -> Router {
    let cors_origins = &state.config.server.cors_allowed_origins;

    let api_router = Router::new()
        .route("/pokemon/random", get(pokemon::get_random_pokemon))
        .route("/pokemon/search", get(pokemon::search_pokemon))
        .route("/pokemon/{identifier}", get(pokemon::get_pokemon))
        .route("/health", get(system::get_health))
        .with_state(state.clone());

    let cors_layer = if cors_origins.iter().any(|o| o == "*") {
        CorsLayer::new().allow_origin(Any)
    } else {
        let origins: Vec<HeaderValue> =
            cors_origins.iter().filter_map(|s| s.parse().ok()).collect();
        CorsLayer::new().allow_origin(origins)
    };

    Router::new()
        .nest("/api", api_router)
        .route("/metrics", get(observability::get_metrics))
        .with_state(state)
        .layer(cors_layer.allow_methods(Any).allow_headers(Any))
        .layer(TraceLayer::new_for_http())
        .layer(middleware::from_fn(observability::logging_middleware))
}
