use axum::{Json, extract::State};
use std::sync::Arc;

use super::{ApiError, AppState, HealthStatus};

/// Liveness plus a store round trip.
///
/// # Endpoint
/// `GET /api/health`
pub async fn get_health(
    State(state): State<Arc<AppState>>,
) -> Result<Json<HealthStatus>, ApiError> {
    state
        .store
        .ping()
        .await
        .map_err(|e| ApiError::internal("Database unavailable", e))?;

    let cached_pokemon = state.store.pokemon_count().await?;

    Ok(Json(HealthStatus {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        uptime_seconds: state.start_time.elapsed().as_secs(),
        cached_pokemon,
    }))
}
