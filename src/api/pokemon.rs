use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::Deserialize;
use std::sync::Arc;

use super::{ApiError, AppState};
use crate::api::validation::{validate_identifier, validate_search_query};
use crate::models::pokemon::Pokemon;

#[derive(Deserialize)]
pub struct SearchQuery {
    pub q: Option<String>,
}

/// # Endpoint
/// `GET /api/pokemon/{identifier}`
pub async fn get_pokemon(
    State(state): State<Arc<AppState>>,
    Path(identifier): Path<String>,
) -> Result<Json<Pokemon>, ApiError> {
    let identifier = validate_identifier(&identifier)?;

    let pokemon = state
        .pokemon_service
        .get_pokemon(identifier)
        .await
        .map_err(|e| ApiError::from_pokemon(e, "Failed to fetch Pokemon details"))?;

    Ok(Json(pokemon))
}

/// Pokémon of the day, stable for the current UTC date.
///
/// # Endpoint
/// `GET /api/pokemon/random`
pub async fn get_random_pokemon(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Pokemon>, ApiError> {
    let pokemon = state
        .pokemon_service
        .get_daily_pokemon()
        .await
        .map_err(|e| ApiError::from_pokemon(e, "Failed to fetch daily random Pokemon"))?;

    Ok(Json(pokemon))
}

/// # Endpoint
/// `GET /api/pokemon/search?q=`
pub async fn search_pokemon(
    State(state): State<Arc<AppState>>,
    Query(params): Query<SearchQuery>,
) -> Result<Json<Vec<Pokemon>>, ApiError> {
    let query = validate_search_query(params.q.as_deref())?;

    let results = state
        .pokemon_service
        .search_pokemon(query)
        .await
        .map_err(|e| ApiError::from_pokemon(e, "Failed to search Pokemon"))?;

    Ok(Json(results))
}
