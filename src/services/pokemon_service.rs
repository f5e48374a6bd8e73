//! Domain service for Pokémon lookups.
//!
//! Every operation reads the local store first and falls back to the
//! provider on a miss, writing what it fetched back into the store.

use crate::clients::ProviderError;
use crate::models::pokemon::Pokemon;
use thiserror::Error;

/// Domain errors for Pokémon operations.
#[derive(Debug, Error)]
pub enum PokemonError {
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Pokemon not found: {0}")]
    NotFound(String),

    #[error("Provider error: {0}")]
    Fetch(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<ProviderError> for PokemonError {
    fn from(err: ProviderError) -> Self {
        match err {
            ProviderError::NotFound(identifier) => Self::NotFound(identifier),
            other => Self::Fetch(other.to_string()),
        }
    }
}

impl From<anyhow::Error> for PokemonError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(err.to_string())
    }
}

impl From<sea_orm::DbErr> for PokemonError {
    fn from(err: sea_orm::DbErr) -> Self {
        Self::Internal(err.to_string())
    }
}

/// Cache-aside read operations.
///
/// # Examples
///
/// ```rust,ignore
/// use pokedex::services::{PokemonError, PokemonService};
/// use std::sync::Arc;
///
/// async fn example(service: Arc<dyn PokemonService>) -> Result<(), PokemonError> {
///     let pikachu = service.get_pokemon("25").await?;
///     assert_eq!(pikachu.name, "pikachu");
///     Ok(())
/// }
/// ```
#[async_trait::async_trait]
pub trait PokemonService: Send + Sync {
    /// Looks a Pokémon up by numeric id or name.
    ///
    /// # Errors
    ///
    /// - Returns [`PokemonError::BadRequest`] if the identifier is blank
    /// - Returns [`PokemonError::NotFound`] if neither the store nor the provider knows it
    /// - Returns [`PokemonError::Fetch`] if the provider fails
    async fn get_pokemon(&self, identifier: &str) -> Result<Pokemon, PokemonError>;

    /// Returns the Pokémon of the current UTC day, drawing a new one when
    /// today has no pointer or the pointer no longer resolves.
    ///
    /// # Errors
    ///
    /// Returns [`PokemonError::Fetch`] or [`PokemonError::Internal`] on failure.
    async fn get_daily_pokemon(&self) -> Result<Pokemon, PokemonError>;

    /// Searches stored records by name, id and type; asks the provider only
    /// when the store has no match at all.
    ///
    /// # Errors
    ///
    /// - Returns [`PokemonError::BadRequest`] if the query is blank
    /// - Returns [`PokemonError::Fetch`] if the provider search fails
    async fn search_pokemon(&self, query: &str) -> Result<Vec<Pokemon>, PokemonError>;
}

/// Appends `incoming` to `merged`, skipping ids already present.
pub fn merge_unique(merged: &mut Vec<Pokemon>, incoming: impl IntoIterator<Item = Pokemon>) {
    for pokemon in incoming {
        if !merged.iter().any(|p| p.id == pokemon.id) {
            merged.push(pokemon);
        }
    }
}
