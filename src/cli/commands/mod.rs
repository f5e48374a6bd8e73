mod lookup;
mod reap;
mod seed;

pub use lookup::{cmd_get_pokemon, cmd_random_pokemon, cmd_search_pokemon};
pub use reap::cmd_reap;
pub use seed::cmd_seed;

use crate::clients::{PokeApiClient, PokemonProvider};
use crate::config::Config;
use crate::db::Store;
use crate::models::pokemon::Pokemon;
use crate::services::SeaOrmPokemonService;
use std::sync::Arc;

async fn open_store(config: &Config) -> anyhow::Result<Store> {
    Store::with_pool_options(
        &config.general.database_path,
        config.general.max_db_connections,
        config.general.min_db_connections,
    )
    .await
}

fn open_provider(config: &Config) -> anyhow::Result<Arc<dyn PokemonProvider>> {
    Ok(Arc::new(PokeApiClient::new(config.provider.clone())?))
}

async fn open_service(config: &Config) -> anyhow::Result<(Store, SeaOrmPokemonService)> {
    let store = open_store(config).await?;
    let service =
        SeaOrmPokemonService::new(store.clone(), open_provider(config)?, config.cache.clone());
    Ok((store, service))
}

fn print_pokemon(pokemon: &Pokemon) {
    let types: Vec<&str> = pokemon.type_names().collect();

    println!("#{:04} {}", pokemon.id, pokemon.name);
    println!("  Types:  {}", types.join(", "));
    println!(
        "  Height: {:.1} m | Weight: {:.1} kg | Base XP: {}",
        f64::from(pokemon.height) / 10.0,
        f64::from(pokemon.weight) / 10.0,
        pokemon
            .base_experience
            .map_or_else(|| "-".to_string(), |xp| xp.to_string())
    );
    for stat in &pokemon.stats {
        println!("  {:<16} {:>3}", stat.stat.name, stat.base_stat);
    }
    println!("  Image:  {}", pokemon.display_image());
}
