use super::{open_service, print_pokemon};
use crate::config::Config;
use crate::services::{PokemonError, PokemonService};

pub async fn cmd_get_pokemon(config: &Config, identifier: &str) -> anyhow::Result<()> {
    let (store, service) = open_service(config).await?;

    match service.get_pokemon(identifier).await {
        Ok(pokemon) => print_pokemon(&pokemon),
        Err(PokemonError::NotFound(id)) => println!("No Pokemon found for '{id}'"),
        Err(e) => {
            store.close().await?;
            return Err(e.into());
        }
    }

    store.close().await
}

pub async fn cmd_random_pokemon(config: &Config) -> anyhow::Result<()> {
    let (store, service) = open_service(config).await?;

    let pokemon = service.get_daily_pokemon().await?;
    println!("Pokemon of the day:");
    print_pokemon(&pokemon);

    store.close().await
}

pub async fn cmd_search_pokemon(config: &Config, query: &str) -> anyhow::Result<()> {
    println!("Searching for: {query}");

    let (store, service) = open_service(config).await?;
    let results = service.search_pokemon(query).await?;

    if results.is_empty() {
        println!("No Pokemon found matching '{query}'");
        return store.close().await;
    }

    println!();
    println!("Search Results:");
    println!("{:-<60}", "");

    for pokemon in &results {
        let types: Vec<&str> = pokemon.type_names().collect();
        println!("• #{:04} {} ({})", pokemon.id, pokemon.name, types.join("/"));
    }

    println!();
    println!("For details: pokedex get <id or name>");

    store.close().await
}
