pub mod pokemon_service;
pub use pokemon_service::{PokemonError, PokemonService, merge_unique};

pub mod pokemon_service_impl;
pub use pokemon_service_impl::SeaOrmPokemonService;

pub mod seed;
pub use seed::{POPULAR_IDS, SeedService, SeedSummary};

pub mod scheduler;
pub use scheduler::Scheduler;
