pub mod prelude;

pub mod daily_random_cache;
pub mod pokemon;
