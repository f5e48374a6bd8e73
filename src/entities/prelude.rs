pub use super::daily_random_cache::Entity as DailyRandomCache;
pub use super::pokemon::Entity as Pokemon;
