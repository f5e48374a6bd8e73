use crate::models::pokemon::{DailyPick, Pokemon};
use anyhow::{Context, Result};
use chrono::{DateTime, SecondsFormat, Utc};
use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection, Statement};
use std::path::Path;
use std::time::Duration;
use tracing::info;

pub mod migrator;
pub mod repositories;

/// Fixed-width RFC 3339 so stored timestamps compare correctly as text.
#[must_use]
pub fn format_timestamp(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>> {
    Ok(DateTime::parse_from_rfc3339(raw)
        .with_context(|| format!("Invalid stored timestamp: {raw}"))?
        .with_timezone(&Utc))
}

/// An in-memory database lives only as long as its connection.
const MEMORY_CONNECTION_LIFETIME: Duration = Duration::from_secs(60 * 60 * 24 * 365);

fn is_in_memory(db_url: &str) -> bool {
    db_url.contains(":memory:") || db_url.contains("mode=memory")
}

/// Pool settings for `db_url`. In-memory databases get a single connection
/// that is never recycled, so every query sees the migrated schema.
fn connect_options(db_url: &str, max_connections: u32, min_connections: u32) -> ConnectOptions {
    let mut opt = ConnectOptions::new(db_url.to_string());
    opt.connect_timeout(Duration::from_secs(10))
        .acquire_timeout(Duration::from_secs(10))
        .sqlx_logging(false);

    if is_in_memory(db_url) {
        opt.max_connections(1)
            .min_connections(1)
            .idle_timeout(MEMORY_CONNECTION_LIFETIME)
            .max_lifetime(MEMORY_CONNECTION_LIFETIME);
    } else {
        opt.max_connections(max_connections)
            .min_connections(min_connections)
            .idle_timeout(Duration::from_secs(300))
            .max_lifetime(Duration::from_secs(600));
    }

    opt
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReapSummary {
    pub daily_picks: u64,
    pub pokemon: u64,
}

#[derive(Clone)]
pub struct Store {
    pub conn: DatabaseConnection,
}

impl Store {
    pub async fn with_pool_options(
        db_url: &str,
        max_connections: u32,
        min_connections: u32,
    ) -> Result<Self> {
        use sea_orm_migration::MigratorTrait;

        if !is_in_memory(db_url) {
            let path_str = db_url.trim_start_matches("sqlite://").trim_start_matches("sqlite:");
            if let Some(parent) = Path::new(path_str).parent() {
                tokio::fs::create_dir_all(parent).await.ok();
            }
            if !Path::new(path_str).exists() {
                std::fs::File::create(path_str)?;
            }
        }

        let opt = connect_options(db_url, max_connections, min_connections);
        let pool = (
            opt.get_min_connections().unwrap_or(min_connections),
            opt.get_max_connections().unwrap_or(max_connections),
        );

        let conn = Database::connect(opt).await?;

        migrator::Migrator::up(&conn, None).await?;

        info!(
            "Database connected & migrations applied (pool: {}-{})",
            pool.0, pool.1
        );

        Ok(Self { conn })
    }

    /// Single-connection in-memory store, used by tests and dry runs.
    pub async fn in_memory() -> Result<Self> {
        Self::with_pool_options("sqlite::memory:", 1, 1).await
    }

    pub async fn ping(&self) -> Result<()> {
        let backend = self.conn.get_database_backend();
        self.conn
            .query_one(Statement::from_string(backend, "SELECT 1".to_string()))
            .await?;
        Ok(())
    }

    pub async fn close(self) -> Result<()> {
        self.conn.close().await?;
        Ok(())
    }

    fn pokemon_repo(&self) -> repositories::pokemon::PokemonRepository {
        repositories::pokemon::PokemonRepository::new(self.conn.clone())
    }

    fn daily_repo(&self) -> repositories::daily::DailyPickRepository {
        repositories::daily::DailyPickRepository::new(self.conn.clone())
    }

    pub async fn get_pokemon(&self, id: i32) -> Result<Option<Pokemon>> {
        self.pokemon_repo().get_by_id(id).await
    }

    pub async fn get_pokemon_by_name(&self, name: &str) -> Result<Option<Pokemon>> {
        self.pokemon_repo().get_by_name(name).await
    }

    pub async fn search_pokemon_by_name(&self, fragment: &str, limit: u64) -> Result<Vec<Pokemon>> {
        self.pokemon_repo().search_by_name(fragment, limit).await
    }

    pub async fn search_pokemon_by_type(&self, fragment: &str, limit: u64) -> Result<Vec<Pokemon>> {
        self.pokemon_repo().search_by_type(fragment, limit).await
    }

    pub async fn insert_pokemon_if_absent(&self, pokemon: &Pokemon) -> Result<bool> {
        self.pokemon_repo().insert_if_absent(pokemon).await
    }

    pub async fn pokemon_count(&self) -> Result<u64> {
        self.pokemon_repo().count().await
    }

    pub async fn get_daily_pick(&self, date: &str) -> Result<Option<DailyPick>> {
        self.daily_repo().get(date).await
    }

    pub async fn upsert_daily_pick(
        &self,
        date: &str,
        pokemon_id: i32,
        pokemon_ref: Option<i32>,
        expires_at: DateTime<Utc>,
    ) -> Result<()> {
        self.daily_repo()
            .upsert(date, pokemon_id, pokemon_ref, expires_at)
            .await
    }

    /// Removes daily pointers and Pokémon rows whose `expires_at` is before `now`.
    pub async fn reap_expired(&self, now: DateTime<Utc>) -> Result<ReapSummary> {
        let now = format_timestamp(now);
        Ok(ReapSummary {
            daily_picks: self.daily_repo().delete_expired(&now).await?,
            pokemon: self.pokemon_repo().delete_expired(&now).await?,
        })
    }
}
