use crate::db::{format_timestamp, parse_timestamp};
use crate::entities::daily_random_cache;
use crate::models::pokemon::DailyPick;
use anyhow::Result;
use chrono::{DateTime, Utc};
use sea_orm::sea_query::OnConflict;
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set};

pub struct DailyPickRepository {
    conn: DatabaseConnection,
}

impl DailyPickRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn get(&self, date: &str) -> Result<Option<DailyPick>> {
        let Some(row) = daily_random_cache::Entity::find_by_id(date.to_string())
            .one(&self.conn)
            .await?
        else {
            return Ok(None);
        };

        Ok(Some(DailyPick {
            date: row.date,
            pokemon_id: row.pokemon_id,
            pokemon_ref: row.pokemon_ref,
            expires_at: parse_timestamp(&row.expires_at)?,
        }))
    }

    /// Creates the pointer for `date`, or repoints the existing row in place.
    pub async fn upsert(
        &self,
        date: &str,
        pokemon_id: i32,
        pokemon_ref: Option<i32>,
        expires_at: DateTime<Utc>,
    ) -> Result<()> {
        let active_model = daily_random_cache::ActiveModel {
            date: Set(date.to_string()),
            pokemon_id: Set(pokemon_id),
            pokemon_ref: Set(pokemon_ref),
            expires_at: Set(format_timestamp(expires_at)),
        };

        daily_random_cache::Entity::insert(active_model)
            .on_conflict(
                OnConflict::column(daily_random_cache::Column::Date)
                    .update_columns([
                        daily_random_cache::Column::PokemonId,
                        daily_random_cache::Column::PokemonRef,
                        daily_random_cache::Column::ExpiresAt,
                    ])
                    .to_owned(),
            )
            .exec_without_returning(&self.conn)
            .await?;

        Ok(())
    }

    pub async fn delete_expired(&self, now: &str) -> Result<u64> {
        let result = daily_random_cache::Entity::delete_many()
            .filter(daily_random_cache::Column::ExpiresAt.lt(now))
            .exec(&self.conn)
            .await?;
        Ok(result.rows_affected)
    }
}
