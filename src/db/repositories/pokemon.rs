use crate::db::{format_timestamp, parse_timestamp};
use crate::entities::pokemon;
use crate::models::pokemon::Pokemon;
use anyhow::Result;
use sea_orm::sea_query::{LikeExpr, OnConflict};
use sea_orm::{
    ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect, Set,
};

pub struct PokemonRepository {
    conn: DatabaseConnection,
}

impl PokemonRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    fn map_model(model: pokemon::Model) -> Result<Pokemon> {
        Ok(Pokemon {
            id: model.id,
            name: model.name,
            types: serde_json::from_str(&model.types)?,
            stats: serde_json::from_str(&model.stats)?,
            abilities: serde_json::from_str(&model.abilities)?,
            sprites: serde_json::from_str(&model.sprites)?,
            height: model.height,
            weight: model.weight,
            base_experience: model.base_experience,
            cached_at: parse_timestamp(&model.cached_at)?,
            expires_at: model
                .expires_at
                .as_deref()
                .map(parse_timestamp)
                .transpose()?,
        })
    }

    fn map_models(models: Vec<pokemon::Model>) -> Result<Vec<Pokemon>> {
        models.into_iter().map(Self::map_model).collect()
    }

    pub async fn get_by_id(&self, id: i32) -> Result<Option<Pokemon>> {
        pokemon::Entity::find_by_id(id)
            .one(&self.conn)
            .await?
            .map(Self::map_model)
            .transpose()
    }

    pub async fn get_by_name(&self, name: &str) -> Result<Option<Pokemon>> {
        pokemon::Entity::find()
            .filter(pokemon::Column::Name.eq(name.trim().to_lowercase()))
            .one(&self.conn)
            .await?
            .map(Self::map_model)
            .transpose()
    }

    pub async fn search_by_name(&self, fragment: &str, limit: u64) -> Result<Vec<Pokemon>> {
        let models = pokemon::Entity::find()
            .filter(pokemon::Column::Name.like(contains_pattern(fragment)))
            .order_by_asc(pokemon::Column::CachedAt)
            .order_by_asc(pokemon::Column::Id)
            .limit(limit)
            .all(&self.conn)
            .await?;

        Self::map_models(models)
    }

    pub async fn search_by_type(&self, fragment: &str, limit: u64) -> Result<Vec<Pokemon>> {
        // The LIKE on the joined column can match across a separator, so
        // candidates are re-checked against each type name.
        let models = pokemon::Entity::find()
            .filter(pokemon::Column::TypeNames.like(contains_pattern(fragment)))
            .order_by_asc(pokemon::Column::CachedAt)
            .order_by_asc(pokemon::Column::Id)
            .all(&self.conn)
            .await?;

        let limit = usize::try_from(limit).unwrap_or(usize::MAX);
        let mut matches = Vec::new();
        for model in models {
            let record = Self::map_model(model)?;
            if record.has_type_matching(fragment) {
                matches.push(record);
                if matches.len() >= limit {
                    break;
                }
            }
        }

        Ok(matches)
    }

    /// Persists the record unless its id is already stored. Returns whether a row was written.
    pub async fn insert_if_absent(&self, record: &Pokemon) -> Result<bool> {
        let active_model = pokemon::ActiveModel {
            id: Set(record.id),
            name: Set(record.name.to_lowercase()),
            types: Set(serde_json::to_string(&record.types)?),
            type_names: Set(record.type_names().collect::<Vec<_>>().join(" ")),
            stats: Set(serde_json::to_string(&record.stats)?),
            abilities: Set(serde_json::to_string(&record.abilities)?),
            sprites: Set(serde_json::to_string(&record.sprites)?),
            height: Set(record.height),
            weight: Set(record.weight),
            base_experience: Set(record.base_experience),
            cached_at: Set(format_timestamp(record.cached_at)),
            expires_at: Set(record.expires_at.map(format_timestamp)),
        };

        let inserted = pokemon::Entity::insert(active_model)
            .on_conflict(
                OnConflict::column(pokemon::Column::Id)
                    .do_nothing()
                    .to_owned(),
            )
            .exec_without_returning(&self.conn)
            .await?;

        Ok(inserted > 0)
    }

    pub async fn count(&self) -> Result<u64> {
        Ok(pokemon::Entity::find().count(&self.conn).await?)
    }

    pub async fn delete_expired(&self, now: &str) -> Result<u64> {
        let result = pokemon::Entity::delete_many()
            .filter(pokemon::Column::ExpiresAt.is_not_null())
            .filter(pokemon::Column::ExpiresAt.lt(now))
            .exec(&self.conn)
            .await?;
        Ok(result.rows_affected)
    }
}

/// Case-insensitive literal substring pattern; `%` and `_` in the input match themselves.
fn contains_pattern(fragment: &str) -> LikeExpr {
    LikeExpr::new(format!("%{}%", escape_like(fragment))).escape('\\')
}

fn escape_like(fragment: &str) -> String {
    let mut escaped = String::with_capacity(fragment.len());
    for c in fragment.trim().to_lowercase().chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}
