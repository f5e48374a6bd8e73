use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "pokemon")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: i32,
    pub name: String,
    #[sea_orm(column_type = "Text")]
    pub types: String, // JSON array of {name, url}
    pub type_names: String, // space-joined, pre-filter for type search
    #[sea_orm(column_type = "Text")]
    pub stats: String,
    #[sea_orm(column_type = "Text")]
    pub abilities: String,
    #[sea_orm(column_type = "Text")]
    pub sprites: String,
    pub height: i32,
    pub weight: i32,
    pub base_experience: Option<i32>,
    pub cached_at: String,
    pub expires_at: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
