use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_index(
                Index::create()
                    .name("idx_pokemon_name")
                    .table(Pokemon::Table)
                    .col(Pokemon::Name)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_pokemon_type_names")
                    .table(Pokemon::Table)
                    .col(Pokemon::TypeNames)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_pokemon_expires_at")
                    .table(Pokemon::Table)
                    .col(Pokemon::ExpiresAt)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_daily_random_cache_expires_at")
                    .table(DailyRandomCache::Table)
                    .col(DailyRandomCache::ExpiresAt)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(
                Index::drop()
                    .name("idx_daily_random_cache_expires_at")
                    .table(DailyRandomCache::Table)
                    .to_owned(),
            )
            .await?;

        for name in [
            "idx_pokemon_name",
            "idx_pokemon_type_names",
            "idx_pokemon_expires_at",
        ] {
            manager
                .drop_index(Index::drop().name(name).table(Pokemon::Table).to_owned())
                .await?;
        }

        Ok(())
    }
}

#[derive(DeriveIden)]
enum Pokemon {
    Table,
    Name,
    TypeNames,
    ExpiresAt,
}

#[derive(DeriveIden)]
enum DailyRandomCache {
    Table,
    ExpiresAt,
}
