use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(BlacklistToken::Table)
                    .if_not_exists()
                    .col(uuid(BlacklistToken::Id).primary_key())
                    .col(text(BlacklistToken::Token).not_null().unique_key())
                    .col(
                        timestamp_with_time_zone(BlacklistToken::CreatedAt)
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(BlacklistToken::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum BlacklistToken {
    Table,
    Id,
    Token,
    CreatedAt,
}
