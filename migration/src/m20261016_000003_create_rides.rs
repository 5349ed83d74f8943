use sea_orm_migration::{prelude::*, schema::*};

use super::m20261016_000001_create_riders::Rider;
use super::m20261016_000002_create_captains::Captain;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Ride::Table)
                    .if_not_exists()
                    .col(uuid(Ride::Id).primary_key())
                    .col(uuid(Ride::RiderId).not_null())
                    .col(uuid_null(Ride::CaptainId))
                    .col(text(Ride::Pickup).not_null())
                    .col(text(Ride::Destination).not_null())
                    .col(big_integer(Ride::Fare).not_null())
                    .col(string_len(Ride::Status, 16).not_null().default("Pending"))
                    .col(string_len(Ride::Otp, 6).not_null())
                    .col(integer_null(Ride::Duration))
                    .col(integer_null(Ride::Distance))
                    .col(string_len_null(Ride::PaymentId, 255))
                    .col(string_len_null(Ride::OrderId, 255))
                    .col(string_len_null(Ride::Signature, 255))
                    .col(
                        timestamp_with_time_zone(Ride::CreatedAt)
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_ride_rider")
                            .from(Ride::Table, Ride::RiderId)
                            .to(Rider::Table, Rider::Id)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_ride_captain")
                            .from(Ride::Table, Ride::CaptainId)
                            .to(Captain::Table, Captain::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Ride::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum Ride {
    Table,
    Id,
    RiderId,
    CaptainId,
    Pickup,
    Destination,
    Fare,
    Status,
    Otp,
    Duration,
    Distance,
    PaymentId,
    OrderId,
    Signature,
    CreatedAt,
}
