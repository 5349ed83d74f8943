use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
pub enum RideStatus {
    #[sea_orm(string_value = "Pending")]
    Pending,
    #[sea_orm(string_value = "Accepted")]
    Accepted,
    #[sea_orm(string_value = "Ongoing")]
    Ongoing,
    #[sea_orm(string_value = "Completed")]
    Completed,
    #[sea_orm(string_value = "Cancelled")]
    Cancelled,
}

impl RideStatus {
    /// Whether a ride in this status may move to `next`.
    /// Pending -> Accepted -> Ongoing -> Completed, and Pending|Accepted -> Cancelled.
    pub fn can_transition_to(self, next: RideStatus) -> bool {
        matches!(
            (self, next),
            (RideStatus::Pending, RideStatus::Accepted)
                | (RideStatus::Accepted, RideStatus::Ongoing)
                | (RideStatus::Ongoing, RideStatus::Completed)
                | (RideStatus::Pending, RideStatus::Cancelled)
                | (RideStatus::Accepted, RideStatus::Cancelled)
        )
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, RideStatus::Completed | RideStatus::Cancelled)
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "ride")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub rider_id: Uuid,
    pub captain_id: Option<Uuid>,
    #[sea_orm(column_type = "Text")]
    pub pickup: String,
    #[sea_orm(column_type = "Text")]
    pub destination: String,
    pub fare: i64,
    pub status: RideStatus,
    // Only ever exposed through `RideDetails`
    #[serde(skip_serializing, default)]
    pub otp: String,
    /// Seconds
    pub duration: Option<i32>,
    /// Meters
    pub distance: Option<i32>,
    pub payment_id: Option<String>,
    pub order_id: Option<String>,
    pub signature: Option<String>,
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::rider::Entity",
        from = "Column::RiderId",
        to = "super::rider::Column::Id"
    )]
    Rider,
    #[sea_orm(
        belongs_to = "super::captain::Entity",
        from = "Column::CaptainId",
        to = "super::captain::Column::Id"
    )]
    Captain,
}

impl Related<super::rider::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Rider.def()
    }
}

impl Related<super::captain::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Captain.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
