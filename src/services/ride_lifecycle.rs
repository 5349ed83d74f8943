//! Ride state machine: Pending -> Accepted -> Ongoing -> Completed, with
//! Cancelled reachable from Pending or Accepted.
//!
//! Every transition is a conditional write keyed on the ride id and its
//! expected current status, so concurrent callers cannot both win.

use std::sync::Arc;

use chrono::Utc;
use rand::Rng;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set,
};
use serde::Serialize;
use uuid::Uuid;

use crate::entities::captain::{self, VehicleType};
use crate::entities::ride::{self, RideStatus};
use crate::entities::rider;
use crate::error::{AppError, AppResult};
use crate::services::fare::FareCalculator;
use crate::services::notifier::{Notifier, RideEvent};

pub const OTP_LENGTH: usize = 6;

/// Uniform over every `OTP_LENGTH`-digit string, leading zeros included.
pub fn generate_otp() -> String {
    let upper = 10u32.pow(OTP_LENGTH as u32);
    let value = rand::thread_rng().gen_range(0..upper);
    format!("{:0width$}", value, width = OTP_LENGTH)
}

/// A ride with its rider and captain expanded and the OTP included.
#[derive(Debug, Clone, Serialize)]
pub struct RideDetails {
    #[serde(flatten)]
    pub ride: ride::Model,
    pub otp: String,
    pub rider: rider::Model,
    pub captain: Option<captain::Model>,
}

/// Payload of `new-ride`: the ride (OTP masked) with its rider.
#[derive(Debug, Clone, Serialize)]
pub struct RideWithRider {
    #[serde(flatten)]
    pub ride: ride::Model,
    pub rider: rider::Model,
}

pub struct RideLifecycle {
    db: DatabaseConnection,
    fares: FareCalculator,
    notifier: Arc<dyn Notifier>,
}

impl RideLifecycle {
    pub fn new(db: DatabaseConnection, fares: FareCalculator, notifier: Arc<dyn Notifier>) -> Self {
        Self { db, fares, notifier }
    }

    pub fn fares(&self) -> &FareCalculator {
        &self.fares
    }

    /// Prices the trip for `vehicle_type`, freezes the fare and issues the OTP.
    pub async fn create_ride(
        &self,
        rider_id: Uuid,
        pickup: &str,
        destination: &str,
        vehicle_type: VehicleType,
    ) -> AppResult<ride::Model> {
        if pickup.trim().is_empty() || destination.trim().is_empty() {
            return Err(AppError::BadRequest("All fields are required".to_string()));
        }

        let quote = self.fares.quote(pickup, destination).await?;

        let new_ride = ride::ActiveModel {
            id: Set(Uuid::new_v4()),
            rider_id: Set(rider_id),
            captain_id: Set(None),
            pickup: Set(pickup.to_string()),
            destination: Set(destination.to_string()),
            fare: Set(quote.fares.for_vehicle(vehicle_type)),
            status: Set(RideStatus::Pending),
            otp: Set(generate_otp()),
            duration: Set(i32::try_from(quote.route.duration.value).ok()),
            distance: Set(i32::try_from(quote.route.distance.value).ok()),
            created_at: Set(Utc::now().into()),
            ..Default::default()
        };

        let ride = new_ride.insert(&self.db).await?;
        tracing::info!(
            ride_id = %ride.id,
            rider_id = %rider_id,
            vehicle_type = ?vehicle_type,
            fare = ride.fare,
            "Ride requested"
        );

        Ok(ride)
    }

    /// Assigns the captain. Only a Pending ride without a captain can be confirmed.
    pub async fn confirm_ride(&self, ride_id: Uuid, captain_id: Uuid) -> AppResult<RideDetails> {
        let result = ride::Entity::update_many()
            .set(ride::ActiveModel {
                status: Set(RideStatus::Accepted),
                captain_id: Set(Some(captain_id)),
                ..Default::default()
            })
            .filter(ride::Column::Id.eq(ride_id))
            .filter(ride::Column::Status.eq(RideStatus::Pending))
            .filter(ride::Column::CaptainId.is_null())
            .exec(&self.db)
            .await?;

        if result.rows_affected == 0 {
            let ride = self.find_ride(ride_id).await?;
            tracing::warn!(ride_id = %ride_id, captain_id = %captain_id, status = ?ride.status, "Confirm rejected");
            let message = if ride.status.is_terminal() {
                format!("Ride is {:?} and can no longer be accepted", ride.status)
            } else {
                "Ride has already been accepted by a captain".to_string()
            };
            return Err(AppError::InvalidState(message));
        }

        let details = self.details(ride_id).await?;
        tracing::info!(ride_id = %ride_id, captain_id = %captain_id, "Ride accepted");
        self.notify(details.ride.rider_id, RideEvent::RideConfirmed, &details);

        Ok(details)
    }

    /// Starts the trip once the captain presents the rider's OTP.
    pub async fn start_ride(&self, ride_id: Uuid, otp: &str, captain_id: Uuid) -> AppResult<RideDetails> {
        if otp.is_empty() {
            return Err(AppError::BadRequest("Ride id and OTP are required".to_string()));
        }

        let ride = self.find_ride(ride_id).await?;

        if ride.status != RideStatus::Accepted {
            return Err(AppError::InvalidState("Ride not accepted".to_string()));
        }

        if ride.otp != otp {
            tracing::warn!(ride_id = %ride_id, captain_id = %captain_id, "OTP mismatch");
            return Err(AppError::InvalidOtp);
        }

        self.advance(ride_id, None, RideStatus::Accepted, RideStatus::Ongoing)
            .await?;

        let details = self.details(ride_id).await?;
        tracing::info!(ride_id = %ride_id, captain_id = %captain_id, "Ride started");
        self.notify(details.ride.rider_id, RideEvent::RideStarted, &details);

        Ok(details)
    }

    /// Completes the trip. Only the assigned captain may end it; anyone else
    /// gets the same `NotFound` as a missing ride.
    pub async fn end_ride(&self, ride_id: Uuid, captain_id: Uuid) -> AppResult<RideDetails> {
        let ride = ride::Entity::find()
            .filter(ride::Column::Id.eq(ride_id))
            .filter(ride::Column::CaptainId.eq(captain_id))
            .one(&self.db)
            .await?
            .ok_or_else(|| AppError::NotFound("Ride not found".to_string()))?;

        if ride.status != RideStatus::Ongoing {
            return Err(AppError::InvalidState("Ride not ongoing".to_string()));
        }

        self.advance(ride_id, Some(captain_id), RideStatus::Ongoing, RideStatus::Completed)
            .await?;

        let details = self.details(ride_id).await?;
        tracing::info!(ride_id = %ride_id, captain_id = %captain_id, fare = details.ride.fare, "Ride completed");
        self.notify(details.ride.rider_id, RideEvent::RideEnded, &details);

        Ok(details)
    }

    /// Rider withdraws a ride that has not started yet.
    pub async fn cancel_ride(&self, ride_id: Uuid, rider_id: Uuid) -> AppResult<ride::Model> {
        let ride = ride::Entity::find()
            .filter(ride::Column::Id.eq(ride_id))
            .filter(ride::Column::RiderId.eq(rider_id))
            .one(&self.db)
            .await?
            .ok_or_else(|| AppError::NotFound("Ride not found".to_string()))?;

        if ride.status.is_terminal() {
            return Err(AppError::InvalidState(format!(
                "Ride is {:?} and can no longer be cancelled",
                ride.status
            )));
        }
        if !ride.status.can_transition_to(RideStatus::Cancelled) {
            return Err(AppError::InvalidState(
                "Ride has already started".to_string(),
            ));
        }

        self.advance(ride_id, None, ride.status, RideStatus::Cancelled)
            .await?;

        let cancelled = self.find_ride(ride_id).await?;
        tracing::info!(ride_id = %ride_id, rider_id = %rider_id, from = ?ride.status, "Ride cancelled");

        if let Some(captain_id) = cancelled.captain_id {
            self.notify(captain_id, RideEvent::RideCancelled, &cancelled);
        }

        Ok(cancelled)
    }

    /// The ride with its rider, OTP masked.
    pub async fn with_rider(&self, ride: ride::Model) -> AppResult<RideWithRider> {
        let rider = rider::Entity::find_by_id(ride.rider_id)
            .one(&self.db)
            .await?
            .ok_or_else(|| AppError::NotFound("Rider not found".to_string()))?;

        Ok(RideWithRider { ride, rider })
    }

    async fn find_ride(&self, ride_id: Uuid) -> AppResult<ride::Model> {
        ride::Entity::find_by_id(ride_id)
            .one(&self.db)
            .await?
            .ok_or_else(|| AppError::NotFound("Ride not found".to_string()))
    }

    async fn details(&self, ride_id: Uuid) -> AppResult<RideDetails> {
        let ride = self.find_ride(ride_id).await?;

        let rider = rider::Entity::find_by_id(ride.rider_id)
            .one(&self.db)
            .await?
            .ok_or_else(|| AppError::NotFound("Rider not found".to_string()))?;

        let captain = match ride.captain_id {
            Some(captain_id) => captain::Entity::find_by_id(captain_id).one(&self.db).await?,
            None => None,
        };

        Ok(RideDetails {
            otp: ride.otp.clone(),
            ride,
            rider,
            captain,
        })
    }

    /// Conditional status write. Fails with `InvalidState` when the ride left
    /// `from` between the read and this write.
    async fn advance(
        &self,
        ride_id: Uuid,
        captain_id: Option<Uuid>,
        from: RideStatus,
        to: RideStatus,
    ) -> AppResult<()> {
        debug_assert!(from.can_transition_to(to));

        let mut update = ride::Entity::update_many()
            .set(ride::ActiveModel {
                status: Set(to),
                ..Default::default()
            })
            .filter(ride::Column::Id.eq(ride_id))
            .filter(ride::Column::Status.eq(from));
        if let Some(captain_id) = captain_id {
            update = update.filter(ride::Column::CaptainId.eq(captain_id));
        }

        let result = update.exec(&self.db).await?;
        if result.rows_affected == 0 {
            tracing::warn!(ride_id = %ride_id, from = ?from, to = ?to, "Lost a concurrent status update");
            return Err(AppError::InvalidState(format!(
                "Ride is no longer {:?}",
                from
            )));
        }

        Ok(())
    }

    fn notify<T: Serialize>(&self, actor_id: Uuid, event: RideEvent, payload: &T) {
        match serde_json::to_value(payload) {
            Ok(value) => self.notifier.send(actor_id, event, value),
            Err(e) => tracing::error!(error = %e, event = event.as_str(), "Failed to serialize event payload"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_otp_shape() {
        for _ in 0..1_000 {
            let otp = generate_otp();
            assert_eq!(otp.len(), OTP_LENGTH);
            assert!(otp.chars().all(|c| c.is_ascii_digit()));
        }
    }

    #[test]
    fn test_otp_includes_leading_zeros() {
        // P(no leading zero in 5000 draws) = 0.9^5000, effectively zero
        assert!((0..5_000).any(|_| generate_otp().starts_with('0')));
    }
}
