use std::sync::Arc;

use sea_orm::DatabaseConnection;
use uuid::Uuid;

use crate::entities::captain::VehicleType;
use crate::entities::ride;
use crate::error::{AppError, AppResult};
use crate::services::captain_locator;
use crate::services::geocoder::Geocoder;
use crate::services::notifier::{Notifier, RideEvent};
use crate::services::ride_lifecycle::RideLifecycle;
use crate::utils::geo::Coordinates;

/// Turns a rider's request into a Pending ride and offers it to nearby captains.
pub struct Dispatcher {
    db: DatabaseConnection,
    geocoder: Arc<dyn Geocoder>,
    notifier: Arc<dyn Notifier>,
    radius_km: f64,
}

impl Dispatcher {
    pub fn new(
        db: DatabaseConnection,
        geocoder: Arc<dyn Geocoder>,
        notifier: Arc<dyn Notifier>,
        radius_km: f64,
    ) -> Self {
        Self {
            db,
            geocoder,
            notifier,
            radius_km,
        }
    }

    pub async fn request_ride(
        &self,
        rides: &RideLifecycle,
        rider_id: Uuid,
        pickup: &str,
        destination: &str,
        vehicle_type: VehicleType,
    ) -> AppResult<ride::Model> {
        // Resolve the pickup first so an unknown address never creates a ride
        let pickup_point = self.geocoder.resolve(pickup).await?;

        let ride = rides
            .create_ride(rider_id, pickup, destination, vehicle_type)
            .await?;

        // The ride already exists, so a failed offer is logged and the ride is still returned
        match self.offer_to_captains(rides, &ride, pickup_point, vehicle_type).await {
            Ok(notified) => tracing::info!(
                ride_id = %ride.id,
                radius_km = self.radius_km,
                notified,
                "Ride offered to nearby captains"
            ),
            Err(err) => tracing::warn!(
                ride_id = %ride.id,
                error = %err,
                "Ride created but could not be offered to captains"
            ),
        }

        Ok(ride)
    }

    async fn offer_to_captains(
        &self,
        rides: &RideLifecycle,
        ride: &ride::Model,
        pickup_point: Coordinates,
        vehicle_type: VehicleType,
    ) -> AppResult<usize> {
        let captains = captain_locator::find_active_within_radius(
            &self.db,
            pickup_point.lng,
            pickup_point.lat,
            self.radius_km,
            Some(vehicle_type),
        )
        .await?;

        let payload = serde_json::to_value(rides.with_rider(ride.clone()).await?)
            .map_err(|e| AppError::Internal(format!("Failed to serialize ride: {}", e)))?;

        for captain in &captains {
            self.notifier
                .send(captain.id, RideEvent::NewRide, payload.clone());
        }

        Ok(captains.len())
    }
}
