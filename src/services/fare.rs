use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::entities::captain::VehicleType;
use crate::error::AppResult;
use crate::services::router::{DistanceTime, Router};

/// Linear fare model: `base + km * per_km + minutes * per_minute`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rate {
    pub base: f64,
    pub per_km: f64,
    pub per_minute: f64,
}

impl Rate {
    pub fn price(&self, distance_km: f64, duration_min: f64) -> i64 {
        (self.base + distance_km * self.per_km + duration_min * self.per_minute).round() as i64
    }
}

pub fn rate_for(vehicle_type: VehicleType) -> Rate {
    match vehicle_type {
        VehicleType::Auto => Rate { base: 30.0, per_km: 10.0, per_minute: 2.0 },
        VehicleType::Car => Rate { base: 50.0, per_km: 15.0, per_minute: 2.0 },
        VehicleType::Bike => Rate { base: 20.0, per_km: 8.0, per_minute: 1.5 },
    }
}

/// Fare per vehicle type in whole currency units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FareTable {
    pub auto: i64,
    pub car: i64,
    pub bike: i64,
}

impl FareTable {
    pub fn compute(distance_m: i64, duration_s: i64) -> Self {
        let distance_km = distance_m as f64 / 1000.0;
        let duration_min = duration_s as f64 / 60.0;

        Self {
            auto: rate_for(VehicleType::Auto).price(distance_km, duration_min),
            car: rate_for(VehicleType::Car).price(distance_km, duration_min),
            bike: rate_for(VehicleType::Bike).price(distance_km, duration_min),
        }
    }

    pub fn for_vehicle(&self, vehicle_type: VehicleType) -> i64 {
        match vehicle_type {
            VehicleType::Auto => self.auto,
            VehicleType::Car => self.car,
            VehicleType::Bike => self.bike,
        }
    }
}

/// Fares together with the route they were priced on.
#[derive(Debug, Clone, PartialEq)]
pub struct FareQuote {
    pub fares: FareTable,
    pub route: DistanceTime,
}

#[derive(Clone)]
pub struct FareCalculator {
    router: Arc<Router>,
}

impl FareCalculator {
    pub fn new(router: Arc<Router>) -> Self {
        Self { router }
    }

    pub async fn quote(&self, pickup: &str, destination: &str) -> AppResult<FareQuote> {
        let route = self.router.get_distance_time(pickup, destination).await?;
        let fares = FareTable::compute(route.distance.value, route.duration.value);

        tracing::debug!(
            pickup,
            destination,
            provider = %route.provider,
            auto = fares.auto,
            car = fares.car,
            bike = fares.bike,
            "Fare computed"
        );

        Ok(FareQuote { fares, route })
    }

    pub async fn get_fare(&self, pickup: &str, destination: &str) -> AppResult<FareTable> {
        Ok(self.quote(pickup, destination).await?.fares)
    }
}
