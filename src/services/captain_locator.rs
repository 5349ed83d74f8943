use sea_orm::{ColumnTrait, Condition, DatabaseConnection, EntityTrait, QueryFilter};

use crate::entities::captain::{self, CaptainStatus, VehicleType};
use crate::error::{AppError, AppResult};
use crate::utils::geo::{bounding_box, haversine_distance, Coordinates};

/// Extra constraints intersected with the radius query.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct CaptainFilter {
    pub status: Option<CaptainStatus>,
    pub vehicle_type: Option<VehicleType>,
}

impl CaptainFilter {
    pub fn active() -> Self {
        Self {
            status: Some(CaptainStatus::Active),
            vehicle_type: None,
        }
    }

    pub fn with_vehicle_type(mut self, vehicle_type: VehicleType) -> Self {
        self.vehicle_type = Some(vehicle_type);
        self
    }

    fn condition(&self) -> Condition {
        let mut condition = Condition::all();
        if let Some(status) = self.status {
            condition = condition.add(captain::Column::Status.eq(status));
        }
        if let Some(vehicle_type) = self.vehicle_type {
            condition = condition.add(captain::Column::VehicleType.eq(vehicle_type));
        }
        condition
    }
}

/// Captains within `radius_km` of (`lng`, `lat`) matching `filter`, nearest first.
///
/// The database narrows candidates to the enclosing bounding box; the exact
/// great-circle distance decides membership.
pub async fn find_within_radius(
    db: &DatabaseConnection,
    lng: f64,
    lat: f64,
    radius_km: f64,
    filter: CaptainFilter,
) -> AppResult<Vec<captain::Model>> {
    let center = Coordinates::new(lng, lat)?;
    if !radius_km.is_finite() || radius_km < 0.0 {
        return Err(AppError::InvalidArgument(format!(
            "Radius must be a non-negative number of kilometers, got {}",
            radius_km
        )));
    }

    let bbox = bounding_box(center, radius_km);
    let mut query = captain::Entity::find()
        .filter(filter.condition())
        .filter(captain::Column::LocationLat.between(bbox.lat.0, bbox.lat.1));
    if let Some((min_lng, max_lng)) = bbox.lng {
        query = query.filter(captain::Column::LocationLng.between(min_lng, max_lng));
    }

    let candidates = query.all(db).await?;
    let candidate_count = candidates.len();

    let mut matches: Vec<(f64, captain::Model)> = candidates
        .into_iter()
        .map(|c| {
            let distance = haversine_distance(center.lat, center.lng, c.location_lat, c.location_lng);
            (distance, c)
        })
        .filter(|(distance, _)| *distance <= radius_km)
        .collect();
    matches.sort_by(|a, b| a.0.total_cmp(&b.0));

    tracing::debug!(
        lng,
        lat,
        radius_km,
        candidates = candidate_count,
        matched = matches.len(),
        "Captain radius query"
    );

    Ok(matches.into_iter().map(|(_, c)| c).collect())
}

/// Convenience wrapper for dispatch: active captains only.
pub async fn find_active_within_radius(
    db: &DatabaseConnection,
    lng: f64,
    lat: f64,
    radius_km: f64,
    vehicle_type: Option<VehicleType>,
) -> AppResult<Vec<captain::Model>> {
    let filter = CaptainFilter {
        vehicle_type,
        ..CaptainFilter::active()
    };
    find_within_radius(db, lng, lat, radius_km, filter).await
}

/// Every captain currently marked active.
pub async fn list_active(db: &DatabaseConnection) -> AppResult<Vec<captain::Model>> {
    Ok(captain::Entity::find()
        .filter(captain::Column::Status.eq(CaptainStatus::Active))
        .all(db)
        .await?)
}
