use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};

const EARTH_RADIUS_KM: f64 = 6371.0;

/// A WGS84 point, longitude first as the map providers return it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lng: f64,
    pub lat: f64,
}

impl Coordinates {
    /// Rejects NaN, infinities and out-of-range values.
    pub fn new(lng: f64, lat: f64) -> AppResult<Self> {
        if !lng.is_finite() || !lat.is_finite() {
            return Err(AppError::InvalidArgument(format!(
                "Coordinates must be finite numbers, got lng={} lat={}",
                lng, lat
            )));
        }
        if !(-180.0..=180.0).contains(&lng) || !(-90.0..=90.0).contains(&lat) {
            return Err(AppError::InvalidArgument(format!(
                "Coordinates out of range: lng={} lat={}",
                lng, lat
            )));
        }
        Ok(Self { lng, lat })
    }
}

/// Calculate distance between two coordinates using Haversine formula
/// Returns distance in kilometers
pub fn haversine_distance(lat1: f64, lng1: f64, lat2: f64, lng2: f64) -> f64 {
    let lat1_rad = lat1.to_radians();
    let lat2_rad = lat2.to_radians();
    let delta_lat = (lat2 - lat1).to_radians();
    let delta_lng = (lng2 - lng1).to_radians();

    let a = (delta_lat / 2.0).sin().powi(2)
        + lat1_rad.cos() * lat2_rad.cos() * (delta_lng / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().min(1.0).asin();

    EARTH_RADIUS_KM * c
}

/// Degree bounds that contain every point within `radius_km` of `center`.
/// `lng` is `None` when the box would wrap the antimeridian or touch a pole,
/// in which case only the latitude band is usable as a prefilter.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub lat: (f64, f64),
    pub lng: Option<(f64, f64)>,
}

pub fn bounding_box(center: Coordinates, radius_km: f64) -> BoundingBox {
    // Angular radius on the same sphere `haversine_distance` measures on,
    // widened by a hair so rounding never excludes a point on the circle.
    let angular = radius_km / EARTH_RADIUS_KM * (1.0 + 1e-9);

    let lat_delta = angular.to_degrees();
    let min_lat = (center.lat - lat_delta).max(-90.0);
    let max_lat = (center.lat + lat_delta).min(90.0);

    // The circle's widest longitude is reached poleward of the center, where
    // sin(dlng) = sin(angular) / cos(lat).
    let ratio = angular.sin() / center.lat.to_radians().cos();
    let lng = if min_lat <= -90.0 || max_lat >= 90.0 || !(0.0..1.0).contains(&ratio) {
        None
    } else {
        let lng_delta = ratio.asin().to_degrees();
        let (min_lng, max_lng) = (center.lng - lng_delta, center.lng + lng_delta);
        if min_lng < -180.0 || max_lng > 180.0 {
            None
        } else {
            Some((min_lng, max_lng))
        }
    };

    BoundingBox {
        lat: (min_lat, max_lat),
        lng,
    }
}
