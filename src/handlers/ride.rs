use axum::{
    extract::{Query, State},
    http::StatusCode,
    Extension, Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::entities::captain::VehicleType;
use crate::entities::ride;
use crate::error::AppResult;
use crate::services::fare::FareTable;
use crate::services::ride_lifecycle::RideDetails;
use crate::utils::jwt::Claims;
use crate::AppState;

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateRideRequest {
    #[validate(length(min = 3, message = "Invalid pickup address"))]
    pub pickup: String,
    #[validate(length(min = 3, message = "Invalid destination address"))]
    pub destination: String,
    pub vehicle_type: VehicleType,
}

#[derive(Debug, Deserialize, Validate)]
pub struct FareQuery {
    #[validate(length(min = 3, message = "Invalid pickup address"))]
    pub pickup: String,
    #[validate(length(min = 3, message = "Invalid destination address"))]
    pub destination: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RideIdRequest {
    pub ride_id: Uuid,
}

/// OTPs of any length are compared by `start_ride`
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StartRideQuery {
    pub ride_id: Uuid,
    pub otp: String,
}

#[derive(Debug, Serialize)]
pub struct RideResponse {
    pub ride: ride::Model,
}

#[derive(Debug, Serialize)]
pub struct RideDetailsResponse {
    pub ride: RideDetails,
}

#[derive(Debug, Serialize)]
pub struct FareResponse {
    pub fare: FareTable,
}

/// Request a ride and offer it to captains near the pickup
pub async fn create_ride(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<CreateRideRequest>,
) -> AppResult<(StatusCode, Json<RideResponse>)> {
    payload.validate()?;

    let ride = state
        .dispatcher
        .request_ride(
            &state.rides,
            claims.sub,
            &payload.pickup,
            &payload.destination,
            payload.vehicle_type,
        )
        .await?;

    Ok((StatusCode::CREATED, Json(RideResponse { ride })))
}

/// Fare for every vehicle type between two addresses
pub async fn get_fare(
    State(state): State<AppState>,
    Query(query): Query<FareQuery>,
) -> AppResult<Json<FareResponse>> {
    query.validate()?;
    let fare = state
        .rides
        .fares()
        .get_fare(&query.pickup, &query.destination)
        .await?;
    Ok(Json(FareResponse { fare }))
}

/// Captain accepts a pending ride
pub async fn confirm_ride(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<RideIdRequest>,
) -> AppResult<Json<RideDetailsResponse>> {
    let ride = state.rides.confirm_ride(payload.ride_id, claims.sub).await?;
    Ok(Json(RideDetailsResponse { ride }))
}

/// Captain starts the trip with the rider's OTP
pub async fn start_ride(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Query(query): Query<StartRideQuery>,
) -> AppResult<Json<RideDetails>> {
    let ride = state
        .rides
        .start_ride(query.ride_id, &query.otp, claims.sub)
        .await?;
    Ok(Json(ride))
}

pub async fn end_ride(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<RideIdRequest>,
) -> AppResult<Json<RideDetails>> {
    let ride = state.rides.end_ride(payload.ride_id, claims.sub).await?;
    Ok(Json(ride))
}

/// Rider withdraws a ride that has not started
pub async fn cancel_ride(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<RideIdRequest>,
) -> AppResult<Json<RideResponse>> {
    let ride = state.rides.cancel_ride(payload.ride_id, claims.sub).await?;
    Ok(Json(RideResponse { ride }))
}
