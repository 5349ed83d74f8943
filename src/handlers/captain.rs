use axum::{extract::State, http::StatusCode, Extension, Json};
use axum_extra::{
    headers::{authorization::Bearer, Authorization},
    TypedHeader,
};
use chrono::Utc;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, Set};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::entities::captain::{self, CaptainStatus, VehicleType};
use crate::error::{AppError, AppResult};
use crate::handlers::auth::{normalize_email, revoke_token, FullName, LoginRequest};
use crate::services::captain_locator;
use crate::utils::geo::Coordinates;
use crate::utils::jwt::{create_token, ActorRole, Claims};
use crate::utils::password::{hash_password, verify_password};
use crate::AppState;

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct VehicleRequest {
    #[validate(length(min = 3, message = "color must be at least 3 characters"))]
    pub color: String,
    #[validate(length(min = 3, message = "plate must be at least 3 characters"))]
    pub plate: String,
    #[validate(range(min = 1, message = "capacity must be at least 1"))]
    pub capacity: i32,
    pub vehicle_type: VehicleType,
}

/// Range-checked through `Coordinates::new`.
#[derive(Debug, Deserialize)]
pub struct LocationRequest {
    pub lng: f64,
    pub lat: f64,
}

#[derive(Debug, Deserialize, Validate)]
pub struct RegisterCaptainRequest {
    #[validate(nested)]
    pub fullname: FullName,
    #[validate(email(message = "Please provide a valid email"))]
    pub email: String,
    #[validate(length(min = 6, message = "password must be at least 6 characters"))]
    pub password: String,
    #[validate(nested)]
    pub vehicle: VehicleRequest,
    pub location: LocationRequest,
}

#[derive(Debug, Serialize)]
pub struct CaptainAuthResponse {
    pub token: String,
    pub captain: captain::Model,
}

#[derive(Debug, Serialize)]
pub struct CaptainProfileResponse {
    pub captain: captain::Model,
}

#[derive(Debug, Deserialize)]
pub struct StatusRequest {
    pub status: CaptainStatus,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionRequest {
    pub socket_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct GeoPoint {
    #[serde(rename = "type")]
    pub kind: &'static str,
    /// [lng, lat]
    pub coordinates: [f64; 2],
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActiveCaptainInfo {
    pub id: Uuid,
    pub name: String,
    pub location: GeoPoint,
    pub vehicle_type: VehicleType,
    pub socket_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ActiveCaptainsResponse {
    pub count: usize,
    pub captains: Vec<ActiveCaptainInfo>,
}

/// Register a new captain with their vehicle
pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterCaptainRequest>,
) -> AppResult<(StatusCode, Json<CaptainAuthResponse>)> {
    payload.validate()?;
    let email = normalize_email(&payload.email);
    let location = Coordinates::new(payload.location.lng, payload.location.lat)?;

    let existing = captain::Entity::find()
        .filter(captain::Column::Email.eq(&email))
        .one(&state.db)
        .await?;
    if existing.is_some() {
        return Err(AppError::Conflict(
            "Captain with this email already exists".to_string(),
        ));
    }

    let plate_taken = captain::Entity::find()
        .filter(captain::Column::VehiclePlate.eq(&payload.vehicle.plate))
        .one(&state.db)
        .await?;
    if plate_taken.is_some() {
        return Err(AppError::Conflict(
            "Vehicle plate already registered".to_string(),
        ));
    }

    let new_captain = captain::ActiveModel {
        id: Set(Uuid::new_v4()),
        first_name: Set(payload.fullname.firstname.clone()),
        last_name: Set(payload.fullname.lastname.clone()),
        email: Set(email),
        password_hash: Set(hash_password(&payload.password)?),
        socket_id: Set(None),
        status: Set(CaptainStatus::Inactive),
        vehicle_color: Set(payload.vehicle.color.clone()),
        vehicle_plate: Set(payload.vehicle.plate.clone()),
        vehicle_capacity: Set(payload.vehicle.capacity),
        vehicle_type: Set(payload.vehicle.vehicle_type),
        location_lng: Set(location.lng),
        location_lat: Set(location.lat),
        created_at: Set(Utc::now().into()),
    };

    let captain = new_captain.insert(&state.db).await?;
    tracing::info!(captain_id = %captain.id, vehicle_type = ?captain.vehicle_type, "Captain registered");

    let token = create_token(
        captain.id,
        ActorRole::Captain,
        &state.config.jwt_secret,
        state.config.jwt_expiration_hours,
    )?;

    Ok((StatusCode::CREATED, Json(CaptainAuthResponse { token, captain })))
}

/// Login with email and password
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> AppResult<Json<CaptainAuthResponse>> {
    payload.validate()?;

    let captain = captain::Entity::find()
        .filter(captain::Column::Email.eq(normalize_email(&payload.email)))
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::Unauthorized("Invalid email or password".to_string()))?;

    if !verify_password(&payload.password, &captain.password_hash)? {
        return Err(AppError::Unauthorized("Invalid email or password".to_string()));
    }

    let token = create_token(
        captain.id,
        ActorRole::Captain,
        &state.config.jwt_secret,
        state.config.jwt_expiration_hours,
    )?;

    Ok(Json(CaptainAuthResponse { token, captain }))
}

async fn load_captain(state: &AppState, claims: &Claims) -> AppResult<captain::Model> {
    captain::Entity::find_by_id(claims.sub)
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::Unauthorized("Captain not found".to_string()))
}

/// Profile of the logged-in captain
pub async fn profile(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> AppResult<Json<CaptainProfileResponse>> {
    let captain = load_captain(&state, &claims).await?;
    Ok(Json(CaptainProfileResponse { captain }))
}

/// Revoke the presented token
pub async fn logout(
    State(state): State<AppState>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
) -> AppResult<Json<serde_json::Value>> {
    revoke_token(&state.db, auth.token()).await?;
    Ok(Json(serde_json::json!({ "message": "Logged out successfully" })))
}

/// Move the captain's current location
pub async fn update_location(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<LocationRequest>,
) -> AppResult<Json<CaptainProfileResponse>> {
    let location = Coordinates::new(payload.lng, payload.lat)?;
    let captain = load_captain(&state, &claims).await?;

    let mut active: captain::ActiveModel = captain.into();
    active.location_lng = Set(location.lng);
    active.location_lat = Set(location.lat);
    let captain = active.update(&state.db).await?;

    tracing::debug!(captain_id = %captain.id, lng = location.lng, lat = location.lat, "Captain moved");
    Ok(Json(CaptainProfileResponse { captain }))
}

/// Go on or off duty
pub async fn update_status(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<StatusRequest>,
) -> AppResult<Json<CaptainProfileResponse>> {
    let captain = load_captain(&state, &claims).await?;

    let mut active: captain::ActiveModel = captain.into();
    active.status = Set(payload.status);
    let captain = active.update(&state.db).await?;

    tracing::info!(captain_id = %captain.id, status = ?captain.status, "Captain status changed");
    Ok(Json(CaptainProfileResponse { captain }))
}

/// Attach or clear the live-connection handle. Clearing it takes the captain off duty.
pub async fn update_connection(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<ConnectionRequest>,
) -> AppResult<Json<CaptainProfileResponse>> {
    let captain = load_captain(&state, &claims).await?;
    let socket_id = payload.socket_id.filter(|s| !s.is_empty());

    let mut active: captain::ActiveModel = captain.into();
    if socket_id.is_none() {
        active.status = Set(CaptainStatus::Inactive);
    }
    active.socket_id = Set(socket_id);
    let captain = active.update(&state.db).await?;

    tracing::info!(
        captain_id = %captain.id,
        connected = captain.socket_id.is_some(),
        "Captain connection updated"
    );
    Ok(Json(CaptainProfileResponse { captain }))
}

/// Every captain currently on duty with their position
pub async fn list_active(
    State(state): State<AppState>,
) -> AppResult<Json<ActiveCaptainsResponse>> {
    let captains = captain_locator::list_active(&state.db).await?;

    let captains: Vec<ActiveCaptainInfo> = captains
        .into_iter()
        .map(|c| ActiveCaptainInfo {
            id: c.id,
            name: c.full_name(),
            location: GeoPoint {
                kind: "Point",
                coordinates: [c.location_lng, c.location_lat],
            },
            vehicle_type: c.vehicle_type,
            socket_id: c.socket_id,
        })
        .collect();

    Ok(Json(ActiveCaptainsResponse {
        count: captains.len(),
        captains,
    }))
}
