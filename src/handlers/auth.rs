use axum::{extract::State, http::StatusCode, Extension, Json};
use axum_extra::{
    headers::{authorization::Bearer, Authorization},
    TypedHeader,
};
use chrono::Utc;
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::entities::{blacklist_token, rider};
use crate::error::{AppError, AppResult};
use crate::utils::jwt::{create_token, ActorRole, Claims};
use crate::utils::password::{hash_password, verify_password};
use crate::AppState;

#[derive(Debug, Deserialize, Validate)]
pub struct FullName {
    #[validate(length(min = 3, message = "firstname must be at least 3 characters"))]
    pub firstname: String,
    #[validate(length(min = 3, message = "lastname must be at least 3 characters"))]
    pub lastname: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(nested)]
    pub fullname: FullName,
    #[validate(email(message = "Please provide a valid email"))]
    pub email: String,
    #[validate(length(min = 6, message = "password must be at least 6 characters"))]
    pub password: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(email(message = "Please provide a valid email"))]
    pub email: String,
    #[validate(length(min = 6, message = "password must be at least 6 characters"))]
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub token: String,
    pub user: rider::Model,
}

#[derive(Debug, Serialize)]
pub struct ProfileResponse {
    pub user: rider::Model,
}

pub(crate) fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Adds the token to the blacklist; revoking twice is not an error.
pub(crate) async fn revoke_token(db: &DatabaseConnection, token: &str) -> AppResult<()> {
    let existing = blacklist_token::Entity::find()
        .filter(blacklist_token::Column::Token.eq(token))
        .one(db)
        .await?;

    if existing.is_none() {
        blacklist_token::ActiveModel {
            id: Set(Uuid::new_v4()),
            token: Set(token.to_string()),
            created_at: Set(Utc::now().into()),
        }
        .insert(db)
        .await?;
    }

    Ok(())
}

/// Register a new rider account
pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> AppResult<(StatusCode, Json<AuthResponse>)> {
    payload.validate()?;
    let email = normalize_email(&payload.email);

    let existing = rider::Entity::find()
        .filter(rider::Column::Email.eq(&email))
        .one(&state.db)
        .await?;

    if existing.is_some() {
        return Err(AppError::Conflict(
            "User with this email already exists".to_string(),
        ));
    }

    let new_rider = rider::ActiveModel {
        id: Set(Uuid::new_v4()),
        first_name: Set(payload.fullname.firstname.clone()),
        last_name: Set(payload.fullname.lastname.clone()),
        email: Set(email),
        password_hash: Set(hash_password(&payload.password)?),
        socket_id: Set(None),
        created_at: Set(Utc::now().into()),
    };

    let user = new_rider.insert(&state.db).await?;
    tracing::info!(rider_id = %user.id, "Rider registered");

    let token = create_token(
        user.id,
        ActorRole::Rider,
        &state.config.jwt_secret,
        state.config.jwt_expiration_hours,
    )?;

    Ok((StatusCode::CREATED, Json(AuthResponse { token, user })))
}

/// Login with email and password
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> AppResult<Json<AuthResponse>> {
    payload.validate()?;

    let user = rider::Entity::find()
        .filter(rider::Column::Email.eq(normalize_email(&payload.email)))
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::Unauthorized("Invalid email or password".to_string()))?;

    if !verify_password(&payload.password, &user.password_hash)? {
        return Err(AppError::Unauthorized("Invalid email or password".to_string()));
    }

    let token = create_token(
        user.id,
        ActorRole::Rider,
        &state.config.jwt_secret,
        state.config.jwt_expiration_hours,
    )?;

    Ok(Json(AuthResponse { token, user }))
}

/// Profile of the logged-in rider
pub async fn profile(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> AppResult<Json<ProfileResponse>> {
    let user = rider::Entity::find_by_id(claims.sub)
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::Unauthorized("User not found".to_string()))?;

    Ok(Json(ProfileResponse { user }))
}

/// Revoke the presented token
pub async fn logout(
    State(state): State<AppState>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
) -> AppResult<Json<serde_json::Value>> {
    revoke_token(&state.db, auth.token()).await?;
    Ok(Json(serde_json::json!({ "message": "Logged out successfully" })))
}
