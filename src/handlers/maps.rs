use axum::{
    extract::{Query, State},
    Json,
};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::error::{AppError, AppResult};
use crate::services::geocoder::Suggestion;
use crate::services::router::DistanceTime;
use crate::utils::geo::Coordinates;
use crate::AppState;

#[derive(Debug, Deserialize, Validate)]
pub struct CoordinatesQuery {
    #[validate(length(min = 3, message = "address must be at least 3 characters"))]
    pub address: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct DistanceTimeQuery {
    #[validate(length(min = 3, message = "origin must be at least 3 characters"))]
    pub origin: String,
    #[validate(length(min = 3, message = "destination must be at least 3 characters"))]
    pub destination: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct SuggestionsQuery {
    #[validate(length(min = 3, message = "input must be at least 3 characters"))]
    pub input: String,
}

#[derive(Debug, Serialize)]
pub struct SuggestionsResponse {
    pub status: &'static str,
    pub suggestions: Vec<Suggestion>,
}

/// Resolve a free-text address to a point
pub async fn get_coordinates(
    State(state): State<AppState>,
    Query(query): Query<CoordinatesQuery>,
) -> AppResult<Json<Coordinates>> {
    query.validate()?;

    let coordinates = state.geocoder.resolve(&query.address).await.map_err(|e| match e {
        AppError::NotFound(_) => AppError::NotFound("Coordinates not found".to_string()),
        other => other,
    })?;

    Ok(Json(coordinates))
}

/// Driving distance and time between two addresses
pub async fn get_distance_time(
    State(state): State<AppState>,
    Query(query): Query<DistanceTimeQuery>,
) -> AppResult<Json<DistanceTime>> {
    query.validate()?;
    let route = state
        .router
        .get_distance_time(&query.origin, &query.destination)
        .await?;
    Ok(Json(route))
}

pub async fn get_suggestions(
    State(state): State<AppState>,
    Query(query): Query<SuggestionsQuery>,
) -> AppResult<Json<SuggestionsResponse>> {
    query.validate()?;
    let suggestions = state.geocoder.autocomplete(&query.input).await?;

    Ok(Json(SuggestionsResponse {
        status: "OK",
        suggestions,
    }))
}
