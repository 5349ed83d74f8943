use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};
use crate::utils::geo::Coordinates;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Suggestion {
    pub name: String,
    pub coordinates: Coordinates,
}

/// Address lookup against an external geocoding provider.
#[async_trait]
pub trait Geocoder: Send + Sync {
    /// Coordinates of the provider's first match. `NotFound` when nothing matches,
    /// `Provider` on transport or HTTP failure.
    async fn resolve(&self, address: &str) -> AppResult<Coordinates>;

    /// Candidates in provider order; empty when nothing matches.
    async fn autocomplete(&self, input: &str) -> AppResult<Vec<Suggestion>>;
}

#[derive(Debug, Deserialize)]
struct FeatureCollection {
    #[serde(default)]
    features: Vec<Feature>,
}

#[derive(Debug, Deserialize)]
struct Feature {
    #[serde(default)]
    place_name: Option<String>,
    #[serde(default)]
    text: Option<String>,
    geometry: Geometry,
}

#[derive(Debug, Deserialize)]
struct Geometry {
    coordinates: Vec<f64>, // [longitude, latitude]
}

impl Feature {
    fn coordinates(&self) -> AppResult<Coordinates> {
        match self.geometry.coordinates.as_slice() {
            [lng, lat, ..] => Coordinates::new(*lng, *lat)
                .map_err(|e| AppError::Provider(format!("Geocoder returned bad point: {}", e))),
            _ => Err(AppError::Provider(
                "Geocoder returned a feature without coordinates".to_string(),
            )),
        }
    }
}

/// MapTiler forward geocoding (`/geocoding/{query}.json`).
pub struct MapTilerGeocoder {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl MapTilerGeocoder {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>, timeout: Duration) -> AppResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::Internal(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
        })
    }

    async fn search(&self, query: &str, autocomplete: bool) -> AppResult<FeatureCollection> {
        let url = format!(
            "{}/geocoding/{}.json",
            self.base_url,
            urlencoding::encode(query)
        );

        let mut request = self.client.get(&url).query(&[("key", self.api_key.as_str())]);
        if autocomplete {
            request = request.query(&[("autocomplete", "true")]);
        }

        let response = request.send().await.map_err(|e| {
            tracing::warn!(error = %e, "Geocoding request failed");
            AppError::Provider(format!("Geocoding request failed: {}", e))
        })?;

        let status = response.status();
        if !status.is_success() {
            tracing::warn!(status = %status, "Geocoding provider returned an error status");
            return Err(AppError::Provider(format!(
                "Geocoding provider returned {}",
                status
            )));
        }

        response
            .json::<FeatureCollection>()
            .await
            .map_err(|e| AppError::Provider(format!("Failed to parse geocoding response: {}", e)))
    }
}

#[async_trait]
impl Geocoder for MapTilerGeocoder {
    async fn resolve(&self, address: &str) -> AppResult<Coordinates> {
        if address.trim().is_empty() {
            return Err(AppError::BadRequest("Address is required".to_string()));
        }

        let collection = self.search(address, false).await?;
        let feature = collection.features.first().ok_or_else(|| {
            tracing::debug!(address, "No geocoding match");
            AppError::NotFound("No coordinates found for the given address".to_string())
        })?;

        let coordinates = feature.coordinates()?;
        tracing::debug!(address, lng = coordinates.lng, lat = coordinates.lat, "Address resolved");
        Ok(coordinates)
    }

    async fn autocomplete(&self, input: &str) -> AppResult<Vec<Suggestion>> {
        if input.trim().is_empty() {
            return Err(AppError::BadRequest("Query is required".to_string()));
        }

        let collection = self.search(input, true).await?;

        collection
            .features
            .iter()
            .map(|feature| {
                Ok(Suggestion {
                    name: feature
                        .place_name
                        .clone()
                        .or_else(|| feature.text.clone())
                        .unwrap_or_default(),
                    coordinates: feature.coordinates()?,
                })
            })
            .collect()
    }
}
