//! Distance and duration between two addresses, resolved through an ordered
//! chain of routing providers.
//!
//! Each stage re-resolves both addresses, then attempts its provider. A
//! transient failure is retried after a fixed backoff while the stage has
//! retries left; anything else advances to the next stage. The primary stage
//! gets exactly one retry and the secondary none.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};
use crate::services::geocoder::Geocoder;
use crate::utils::format::{format_distance, format_duration};
use crate::utils::geo::Coordinates;

/// Raw provider answer: meters and seconds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RouteLeg {
    pub distance_m: f64,
    pub duration_s: f64,
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum RouteError {
    /// Transport failure, timeout or HTTP error status. Worth retrying.
    #[error("transient routing failure: {0}")]
    Transient(String),
    /// Provider answered but had no usable route, or is not configured.
    #[error("routing rejected: {0}")]
    Rejected(String),
}

#[async_trait]
pub trait RouteProvider: Send + Sync {
    fn name(&self) -> &'static str;

    async fn attempt(
        &self,
        origin: Coordinates,
        destination: Coordinates,
    ) -> Result<RouteLeg, RouteError>;
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Measure {
    pub text: String,
    pub value: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DistanceTime {
    /// Meters
    pub distance: Measure,
    /// Seconds
    pub duration: Measure,
    pub provider: String,
}

impl DistanceTime {
    pub fn from_leg(leg: RouteLeg, provider: &str) -> Self {
        Self {
            distance: Measure {
                text: format_distance(leg.distance_m),
                value: leg.distance_m.round() as i64,
            },
            duration: Measure {
                text: format_duration(leg.duration_s),
                value: leg.duration_s.round() as i64,
            },
            provider: provider.to_string(),
        }
    }
}

struct Stage {
    provider: Arc<dyn RouteProvider>,
    retries: u32,
}

pub struct Router {
    geocoder: Arc<dyn Geocoder>,
    stages: Vec<Stage>,
    backoff: Duration,
}

impl Router {
    pub fn new(geocoder: Arc<dyn Geocoder>, backoff: Duration) -> Self {
        Self {
            geocoder,
            stages: Vec::new(),
            backoff,
        }
    }

    /// Appends a provider to the chain with the given number of retries on transient failure.
    pub fn with_provider(mut self, provider: Arc<dyn RouteProvider>, retries: u32) -> Self {
        self.stages.push(Stage { provider, retries });
        self
    }

    /// Primary with one retry, secondary as a single fallback attempt.
    pub fn primary_with_fallback(
        geocoder: Arc<dyn Geocoder>,
        primary: Arc<dyn RouteProvider>,
        secondary: Arc<dyn RouteProvider>,
        backoff: Duration,
    ) -> Self {
        Self::new(geocoder, backoff)
            .with_provider(primary, 1)
            .with_provider(secondary, 0)
    }

    pub async fn get_distance_time(&self, origin: &str, destination: &str) -> AppResult<DistanceTime> {
        if origin.trim().is_empty() || destination.trim().is_empty() {
            return Err(AppError::BadRequest(
                "Origin and destination are required".to_string(),
            ));
        }

        let mut failures = Vec::with_capacity(self.stages.len());

        for stage in &self.stages {
            let name = stage.provider.name();
            match self.run_stage(stage, origin, destination).await {
                Ok(leg) => {
                    tracing::debug!(
                        provider = name,
                        distance_m = leg.distance_m,
                        duration_s = leg.duration_s,
                        "Route resolved"
                    );
                    return Ok(DistanceTime::from_leg(leg, name));
                }
                Err(reason) => {
                    tracing::warn!(provider = name, reason = %reason, "Routing provider exhausted, advancing");
                    failures.push(format!("{}: {}", name, reason));
                }
            }
        }

        Err(AppError::Provider(format!(
            "All routing providers failed to calculate distance/time ({})",
            failures.join("; ")
        )))
    }

    async fn run_stage(&self, stage: &Stage, origin: &str, destination: &str) -> Result<RouteLeg, String> {
        let origin = self.geocoder.resolve(origin).await.map_err(|e| e.to_string())?;
        let destination = self
            .geocoder
            .resolve(destination)
            .await
            .map_err(|e| e.to_string())?;

        let mut attempt = 0;
        loop {
            match stage.provider.attempt(origin, destination).await {
                Ok(leg) => return Ok(leg),
                Err(RouteError::Transient(reason)) if attempt < stage.retries => {
                    attempt += 1;
                    tracing::warn!(
                        provider = stage.provider.name(),
                        attempt,
                        reason = %reason,
                        "Routing request failed, retrying"
                    );
                    tokio::time::sleep(self.backoff).await;
                }
                Err(err) => return Err(err.to_string()),
            }
        }
    }
}

#[derive(Debug, Deserialize)]
struct DirectionsResponse {
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    routes: Vec<DirectionsRoute>,
}

#[derive(Debug, Deserialize)]
struct DirectionsRoute {
    distance: f64,
    duration: f64,
}

fn build_client(timeout: Duration) -> AppResult<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| AppError::Internal(format!("Failed to create HTTP client: {}", e)))
}

async fn fetch_directions(request: reqwest::RequestBuilder) -> Result<DirectionsResponse, RouteError> {
    let response = request
        .send()
        .await
        .map_err(|e| RouteError::Transient(e.to_string()))?;

    let status = response.status();
    if !status.is_success() {
        return Err(RouteError::Transient(format!("HTTP {}", status)));
    }

    response
        .json::<DirectionsResponse>()
        .await
        .map_err(|e| RouteError::Rejected(format!("unreadable response: {}", e)))
}

fn coordinate_pair(origin: Coordinates, destination: Coordinates) -> String {
    format!(
        "{},{};{},{}",
        origin.lng, origin.lat, destination.lng, destination.lat
    )
}

/// Public OSRM demo server or any self-hosted OSRM instance.
pub struct OsrmProvider {
    client: reqwest::Client,
    base_url: String,
}

impl OsrmProvider {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> AppResult<Self> {
        Ok(Self {
            client: build_client(timeout)?,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl RouteProvider for OsrmProvider {
    fn name(&self) -> &'static str {
        "OSRM"
    }

    async fn attempt(&self, origin: Coordinates, destination: Coordinates) -> Result<RouteLeg, RouteError> {
        let url = format!(
            "{}/route/v1/driving/{}",
            self.base_url,
            coordinate_pair(origin, destination)
        );

        let body = fetch_directions(
            self.client
                .get(&url)
                .query(&[("overview", "simplified"), ("geometries", "geojson")]),
        )
        .await?;

        if body.code.as_deref() != Some("Ok") {
            return Err(RouteError::Rejected(format!(
                "OSRM answered with code {:?}",
                body.code
            )));
        }

        body.routes
            .first()
            .map(|route| RouteLeg {
                distance_m: route.distance,
                duration_s: route.duration,
            })
            .ok_or_else(|| RouteError::Rejected("No route found from OSRM".to_string()))
    }
}

/// Mapbox Directions API.
pub struct MapboxProvider {
    client: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

impl MapboxProvider {
    pub fn new(base_url: impl Into<String>, token: Option<String>, timeout: Duration) -> AppResult<Self> {
        Ok(Self {
            client: build_client(timeout)?,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token,
        })
    }
}

#[async_trait]
impl RouteProvider for MapboxProvider {
    fn name(&self) -> &'static str {
        "Mapbox"
    }

    async fn attempt(&self, origin: Coordinates, destination: Coordinates) -> Result<RouteLeg, RouteError> {
        let token = self
            .token
            .as_deref()
            .ok_or_else(|| RouteError::Rejected("MAPBOX_TOKEN is not configured".to_string()))?;

        let url = format!(
            "{}/directions/v5/mapbox/driving/{}",
            self.base_url,
            coordinate_pair(origin, destination)
        );

        let body = fetch_directions(
            self.client
                .get(&url)
                .query(&[("geometries", "geojson"), ("access_token", token)]),
        )
        .await?;

        body.routes
            .first()
            .map(|route| RouteLeg {
                distance_m: route.distance,
                duration_s: route.duration,
            })
            .ok_or_else(|| RouteError::Rejected("No route found from Mapbox".to_string()))
    }
}
