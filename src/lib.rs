pub mod config;
pub mod db;
pub mod entities;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod routes;
pub mod services;
pub mod utils;

use std::sync::Arc;

use sea_orm::DatabaseConnection;

pub use config::Config;
pub use error::{AppError, AppResult};

use services::router::Router as RoutePlanner;
use services::{
    Dispatcher, FareCalculator, Geocoder, LogNotifier, MapTilerGeocoder, MapboxProvider,
    Notifier, OsrmProvider, RideLifecycle,
};

#[derive(Clone)]
pub struct AppState {
    pub db: DatabaseConnection,
    pub config: Config,
    pub geocoder: Arc<dyn Geocoder>,
    pub router: Arc<RoutePlanner>,
    pub rides: Arc<RideLifecycle>,
    pub dispatcher: Arc<Dispatcher>,
}

impl AppState {
    /// Production wiring: MapTiler geocoding, OSRM with Mapbox fallback, log-only notifications.
    pub fn from_config(db: DatabaseConnection, config: Config) -> AppResult<Self> {
        let timeout = config.routing_timeout();

        let geocoder: Arc<dyn Geocoder> = Arc::new(MapTilerGeocoder::new(
            config.maptiler_base_url.clone(),
            config.maptiler_api_key.clone(),
            timeout,
        )?);
        let primary = Arc::new(OsrmProvider::new(config.osrm_base_url.clone(), timeout)?);
        let secondary = Arc::new(MapboxProvider::new(
            config.mapbox_base_url.clone(),
            config.mapbox_token.clone(),
            timeout,
        )?);

        let router = RoutePlanner::primary_with_fallback(
            geocoder.clone(),
            primary,
            secondary,
            config.routing_retry_backoff(),
        );

        Ok(Self::with_services(
            db,
            config,
            geocoder,
            router,
            Arc::new(LogNotifier),
        ))
    }

    pub fn with_services(
        db: DatabaseConnection,
        config: Config,
        geocoder: Arc<dyn Geocoder>,
        router: RoutePlanner,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        let router = Arc::new(router);
        let rides = Arc::new(RideLifecycle::new(
            db.clone(),
            FareCalculator::new(router.clone()),
            notifier.clone(),
        ));
        let dispatcher = Arc::new(Dispatcher::new(
            db.clone(),
            geocoder.clone(),
            notifier,
            config.dispatch_radius_km,
        ));

        Self {
            db,
            config,
            geocoder,
            router,
            rides,
            dispatcher,
        }
    }
}
