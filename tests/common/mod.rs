#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use axum::body::Body;
use axum::extract::ConnectInfo;
use axum::http::{Request, Response};
use chrono::Utc;
use sea_orm::{ActiveModelTrait, DatabaseConnection, Set};
use sea_orm_migration::MigratorTrait;
use serde_json::Value;
use std::net::SocketAddr;
use tower::ServiceExt;
use uuid::Uuid;

use ride_hailing_backend::entities::captain::{self, CaptainStatus, VehicleType};
use ride_hailing_backend::entities::rider;
use ride_hailing_backend::services::geocoder::{Geocoder, Suggestion};
use ride_hailing_backend::services::router::{RouteError, RouteLeg, RouteProvider, Router};
use ride_hailing_backend::services::ChannelNotifier;
use ride_hailing_backend::utils::geo::Coordinates;
use ride_hailing_backend::utils::jwt::{create_token, ActorRole};
use ride_hailing_backend::{db, AppError, AppResult, AppState, Config};

pub const PICKUP: &str = "Connaught Place, New Delhi";
pub const DESTINATION: &str = "India Gate, New Delhi";
pub const UNKNOWN: &str = "Atlantis Central Station";

pub const PICKUP_POINT: Coordinates = Coordinates {
    lng: 77.2167,
    lat: 28.6315,
};
pub const DESTINATION_POINT: Coordinates = Coordinates {
    lng: 77.2295,
    lat: 28.6129,
};

/// 1250 m in 60 s: auto 45, car 71, bike 32
pub const ROUTE: RouteLeg = RouteLeg {
    distance_m: 1250.0,
    duration_s: 60.0,
};

/// Geocoder over a fixed address book.
pub struct FakeGeocoder {
    places: HashMap<String, Coordinates>,
    pub calls: AtomicUsize,
}

impl FakeGeocoder {
    pub fn new() -> Arc<Self> {
        let mut places = HashMap::new();
        places.insert(PICKUP.to_string(), PICKUP_POINT);
        places.insert(DESTINATION.to_string(), DESTINATION_POINT);
        Arc::new(Self {
            places,
            calls: AtomicUsize::new(0),
        })
    }
}

#[async_trait]
impl Geocoder for FakeGeocoder {
    async fn resolve(&self, address: &str) -> AppResult<Coordinates> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.places
            .get(address)
            .copied()
            .ok_or_else(|| AppError::NotFound(format!("No match for {}", address)))
    }

    async fn autocomplete(&self, input: &str) -> AppResult<Vec<Suggestion>> {
        let needle = input.to_lowercase();
        let mut matches: Vec<Suggestion> = self
            .places
            .iter()
            .filter(|(name, _)| name.to_lowercase().contains(&needle))
            .map(|(name, point)| Suggestion {
                name: name.clone(),
                coordinates: *point,
            })
            .collect();
        matches.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(matches)
    }
}

/// Always answers with the same leg.
pub struct FixedRoute(pub RouteLeg);

#[async_trait]
impl RouteProvider for FixedRoute {
    fn name(&self) -> &'static str {
        "fixed"
    }

    async fn attempt(&self, _origin: Coordinates, _destination: Coordinates) -> Result<RouteLeg, RouteError> {
        Ok(self.0)
    }
}

pub struct TestApp {
    pub state: AppState,
    pub db: DatabaseConnection,
    pub notifier: Arc<ChannelNotifier>,
    pub geocoder: Arc<FakeGeocoder>,
}

pub async fn setup_db() -> DatabaseConnection {
    let db = db::connect(&Config::test_default())
        .await
        .expect("connect to in-memory sqlite");
    migration::Migrator::up(&db, None)
        .await
        .expect("run migrations");
    db
}

pub async fn setup() -> TestApp {
    let db = setup_db().await;
    let geocoder = FakeGeocoder::new();
    let notifier = Arc::new(ChannelNotifier::new());

    let router = Router::new(geocoder.clone(), Duration::ZERO).with_provider(Arc::new(FixedRoute(ROUTE)), 0);

    let state = AppState::with_services(
        db.clone(),
        Config::test_default(),
        geocoder.clone(),
        router,
        notifier.clone(),
    );

    TestApp {
        state,
        db,
        notifier,
        geocoder,
    }
}

pub async fn seed_rider(db: &DatabaseConnection, email: &str) -> rider::Model {
    rider::ActiveModel {
        id: Set(Uuid::new_v4()),
        first_name: Set("Asha".to_string()),
        last_name: Set(Some("Verma".to_string())),
        email: Set(email.to_string()),
        password_hash: Set("unused".to_string()),
        socket_id: Set(None),
        created_at: Set(Utc::now().into()),
    }
    .insert(db)
    .await
    .expect("insert rider")
}

pub async fn seed_captain(
    db: &DatabaseConnection,
    email: &str,
    status: CaptainStatus,
    vehicle_type: VehicleType,
    at: Coordinates,
) -> captain::Model {
    captain::ActiveModel {
        id: Set(Uuid::new_v4()),
        first_name: Set("Ravi".to_string()),
        last_name: Set(Some("Kumar".to_string())),
        email: Set(email.to_string()),
        password_hash: Set("unused".to_string()),
        socket_id: Set(Some(format!("socket-{}", email))),
        status: Set(status),
        vehicle_color: Set("white".to_string()),
        vehicle_plate: Set(format!("DL-{}", Uuid::new_v4().simple())),
        vehicle_capacity: Set(3),
        vehicle_type: Set(vehicle_type),
        location_lng: Set(at.lng),
        location_lat: Set(at.lat),
        created_at: Set(Utc::now().into()),
    }
    .insert(db)
    .await
    .expect("insert captain")
}

/// A point `km` kilometers north of `origin`.
pub fn north_of(origin: Coordinates, km: f64) -> Coordinates {
    Coordinates {
        lng: origin.lng,
        lat: origin.lat + km / 111.195,
    }
}

pub fn bearer(actor_id: Uuid, role: ActorRole) -> String {
    let config = Config::test_default();
    let token = create_token(actor_id, role, &config.jwt_secret, config.jwt_expiration_hours)
        .expect("create token");
    format!("Bearer {}", token)
}

/// Runs one request through the full router. Adds the peer address the IP
/// limiters key on.
pub async fn send(state: &AppState, mut request: Request<Body>) -> Response<Body> {
    request
        .extensions_mut()
        .insert(ConnectInfo(SocketAddr::from(([127, 0, 0, 1], 4000))));

    ride_hailing_backend::routes::create_router(state.clone())
        .oneshot(request)
        .await
        .expect("router is infallible")
}

pub async fn json_body(response: Response<Body>) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("read body");
    serde_json::from_slice(&bytes).expect("json body")
}
