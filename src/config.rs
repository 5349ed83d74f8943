use std::env;
use std::time::Duration;

#[derive(Clone)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    pub jwt_expiration_hours: i64,
    pub server_host: String,
    pub server_port: u16,
    pub maptiler_api_key: String,
    pub maptiler_base_url: String,
    pub osrm_base_url: String,
    pub mapbox_token: Option<String>,
    pub mapbox_base_url: String,
    pub routing_timeout_secs: u64,
    pub routing_retry_backoff_ms: u64,
    pub dispatch_radius_km: f64,
}

impl Config {
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        Self {
            database_url: env::var("DATABASE_URL")
                .expect("DATABASE_URL must be set"),
            jwt_secret: env::var("JWT_SECRET")
                .expect("JWT_SECRET must be set"),
            jwt_expiration_hours: env::var("JWT_EXPIRATION_HOURS")
                .unwrap_or_else(|_| "24".to_string())
                .parse()
                .expect("JWT_EXPIRATION_HOURS must be a number"),
            server_host: env::var("SERVER_HOST")
                .unwrap_or_else(|_| "0.0.0.0".to_string()),
            server_port: env::var("SERVER_PORT")
                .unwrap_or_else(|_| "3000".to_string())
                .parse()
                .expect("SERVER_PORT must be a number"),
            maptiler_api_key: env::var("MAPTILER_API_KEY")
                .expect("MAPTILER_API_KEY must be set"),
            maptiler_base_url: env::var("MAPTILER_BASE_URL")
                .unwrap_or_else(|_| "https://api.maptiler.com".to_string()),
            osrm_base_url: env::var("OSRM_BASE_URL")
                .unwrap_or_else(|_| "https://router.project-osrm.org".to_string()),
            mapbox_token: env::var("MAPBOX_TOKEN").ok().filter(|t| !t.is_empty()),
            mapbox_base_url: env::var("MAPBOX_BASE_URL")
                .unwrap_or_else(|_| "https://api.mapbox.com".to_string()),
            routing_timeout_secs: env::var("ROUTING_TIMEOUT_SECS")
                .unwrap_or_else(|_| "10".to_string())
                .parse()
                .expect("ROUTING_TIMEOUT_SECS must be a number"),
            routing_retry_backoff_ms: env::var("ROUTING_RETRY_BACKOFF_MS")
                .unwrap_or_else(|_| "2000".to_string())
                .parse()
                .expect("ROUTING_RETRY_BACKOFF_MS must be a number"),
            dispatch_radius_km: env::var("DISPATCH_RADIUS_KM")
                .unwrap_or_else(|_| "5".to_string())
                .parse()
                .expect("DISPATCH_RADIUS_KM must be a number"),
        }
    }

    /// Settings for tests; never reaches real providers.
    pub fn test_default() -> Self {
        Self {
            database_url: "sqlite::memory:".to_string(),
            jwt_secret: "test-secret".to_string(),
            jwt_expiration_hours: 1,
            server_host: "127.0.0.1".to_string(),
            server_port: 0,
            maptiler_api_key: "test-key".to_string(),
            maptiler_base_url: "http://127.0.0.1:9".to_string(),
            osrm_base_url: "http://127.0.0.1:9".to_string(),
            mapbox_token: None,
            mapbox_base_url: "http://127.0.0.1:9".to_string(),
            routing_timeout_secs: 1,
            routing_retry_backoff_ms: 0,
            dispatch_radius_km: 5.0,
        }
    }

    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.server_host, self.server_port)
    }

    pub fn routing_timeout(&self) -> Duration {
        Duration::from_secs(self.routing_timeout_secs)
    }

    pub fn routing_retry_backoff(&self) -> Duration {
        Duration::from_millis(self.routing_retry_backoff_ms)
    }
}
