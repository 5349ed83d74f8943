use axum::{
    body::Body,
    extract::{ConnectInfo, Request},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;
use tower_governor::{governor::GovernorConfigBuilder, GovernorError, GovernorLayer};

use crate::error::AppError;

/// Type alias for the IP-keyed governor layers
pub type GlobalGovernorLayer = GovernorLayer<
    tower_governor::key_extractor::PeerIpKeyExtractor,
    governor::middleware::NoOpMiddleware<governor::clock::QuantaInstant>,
    Body,
>;

fn ip_governor(per_ms: u64, burst: u32) -> GlobalGovernorLayer {
    let config = Arc::new(
        GovernorConfigBuilder::default()
            .per_millisecond(per_ms)
            .burst_size(burst)
            .finish()
            .expect("rate limit configuration must be non-zero"),
    );

    GovernorLayer::new(config).error_handler(rate_limit_error_handler)
}

/// Renders governor rejections with the same JSON body as every other error.
pub fn rate_limit_error_handler(err: GovernorError) -> Response<Body> {
    let error = match err {
        GovernorError::TooManyRequests { wait_time, .. } => AppError::RateLimited(wait_time),
        GovernorError::UnableToExtractKey => {
            AppError::Unauthorized("Authentication required".to_string())
        }
        GovernorError::Other { code, msg, .. } => AppError::Internal(format!(
            "Rate limiter failed with {}: {}",
            code,
            msg.unwrap_or_default()
        )),
    };

    error.into_response()
}

/// Outermost per-IP limiter: bursts of 1000, refilled every 60ms.
pub fn create_global_governor() -> GlobalGovernorLayer {
    ip_governor(60, 1000)
}

/// Stricter per-IP limiter for register, login and the public captain list.
pub fn create_public_governor() -> GlobalGovernorLayer {
    ip_governor(600, 100)
}

/// Access log. Throttled and failed requests are logged at `warn`.
pub async fn log_request(
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    request: Request,
    next: Next,
) -> Response {
    let started = Instant::now();
    let method = request.method().clone();
    let path = request.uri().path().to_owned();

    let response = next.run(request).await;
    let status = response.status();
    let latency_ms = started.elapsed().as_millis() as u64;

    match status {
        StatusCode::TOO_MANY_REQUESTS => tracing::warn!(
            client_ip = %addr.ip(),
            %method,
            path = %path,
            latency_ms,
            "Request throttled by rate limiter"
        ),
        s if s.is_server_error() || s.is_client_error() => tracing::warn!(
            client_ip = %addr.ip(),
            %method,
            path = %path,
            status = s.as_u16(),
            latency_ms,
            "Request failed"
        ),
        s => tracing::debug!(
            client_ip = %addr.ip(),
            %method,
            path = %path,
            status = s.as_u16(),
            latency_ms,
            "Request served"
        ),
    }

    response
}
