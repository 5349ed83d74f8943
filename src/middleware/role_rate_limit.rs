use axum::http::Request;
use std::sync::Arc;
use tower_governor::{
    governor::GovernorConfigBuilder,
    key_extractor::KeyExtractor,
    GovernorError, GovernorLayer,
};
use uuid::Uuid;

use crate::middleware::rate_limit::rate_limit_error_handler;
use crate::utils::jwt::Claims;

/// Keys the limiter on the authenticated actor id set by `auth_middleware`
#[derive(Debug, Clone, Copy)]
pub struct ActorIdExtractor;

impl KeyExtractor for ActorIdExtractor {
    type Key = Uuid;

    fn extract<T>(&self, req: &Request<T>) -> Result<Self::Key, GovernorError> {
        let claims = req
            .extensions()
            .get::<Claims>()
            .ok_or(GovernorError::UnableToExtractKey)?;

        Ok(claims.sub)
    }
}

pub type RoleGovernorLayer = GovernorLayer<
    ActorIdExtractor,
    governor::middleware::NoOpMiddleware<governor::clock::QuantaInstant>,
    axum::body::Body,
>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateLimitedRole {
    Rider,
    Captain,
}

impl RateLimitedRole {
    /// (refill period in ms, burst). Captains ping their location often.
    fn quota(self) -> (u64, u32) {
        match self {
            RateLimitedRole::Captain => (120, 500),
            RateLimitedRole::Rider => (600, 100),
        }
    }
}

pub fn create_role_governor(role: RateLimitedRole) -> RoleGovernorLayer {
    let (per_ms, burst) = role.quota();

    let config = Arc::new(
        GovernorConfigBuilder::default()
            .per_millisecond(per_ms)
            .burst_size(burst)
            .key_extractor(ActorIdExtractor)
            .finish()
            .expect("rate limit configuration must be non-zero"),
    );

    GovernorLayer::new(config).error_handler(rate_limit_error_handler)
}
