use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use axum_extra::{
    headers::{authorization::Bearer, Authorization},
    TypedHeader,
};
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter};

use crate::entities::blacklist_token;
use crate::error::{AppError, AppResult};
use crate::utils::jwt::{verify_token, ActorRole, Claims};
use crate::AppState;

/// Extract and validate JWT token from Authorization header
pub async fn auth_middleware(
    State(state): State<AppState>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    mut request: Request,
    next: Next,
) -> AppResult<Response> {
    let revoked = blacklist_token::Entity::find()
        .filter(blacklist_token::Column::Token.eq(auth.token()))
        .one(&state.db)
        .await?;

    if revoked.is_some() {
        return Err(AppError::Unauthorized("Token has been revoked".to_string()));
    }

    let claims = verify_token(auth.token(), &state.config.jwt_secret)?;
    request.extensions_mut().insert(claims);
    Ok(next.run(request).await)
}

fn require_role(request: &Request, role: ActorRole) -> AppResult<()> {
    let claims = request
        .extensions()
        .get::<Claims>()
        .ok_or_else(|| AppError::Unauthorized("No authentication found".to_string()))?;

    if claims.role != role {
        return Err(AppError::Forbidden(format!("{:?} access required", role)));
    }

    Ok(())
}

/// Require rider role
pub async fn require_rider(request: Request, next: Next) -> AppResult<Response> {
    require_role(&request, ActorRole::Rider)?;
    Ok(next.run(request).await)
}

/// Require captain role
pub async fn require_captain(request: Request, next: Next) -> AppResult<Response> {
    require_role(&request, ActorRole::Captain)?;
    Ok(next.run(request).await)
}
