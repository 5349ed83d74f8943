use axum::{
    middleware,
    routing::{get, patch, post},
    Router,
};

use crate::handlers::{auth, captain, maps, ride};
use crate::middleware::auth::{auth_middleware, require_captain, require_rider};
use crate::middleware::rate_limit::create_public_governor;
use crate::middleware::role_rate_limit::{create_role_governor, RateLimitedRole};
use crate::AppState;

pub fn create_router(state: AppState) -> Router {
    let rider_governor = create_role_governor(RateLimitedRole::Rider);
    let captain_governor = create_role_governor(RateLimitedRole::Captain);
    let public_governor = create_public_governor();

    // Public account routes
    let rider_public = Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login))
        .layer(public_governor.clone());

    let captain_public = Router::new()
        .route("/register", post(captain::register))
        .route("/login", post(captain::login))
        .route("/active", get(captain::list_active))
        .layer(public_governor);

    // Rider routes (requires auth + rider role)
    let rider_routes = Router::new()
        .route("/profile", get(auth::profile))
        .route("/logout", get(auth::logout))
        .layer(rider_governor.clone())
        .layer(middleware::from_fn(require_rider))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    // Captain routes (requires auth + captain role)
    let captain_routes = Router::new()
        .route("/profile", get(captain::profile))
        .route("/logout", get(captain::logout))
        .route("/location", patch(captain::update_location))
        .route("/status", patch(captain::update_status))
        .route("/connection", patch(captain::update_connection))
        .layer(captain_governor.clone())
        .layer(middleware::from_fn(require_captain))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    let maps_routes = Router::new()
        .route("/get-coordinates", get(maps::get_coordinates))
        .route("/get-distance-time", get(maps::get_distance_time))
        .route("/get-suggestions", get(maps::get_suggestions))
        .layer(rider_governor.clone())
        .layer(middleware::from_fn(require_rider))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    let ride_rider_routes = Router::new()
        .route("/create", post(ride::create_ride))
        .route("/get-fare", get(ride::get_fare))
        .route("/cancel", post(ride::cancel_ride))
        .layer(rider_governor)
        .layer(middleware::from_fn(require_rider))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    let ride_captain_routes = Router::new()
        .route("/confirm", post(ride::confirm_ride))
        .route("/start-ride", get(ride::start_ride))
        .route("/end-ride", post(ride::end_ride))
        .layer(captain_governor)
        .layer(middleware::from_fn(require_captain))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    Router::new()
        .nest("/api/users", rider_public.merge(rider_routes))
        .nest("/api/captains", captain_public.merge(captain_routes))
        .nest("/api/maps", maps_routes)
        .nest("/api/rides", ride_rider_routes.merge(ride_captain_routes))
        .with_state(state)
}
