pub mod auth;
pub mod config;
pub mod database;
pub mod error;
pub mod handlers;
pub mod middleware;

use std::sync::Arc;

use axum::{middleware::from_fn, middleware::from_fn_with_state, routing::get, Router};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::auth::TokenVerifier;
use crate::database::Database;
use crate::handlers::{comments, info, movies, users};
use crate::middleware::{
    admin_middleware, jwt_auth_middleware, rate_limit_middleware, RateLimiter,
};

/// Shared application state: pool, verifier, and limiter are all
/// explicitly owned here and injected, so tests can build isolated
/// instances.
#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub verifier: Arc<TokenVerifier>,
    pub limiter: Arc<RateLimiter>,
}

/// Build the full router. Gatekeeper ordering per route class:
/// rate limit -> JWT auth -> (admin check) -> handler. The rate limit
/// wraps everything, so a throttled client is rejected before any
/// token or database work.
pub fn app(state: AppState) -> Router {
    let admin_routes = Router::new()
        .route("/admin/stats", get(info::admin_stats))
        .layer(from_fn(admin_middleware));

    let protected_routes = Router::new()
        .route("/info", get(info::project_info))
        .route("/info/architecture", get(info::architecture_info))
        .route("/info/features", get(info::features_info))
        .route("/info/tech-stack", get(info::tech_stack_info))
        .route("/info/endpoints", get(info::endpoints_info))
        .route("/movies", get(movies::list_movies))
        .route("/movies/:id", get(movies::get_movie))
        .route("/movies/:id/comments", get(movies::movie_comments))
        .route(
            "/comments",
            get(comments::list_comments).post(comments::create_comment),
        )
        .route(
            "/comments/:id",
            get(comments::get_comment)
                .put(comments::update_comment)
                .delete(comments::delete_comment),
        )
        .route("/users", get(users::list_users))
        .route(
            "/users/:id",
            get(users::get_user).put(users::update_user),
        )
        .route("/profile", get(info::profile))
        .merge(admin_routes)
        .layer(from_fn_with_state(
            state.verifier.clone(),
            jwt_auth_middleware,
        ));

    let public_routes = Router::new().route("/info/public", get(info::public_info));

    Router::new()
        .route("/health", get(info::health))
        .nest("/api/v1", public_routes.merge(protected_routes))
        .layer(from_fn_with_state(
            state.limiter.clone(),
            rate_limit_middleware,
        ))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
