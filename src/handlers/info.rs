use axum::{extract::State, http::StatusCode, Extension, Json};
use serde_json::{json, Value};

use crate::database::{queries, DbError};
use crate::error::ApiError;
use crate::middleware::AuthUser;
use crate::AppState;

/// GET /health - liveness plus a database ping
pub async fn health(State(state): State<AppState>) -> (StatusCode, Json<Value>) {
    let now = chrono::Utc::now();

    match state.db.health_check().await {
        Ok(()) => (
            StatusCode::OK,
            Json(json!({
                "status": "healthy",
                "timestamp": now,
                "service": "hypertube-info-service",
                "version": env!("CARGO_PKG_VERSION"),
            })),
        ),
        Err(e) => {
            tracing::error!("Health check failed: {}", e);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({
                    "status": "degraded",
                    "timestamp": now,
                    "database": "unavailable",
                })),
            )
        }
    }
}

/// GET /api/v1/info/public - no authentication required
pub async fn public_info() -> Json<Value> {
    Json(json!({
        "project_name": "Hypertube",
        "description": "A streaming platform: movie search, torrent streaming, subtitles, comments",
        "version": env!("CARGO_PKG_VERSION"),
        "status": "Active Development",
        "last_updated": chrono::Utc::now(),
        "license": "MIT",
        "public_endpoints": ["/health", "/api/v1/info/public"],
    }))
}

/// GET /api/v1/info
pub async fn project_info() -> Json<Value> {
    Json(json!({
        "project_name": "Hypertube",
        "description": "Streaming platform with user authentication, movie search, torrent streaming, and subtitle support",
        "version": env!("CARGO_PKG_VERSION"),
        "status": "Active Development",
        "last_updated": chrono::Utc::now(),
        "license": "MIT",
    }))
}

/// GET /api/v1/info/architecture
pub async fn architecture_info() -> Json<Value> {
    Json(json!({
        "architecture": "Microservices",
        "info_service": "Rust (Axum)",
        "database": "PostgreSQL",
        "authentication": "JWT (HS256, shared secret)",
        "rate_limiting": "Per-client sliding window",
        "containerization": "Docker with docker-compose",
    }))
}

/// GET /api/v1/info/features
pub async fn features_info() -> Json<Value> {
    Json(json!({
        "user_management": {
            "user_profiles": "Customizable user profiles",
            "role_based_access": "User and admin roles",
        },
        "movie_management": {
            "metadata": "Movie information with ratings and runtime",
            "comments": "Per-movie comment threads",
        },
        "gatekeeping": {
            "authentication": "Bearer token verification on protected routes",
            "throttling": "Sliding-window rate limiting per client address",
        },
    }))
}

/// GET /api/v1/info/tech-stack
pub async fn tech_stack_info() -> Json<Value> {
    Json(json!({
        "language": "Rust",
        "web_framework": "Axum",
        "async_runtime": "Tokio",
        "database_access": "SQLx (PostgreSQL)",
        "authentication": "jsonwebtoken",
        "observability": "tracing",
    }))
}

/// GET /api/v1/info/endpoints
pub async fn endpoints_info() -> Json<Value> {
    Json(json!({
        "public": ["/health", "/api/v1/info/public"],
        "protected": [
            "/api/v1/info", "/api/v1/info/architecture", "/api/v1/info/features",
            "/api/v1/info/tech-stack", "/api/v1/info/endpoints",
            "/api/v1/movies", "/api/v1/movies/:id", "/api/v1/movies/:id/comments",
            "/api/v1/comments", "/api/v1/comments/:id",
            "/api/v1/users", "/api/v1/users/:id",
            "/api/v1/profile",
        ],
        "admin": ["/api/v1/admin/stats"],
    }))
}

/// GET /api/v1/profile - identity echo for the authenticated user
pub async fn profile(Extension(auth): Extension<AuthUser>) -> Json<Value> {
    Json(json!({
        "id": auth.user_id,
        "username": auth.username,
        "role": auth.role,
    }))
}

/// GET /api/v1/admin/stats - table counts plus limiter occupancy
pub async fn admin_stats(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    let pool = state.db.pool();
    let (movies, comments, users) = tokio::try_join!(
        queries::count_movies(pool),
        queries::count_comments(pool),
        queries::count_users(pool),
    )
    .map_err(DbError::from)?;

    Ok(Json(json!({
        "movies": movies,
        "comments": comments,
        "users": users,
        "rate_limited_clients": state.limiter.tracked_keys(),
    })))
}
