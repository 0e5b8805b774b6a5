use axum::{
    extract::{Path, State},
    Json,
};
use serde_json::{json, Value};

use crate::database::models::{UpdateUser, User, UserSummary};
use crate::database::{queries, DbError};
use crate::error::ApiError;
use crate::AppState;

/// GET /api/v1/users - id and username list
pub async fn list_users(State(state): State<AppState>) -> Result<Json<Vec<UserSummary>>, ApiError> {
    let users = queries::list_users(state.db.pool())
        .await
        .map_err(DbError::from)?;
    Ok(Json(users))
}

/// GET /api/v1/users/:id - username, email, profile picture
pub async fn get_user(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<User>, ApiError> {
    let user = queries::get_user(state.db.pool(), id)
        .await
        .map_err(DbError::from)?
        .ok_or_else(|| ApiError::not_found("User not found"))?;
    Ok(Json(user))
}

/// PUT /api/v1/users/:id
///
/// Profile fields only; credential changes belong to the external auth
/// service that issues the tokens.
pub async fn update_user(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Json(payload): Json<UpdateUser>,
) -> Result<Json<Value>, ApiError> {
    if payload.user_name.trim().is_empty() || payload.email.trim().is_empty() {
        return Err(ApiError::bad_request("Username and email are required"));
    }

    let rows = queries::update_user(state.db.pool(), id, &payload)
        .await
        .map_err(DbError::from)?;
    if rows == 0 {
        return Err(ApiError::not_found("User not found"));
    }

    Ok(Json(json!({ "message": "User updated successfully" })))
}
