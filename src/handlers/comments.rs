use std::time::Duration;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::database::models::{Comment, NewComment};
use crate::database::{queries, DbError};
use crate::error::ApiError;
use crate::middleware::AuthUser;
use crate::AppState;

/// Deadline for the comment-creation transaction.
const CREATE_DEADLINE: Duration = Duration::from_secs(5);

#[derive(Debug, Deserialize)]
pub struct CreateCommentRequest {
    pub comment: String,
    pub movie_id: i32,
}

#[derive(Debug, Deserialize)]
pub struct UpdateCommentRequest {
    pub comment: String,
}

/// GET /api/v1/comments - latest comments across all movies
pub async fn list_comments(
    State(state): State<AppState>,
) -> Result<Json<Vec<Comment>>, ApiError> {
    let comments = queries::list_comments(state.db.pool())
        .await
        .map_err(DbError::from)?;
    Ok(Json(comments))
}

/// GET /api/v1/comments/:id
pub async fn get_comment(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<Comment>, ApiError> {
    let comment = queries::get_comment(state.db.pool(), id)
        .await
        .map_err(DbError::from)?
        .ok_or_else(|| ApiError::not_found("Comment not found"))?;
    Ok(Json(comment))
}

/// POST /api/v1/comments
///
/// The author comes from the verified token, never the body. The
/// author lookup (for the avatar snapshot) and the insert run in one
/// transaction, so a concurrent user deletion cannot leave a comment
/// referencing an author that was gone before the insert.
pub async fn create_comment(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Json(payload): Json<CreateCommentRequest>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    if payload.comment.trim().is_empty() {
        return Err(ApiError::bad_request("Comment must not be empty"));
    }

    let user_id = i32::try_from(auth.user_id)
        .map_err(|_| ApiError::bad_request("Invalid user id in token"))?;
    let username = auth.username.clone();
    let content = payload.comment;
    let movie_id = payload.movie_id;

    let id = state
        .db
        .exec_tx(CREATE_DEADLINE, move |tx| {
            Box::pin(async move {
                let user = queries::get_user(&mut **tx, user_id)
                    .await?
                    .ok_or_else(|| DbError::NotFound(format!("User {} not found", user_id)))?;

                let new = NewComment {
                    content,
                    username,
                    user_id,
                    movie_id,
                    user_avatar: user.profile_picture,
                };
                let id = queries::insert_comment(&mut **tx, &new).await?;
                Ok(id)
            })
        })
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({ "id": id, "message": "Comment created successfully" })),
    ))
}

/// PUT /api/v1/comments/:id
pub async fn update_comment(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Json(payload): Json<UpdateCommentRequest>,
) -> Result<Json<Value>, ApiError> {
    if payload.comment.trim().is_empty() {
        return Err(ApiError::bad_request("Comment must not be empty"));
    }

    let rows = queries::update_comment(state.db.pool(), id, &payload.comment)
        .await
        .map_err(DbError::from)?;
    if rows == 0 {
        return Err(ApiError::not_found("Comment not found"));
    }

    Ok(Json(json!({ "message": "Comment updated successfully" })))
}

/// DELETE /api/v1/comments/:id
pub async fn delete_comment(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<Value>, ApiError> {
    let rows = queries::delete_comment(state.db.pool(), id)
        .await
        .map_err(DbError::from)?;
    if rows == 0 {
        return Err(ApiError::not_found("Comment not found"));
    }

    Ok(Json(json!({ "message": "Comment deleted successfully" })))
}
