use axum::{
    extract::{Path, State},
    Json,
};

use crate::database::models::{Comment, Movie, MovieSummary};
use crate::database::{queries, DbError};
use crate::error::ApiError;
use crate::AppState;

/// GET /api/v1/movies - frontpage listing, id and title only
pub async fn list_movies(
    State(state): State<AppState>,
) -> Result<Json<Vec<MovieSummary>>, ApiError> {
    let movies = queries::list_movies(state.db.pool())
        .await
        .map_err(DbError::from)?;
    Ok(Json(movies))
}

/// GET /api/v1/movies/:id - full movie record with comment count
pub async fn get_movie(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<Movie>, ApiError> {
    let movie = queries::get_movie(state.db.pool(), id)
        .await
        .map_err(DbError::from)?
        .ok_or_else(|| ApiError::not_found("Movie not found"))?;
    Ok(Json(movie))
}

/// GET /api/v1/movies/:id/comments
pub async fn movie_comments(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<Vec<Comment>>, ApiError> {
    let comments = queries::comments_for_movie(state.db.pool(), id)
        .await
        .map_err(DbError::from)?;
    Ok(Json(comments))
}
