//! Named parameterized operations over the movies/comments/users
//! schema. Each function takes any `PgExecutor`, so the same query
//! binds either to the ambient pool or to a transaction handle inside
//! [`Database::exec_tx`](super::Database::exec_tx).

use sqlx::PgExecutor;

use super::models::{Comment, Movie, MovieSummary, NewComment, UpdateUser, User, UserSummary};

pub async fn list_movies(ex: impl PgExecutor<'_>) -> sqlx::Result<Vec<MovieSummary>> {
    sqlx::query_as("SELECT id, title FROM movies ORDER BY id")
        .fetch_all(ex)
        .await
}

pub async fn get_movie(ex: impl PgExecutor<'_>, id: i32) -> sqlx::Result<Option<Movie>> {
    sqlx::query_as(
        "SELECT m.id, m.title, m.imdb_rating, m.production_year, m.runtime_minutes, \
                (SELECT COUNT(*) FROM comments c WHERE c.movie_id = m.id) AS comment_count \
         FROM movies m WHERE m.id = $1",
    )
    .bind(id)
    .fetch_optional(ex)
    .await
}

pub async fn list_comments(ex: impl PgExecutor<'_>) -> sqlx::Result<Vec<Comment>> {
    sqlx::query_as(
        "SELECT id, content, username, user_id, movie_id, user_avatar, created_at \
         FROM comments ORDER BY created_at DESC LIMIT 50",
    )
    .fetch_all(ex)
    .await
}

pub async fn get_comment(ex: impl PgExecutor<'_>, id: i32) -> sqlx::Result<Option<Comment>> {
    sqlx::query_as(
        "SELECT id, content, username, user_id, movie_id, user_avatar, created_at \
         FROM comments WHERE id = $1",
    )
    .bind(id)
    .fetch_optional(ex)
    .await
}

pub async fn comments_for_movie(
    ex: impl PgExecutor<'_>,
    movie_id: i32,
) -> sqlx::Result<Vec<Comment>> {
    sqlx::query_as(
        "SELECT id, content, username, user_id, movie_id, user_avatar, created_at \
         FROM comments WHERE movie_id = $1 ORDER BY created_at DESC",
    )
    .bind(movie_id)
    .fetch_all(ex)
    .await
}

/// Insert a comment, returning the new id.
pub async fn insert_comment(ex: impl PgExecutor<'_>, new: &NewComment) -> sqlx::Result<i32> {
    sqlx::query_scalar(
        "INSERT INTO comments (content, username, user_id, movie_id, user_avatar, created_at) \
         VALUES ($1, $2, $3, $4, $5, NOW()) RETURNING id",
    )
    .bind(&new.content)
    .bind(&new.username)
    .bind(new.user_id)
    .bind(new.movie_id)
    .bind(&new.user_avatar)
    .fetch_one(ex)
    .await
}

/// Returns the number of rows touched; 0 means no such comment.
pub async fn update_comment(
    ex: impl PgExecutor<'_>,
    id: i32,
    content: &str,
) -> sqlx::Result<u64> {
    let result = sqlx::query("UPDATE comments SET content = $2 WHERE id = $1")
        .bind(id)
        .bind(content)
        .execute(ex)
        .await?;
    Ok(result.rows_affected())
}

pub async fn delete_comment(ex: impl PgExecutor<'_>, id: i32) -> sqlx::Result<u64> {
    let result = sqlx::query("DELETE FROM comments WHERE id = $1")
        .bind(id)
        .execute(ex)
        .await?;
    Ok(result.rows_affected())
}

pub async fn list_users(ex: impl PgExecutor<'_>) -> sqlx::Result<Vec<UserSummary>> {
    sqlx::query_as("SELECT id, user_name FROM users ORDER BY id")
        .fetch_all(ex)
        .await
}

pub async fn get_user(ex: impl PgExecutor<'_>, id: i32) -> sqlx::Result<Option<User>> {
    sqlx::query_as("SELECT id, user_name, email, profile_picture FROM users WHERE id = $1")
        .bind(id)
        .fetch_optional(ex)
        .await
}

pub async fn update_user(
    ex: impl PgExecutor<'_>,
    id: i32,
    update: &UpdateUser,
) -> sqlx::Result<u64> {
    let result = sqlx::query(
        "UPDATE users SET user_name = $2, email = $3, profile_picture = $4 WHERE id = $1",
    )
    .bind(id)
    .bind(&update.user_name)
    .bind(&update.email)
    .bind(&update.profile_picture)
    .execute(ex)
    .await?;
    Ok(result.rows_affected())
}

pub async fn count_movies(ex: impl PgExecutor<'_>) -> sqlx::Result<i64> {
    sqlx::query_scalar("SELECT COUNT(*) FROM movies").fetch_one(ex).await
}

pub async fn count_comments(ex: impl PgExecutor<'_>) -> sqlx::Result<i64> {
    sqlx::query_scalar("SELECT COUNT(*) FROM comments").fetch_one(ex).await
}

pub async fn count_users(ex: impl PgExecutor<'_>) -> sqlx::Result<i64> {
    sqlx::query_scalar("SELECT COUNT(*) FROM users").fetch_one(ex).await
}
