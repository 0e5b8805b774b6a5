use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Frontpage listing entry: id and title only.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct MovieSummary {
    pub id: i32,
    pub title: String,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Movie {
    pub id: i32,
    pub title: String,
    pub imdb_rating: Option<f64>,
    pub production_year: Option<i32>,
    pub runtime_minutes: Option<i32>,
    pub comment_count: i64,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Comment {
    pub id: i32,
    pub content: String,
    pub username: String,
    pub user_id: i32,
    pub movie_id: i32,
    pub user_avatar: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Insert parameters for a new comment. The avatar is snapshotted from
/// the author's profile at creation time.
#[derive(Debug, Clone)]
pub struct NewComment {
    pub content: String,
    pub username: String,
    pub user_id: i32,
    pub movie_id: i32,
    pub user_avatar: Option<String>,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct UserSummary {
    pub id: i32,
    pub user_name: String,
}

/// Full user record as exposed over the API. The password hash lives
/// in the same table but is never selected into this type.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct User {
    pub id: i32,
    pub user_name: String,
    pub email: String,
    pub profile_picture: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpdateUser {
    pub user_name: String,
    pub email: String,
    pub profile_picture: Option<String>,
}
