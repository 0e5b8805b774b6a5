pub mod comments;
pub mod info;
pub mod movies;
pub mod users;
