//! HTTP API handlers for postnorm-api

pub mod error;
pub mod health;
pub mod posts;

pub use error::ApiError;
pub use health::health_routes;
pub use posts::{list_all_posts, not_found, posts_by_platform};
