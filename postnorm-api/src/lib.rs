//! postnorm-api library - HTTP boundary for the post normalization service
//!
//! Exposes normalized posts from every configured platform as JSON.

use axum::Router;
use postnorm_common::PostService;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub mod api;
pub mod logging;

/// Application state shared across HTTP handlers
#[derive(Clone)]
pub struct AppState {
    /// Normalization pipeline
    pub posts: PostService,
}

impl AppState {
    /// Create new application state
    pub fn new(posts: PostService) -> Self {
        Self { posts }
    }
}

/// Build application router
///
/// `/health` is matched ahead of `/:platform`, so it can never be taken for
/// a platform name.
pub fn build_router(state: AppState) -> Router {
    use axum::routing::get;

    Router::new()
        .route("/", get(api::list_all_posts))
        .route("/:platform", get(api::posts_by_platform))
        .merge(api::health_routes())
        .fallback(api::not_found)
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        // Browser dashboards on any origin may call the API
        .layer(CorsLayer::permissive())
}
