//! Normalized post endpoints
//!
//! GET /           - posts from every platform in the registry
//! GET /:platform  - posts from one platform

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use postnorm_common::NormalizedRecord;
use serde_json::json;
use tracing::{info, warn};

use super::error::ApiError;
use crate::AppState;

/// GET /
///
/// All-or-nothing: any failing platform fails the whole request.
pub async fn list_all_posts(
    State(state): State<AppState>,
) -> Result<Json<Vec<NormalizedRecord>>, ApiError> {
    info!("Processing request to list all posts");

    let posts = tokio::task::spawn_blocking(move || state.posts.normalize_all()).await??;
    Ok(Json(posts))
}

/// GET /:platform
pub async fn posts_by_platform(
    State(state): State<AppState>,
    Path(platform): Path<String>,
) -> Result<Json<Vec<NormalizedRecord>>, ApiError> {
    info!(
        "Processing request to list posts for platform: {}",
        escape_html(&platform)
    );

    let posts =
        tokio::task::spawn_blocking(move || state.posts.normalize_platform(&platform)).await??;
    Ok(Json(posts))
}

/// Fallback for unmatched routes
pub async fn not_found(uri: axum::http::Uri) -> Response {
    warn!("404 error: {}", escape_html(uri.path()));
    (
        StatusCode::NOT_FOUND,
        Json(json!({
            "error": "The requested resource was not found",
        })),
    )
        .into_response()
}

/// Escape caller-supplied text before it reaches human-facing output
pub fn escape_html(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}
