//! Static pages

use axum::{
    Router,
    extract::Query,
    http::StatusCode,
    response::{Html, IntoResponse},
    routing::get,
};
use serde::Deserialize;

use crate::views;

#[derive(Debug, Deserialize)]
struct HomeQuery {
    error: Option<String>,
}

/// Create pages router
///
/// Routes:
/// - GET / - Homepage (shows `?error=` notices from the OAuth flow)
/// - GET /notfound - Target of unknown actions
pub fn pages_router<S>() -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    Router::new()
        .route("/", get(homepage))
        .route("/notfound", get(not_found))
}

async fn homepage(Query(query): Query<HomeQuery>) -> impl IntoResponse {
    Html(views::home_page(query.error.as_deref()))
}

async fn not_found() -> impl IntoResponse {
    (StatusCode::NOT_FOUND, Html(views::not_found_page()))
}
