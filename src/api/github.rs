//! OAuth entry route
//!
//! `/github` and `/github/callback` share one handler; the query string
//! decides whether a request is a callback, an action or a plain visit.

use axum::{
    Router,
    extract::{Query, State},
    response::IntoResponse,
    routing::any,
};
use axum_extra::extract::CookieJar;

use crate::AppState;
use crate::auth::CookieSession;
use crate::error::AppError;
use crate::github::EntryQuery;

/// Create GitHub router
///
/// Routes:
/// - /github - OAuth entry point (`action=login|logout|repos`)
/// - /github/callback - Authorization redirect target
pub fn github_router() -> Router<AppState> {
    Router::new()
        .route("/github", any(github_entry))
        .route("/github/callback", any(github_entry))
}

/// Entry handler
///
/// The session cookie is re-issued only when the flow changed it; a failed
/// cycle leaves the stored session untouched.
async fn github_entry(
    State(state): State<AppState>,
    Query(query): Query<EntryQuery>,
    jar: CookieJar,
    mut session: CookieSession,
) -> Result<impl IntoResponse, AppError> {
    let response = state
        .coordinator
        .handle_entry(&mut session.data, &query)
        .await?;
    let jar = session.commit(jar, &state)?;

    Ok((jar, response))
}
