//! Session extractor
//!
//! Loads the signed session cookie for a handler and writes it back
//! afterwards when the handler changed it.

use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};
use axum_extra::extract::CookieJar;

use super::session::SessionData;
use crate::AppState;
use crate::error::AppError;

/// Session of the current browser
///
/// # Usage
/// ```ignore
/// async fn handler(
///     State(state): State<AppState>,
///     jar: CookieJar,
///     mut session: CookieSession,
/// ) -> Result<impl IntoResponse, AppError> {
///     session.data.set_state(None);
///     let jar = session.commit(jar, &state)?;
///     Ok((jar, "done"))
/// }
/// ```
#[derive(Debug, Clone)]
pub struct CookieSession {
    pub data: SessionData,
    loaded: SessionData,
}

impl CookieSession {
    /// Whether the handler modified the session
    pub fn is_modified(&self) -> bool {
        self.data != self.loaded
    }

    /// Re-issue the session cookie if it changed
    pub fn commit(&self, jar: CookieJar, state: &AppState) -> Result<CookieJar, AppError> {
        if !self.is_modified() {
            return Ok(jar);
        }
        state.sessions.store(jar, &self.data)
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for CookieSession
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let app_state = AppState::from_ref(state);
        let jar = CookieJar::from_headers(&parts.headers);
        let data = app_state.sessions.load(&jar);

        Ok(CookieSession {
            loaded: data.clone(),
            data,
        })
    }
}
