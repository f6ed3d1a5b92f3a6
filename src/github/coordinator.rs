//! GitHub OAuth flow
//!
//! Implements the OAuth 2.0 authorization code flow with GitHub on top of
//! an [`OAuthSession`].
//!
//! Session states:
//!
//! ```text
//! ANONYMOUS --login--> AWAITING_CALLBACK --valid code+state--> AUTHENTICATED
//!     ^                       |                                     |
//!     +----invalid state------+                                     |
//!     +------------------------------logout-------------------------+
//! ```

use std::sync::Arc;

use axum::response::{Html, IntoResponse, Redirect, Response};
use rand::RngCore;
use reqwest::Method;
use reqwest::header::HeaderMap;
use serde::Deserialize;
use url::Url;

use super::gateway::ProviderGateway;
use super::models::{ProviderReply, Repository, TokenResponse};
use crate::auth::{CachedUser, OAuthSession};
use crate::config::AppConfig;
use crate::error::{AppError, OAuthError};
use crate::metrics::record_oauth_event;
use crate::views;

/// Query parameters accepted by the OAuth entry route
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EntryQuery {
    /// Authorization code (callback)
    pub code: Option<String>,
    /// CSRF state token (callback)
    pub state: Option<String>,
    /// `login`, `logout` or `repos`
    pub action: Option<String>,
}

/// What the entry route answers with
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntryResponse {
    Redirect(String),
    View(String),
}

impl IntoResponse for EntryResponse {
    fn into_response(self) -> Response {
        match self {
            EntryResponse::Redirect(location) => Redirect::to(&location).into_response(),
            EntryResponse::View(html) => Html(html).into_response(),
        }
    }
}

/// Result of inspecting a request for an authorization redirect
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallbackOutcome {
    /// `code`/`state` not present; continue with normal dispatch
    NotCallback,
    /// Token stored in the session
    Authenticated { location: String },
    /// Flow rejected; no token stored
    Rejected { error: OAuthError, location: String },
}

/// Explicit `action` values
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Login,
    Logout,
    Repos,
}

impl Action {
    pub fn parse(value: Option<&str>) -> Result<Self, OAuthError> {
        match value {
            Some("login") => Ok(Action::Login),
            Some("logout") => Ok(Action::Logout),
            Some("repos") => Ok(Action::Repos),
            _ => Err(OAuthError::UnknownAction),
        }
    }
}

/// Coordinates the authorization code exchange for one session at a time
pub struct OAuthCoordinator {
    config: Arc<AppConfig>,
    gateway: ProviderGateway,
}

impl OAuthCoordinator {
    pub fn new(config: Arc<AppConfig>, gateway: ProviderGateway) -> Self {
        Self { config, gateway }
    }

    /// Full entry route control flow
    ///
    /// # Order
    /// 1. Authorization redirect (`code` + `state`)
    /// 2. Explicit `action`
    /// 3. Logged-in or logged-out view
    pub async fn handle_entry<S: OAuthSession>(
        &self,
        session: &mut S,
        query: &EntryQuery,
    ) -> Result<EntryResponse, AppError> {
        match self.handle_callback(session, query).await? {
            CallbackOutcome::NotCallback => {}
            CallbackOutcome::Authenticated { location }
            | CallbackOutcome::Rejected { location, .. } => {
                return Ok(EntryResponse::Redirect(location));
            }
        }

        match query.action.as_deref().filter(|action| !action.is_empty()) {
            Some(action) => self.dispatch_action(session, Some(action)).await,
            None => self.render_entry(session).await,
        }
    }

    /// Start a login
    ///
    /// # Steps
    /// 1. Drop any stored token and cached user
    /// 2. Generate a CSRF state token and store it in the session
    /// 3. Return the GitHub authorize URL with client_id, redirect_uri, scope, state
    pub fn initiate_login<S: OAuthSession>(&self, session: &mut S) -> Result<String, AppError> {
        session.set_access_token(None);
        session.set_user(None);

        let state = generate_csrf_state();
        session.set_state(Some(state.clone()));

        let mut url = Url::parse(&self.config.github.authorize_url)
            .map_err(|e| AppError::Config(format!("github.authorize_url: {e}")))?;
        url.query_pairs_mut()
            .append_pair("response_type", "code")
            .append_pair("client_id", &self.config.github.client_id)
            .append_pair("redirect_uri", &self.config.server.callback_url())
            .append_pair("scope", &self.config.github.scope)
            .append_pair("state", &state);

        record_oauth_event("login");
        tracing::info!("Redirecting to GitHub for authorization");

        Ok(url.into())
    }

    /// Log out; the pending `state`, if any, is left alone
    pub fn logout<S: OAuthSession>(&self, session: &mut S) -> String {
        session.set_access_token(None);
        session.set_user(None);

        record_oauth_event("logout");
        tracing::info!("Session logged out");

        self.config.server.entry_url()
    }

    /// Handle an authorization redirect from GitHub
    ///
    /// # Steps
    /// 1. Verify CSRF state (the stored state is consumed either way)
    /// 2. Exchange code for access token
    /// 3. Store the token in the session
    ///
    /// # Errors
    /// Transport and non-JSON failures of the token request are returned
    /// as errors; flow rejections are [`CallbackOutcome::Rejected`].
    pub async fn handle_callback<S: OAuthSession>(
        &self,
        session: &mut S,
        query: &EntryQuery,
    ) -> Result<CallbackOutcome, AppError> {
        let (Some(code), Some(state)) = (
            query.code.as_deref().filter(|code| !code.is_empty()),
            query.state.as_deref().filter(|state| !state.is_empty()),
        ) else {
            return Ok(CallbackOutcome::NotCallback);
        };

        let expected = session.state().map(ToOwned::to_owned);
        session.set_state(None);

        if expected.as_deref() != Some(state) {
            tracing::warn!(
                has_stored_state = expected.is_some(),
                "OAuth callback state mismatch"
            );
            return Ok(self.reject(OAuthError::InvalidState));
        }

        let redirect_uri = self.config.server.callback_url();
        let params = [
            ("grant_type", "authorization_code"),
            ("client_id", self.config.github.client_id.as_str()),
            ("client_secret", self.config.github.client_secret.as_str()),
            ("redirect_uri", redirect_uri.as_str()),
            ("code", code),
        ];

        let body = self
            .gateway
            .request(
                Method::POST,
                &self.config.github.token_url,
                &*session,
                HeaderMap::new(),
                &params,
            )
            .await?;

        let response = TokenResponse::from_json(body);
        let error_code = response.error.clone();
        let error_description = response.error_description.clone();
        let token = match response.into_token() {
            Ok(token) => token,
            Err(error) => {
                tracing::warn!(
                    github_error = error_code.as_deref().unwrap_or("none"),
                    github_error_description = error_description.as_deref().unwrap_or(""),
                    "GitHub token response had no access token"
                );
                return Ok(self.reject(error));
            }
        };

        session.set_access_token(Some(token));
        session.set_user(None);

        record_oauth_event("authenticated");
        tracing::info!("GitHub access token stored in session");

        Ok(CallbackOutcome::Authenticated {
            location: self.config.server.entry_url(),
        })
    }

    /// Handle an explicit `action`
    pub async fn dispatch_action<S: OAuthSession>(
        &self,
        session: &mut S,
        action: Option<&str>,
    ) -> Result<EntryResponse, AppError> {
        let action = match Action::parse(action) {
            Ok(action) => action,
            Err(error) => {
                tracing::debug!(action = action.unwrap_or(""), "Unknown action");
                record_oauth_event(error.code());
                return Ok(EntryResponse::Redirect(self.not_found_url()));
            }
        };

        match action {
            Action::Login => Ok(EntryResponse::Redirect(self.initiate_login(session)?)),
            Action::Logout => Ok(EntryResponse::Redirect(self.logout(session))),
            Action::Repos => {
                let repos = self.list_repos(&*session).await?;
                let login = self.cached_login(session).await?;
                Ok(EntryResponse::View(views::repos_page(login.as_deref(), &repos)))
            }
        }
    }

    /// Logged-in or logged-out view
    pub async fn render_entry<S: OAuthSession>(
        &self,
        session: &mut S,
    ) -> Result<EntryResponse, AppError> {
        if session.access_token().is_none() {
            return Ok(EntryResponse::View(views::logged_out_page()));
        }

        let reply = self.fetch_user(&*session).await?;
        match reply {
            ProviderReply::Ok(user) => {
                let page = views::logged_in_page(&user);
                session.set_user(Some(user));
                Ok(EntryResponse::View(page))
            }
            ProviderReply::Rejected(message) => {
                tracing::warn!(github_message = %message.message, "GitHub rejected the profile request");
                Ok(EntryResponse::View(views::provider_error_page(&message)))
            }
        }
    }

    /// `GET /user/repos`, newest first
    pub async fn list_repos<S: OAuthSession>(
        &self,
        session: &S,
    ) -> Result<ProviderReply<Vec<Repository>>, AppError> {
        let body = self
            .gateway
            .request(
                Method::GET,
                &self.config.github.api_endpoint("user/repos"),
                session,
                HeaderMap::new(),
                &[("sort", "created"), ("direction", "desc")],
            )
            .await?;
        ProviderReply::from_json(body)
    }

    /// `GET /user`
    pub async fn fetch_user<S: OAuthSession>(
        &self,
        session: &S,
    ) -> Result<ProviderReply<CachedUser>, AppError> {
        let body = self
            .gateway
            .request(
                Method::GET,
                &self.config.github.api_endpoint("user"),
                session,
                HeaderMap::new(),
                &[],
            )
            .await?;
        ProviderReply::from_json(body)
    }

    /// Login of the cached user, fetched and cached on first use
    async fn cached_login<S: OAuthSession>(
        &self,
        session: &mut S,
    ) -> Result<Option<String>, AppError> {
        if let Some(user) = session.user() {
            return Ok(Some(user.login.clone()));
        }
        if session.access_token().is_none() {
            return Ok(None);
        }

        let reply = self.fetch_user(&*session).await?;
        match reply {
            ProviderReply::Ok(user) => {
                let login = user.login.clone();
                session.set_user(Some(user));
                Ok(Some(login))
            }
            ProviderReply::Rejected(_) => Ok(None),
        }
    }

    fn reject(&self, error: OAuthError) -> CallbackOutcome {
        record_oauth_event(error.code());
        CallbackOutcome::Rejected {
            error,
            location: self.error_url(error),
        }
    }

    /// Homepage carrying `?error=<code>`
    fn error_url(&self, error: OAuthError) -> String {
        format!("{}/?error={}", self.config.server.base_url(), error.code())
    }

    fn not_found_url(&self) -> String {
        format!("{}/notfound", self.config.server.base_url())
    }
}

/// Generate a random CSRF state token
///
/// 16 random bytes, hex encoded.
fn generate_csrf_state() -> String {
    let mut bytes = [0_u8; 16];
    rand::thread_rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}
