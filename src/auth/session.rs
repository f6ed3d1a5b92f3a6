//! Session management
//!
//! Uses HMAC-signed tokens stored in cookies.
//! No server-side session storage needed.

use axum_extra::extract::CookieJar;
use axum_extra::extract::cookie::{Cookie, SameSite};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::config::SessionConfig;
use crate::error::AppError;

/// Typed view of the per-browser session used by the OAuth flow
///
/// The coordinator and gateway only talk to this trait, so the storage
/// behind it (signed cookie, in-memory map in tests) can vary.
pub trait OAuthSession {
    fn access_token(&self) -> Option<&str>;
    fn set_access_token(&mut self, token: Option<String>);
    fn state(&self) -> Option<&str>;
    fn set_state(&mut self, state: Option<String>);
    fn user(&self) -> Option<&CachedUser>;
    fn set_user(&mut self, user: Option<CachedUser>);
}

/// Profile fields kept from `GET /user`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CachedUser {
    pub login: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub avatar_url: Option<String>,
    #[serde(default)]
    pub html_url: Option<String>,
}

/// Session fields
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<CachedUser>,
}

impl OAuthSession for SessionData {
    /// Empty tokens count as absent.
    fn access_token(&self) -> Option<&str> {
        self.access_token.as_deref().filter(|token| !token.is_empty())
    }

    fn set_access_token(&mut self, token: Option<String>) {
        self.access_token = token;
    }

    fn state(&self) -> Option<&str> {
        self.state.as_deref()
    }

    fn set_state(&mut self, state: Option<String>) {
        self.state = state;
    }

    fn user(&self) -> Option<&CachedUser> {
        self.user.as_ref()
    }

    fn set_user(&mut self, user: Option<CachedUser>) {
        self.user = user;
    }
}

/// Signed cookie payload
#[derive(Debug, Clone, Serialize, Deserialize)]
struct SessionEnvelope {
    data: SessionData,
    /// When this cookie value was issued
    issued_at: DateTime<Utc>,
    /// When this cookie value stops being accepted
    expires_at: DateTime<Utc>,
}

/// Encodes and decodes the session cookie
#[derive(Debug, Clone)]
pub struct SessionCodec {
    secret: String,
    cookie_name: String,
    max_age: Duration,
    secure: bool,
}

impl SessionCodec {
    pub fn new(config: &SessionConfig, secure: bool) -> Self {
        Self {
            secret: config.secret.clone(),
            cookie_name: config.cookie_name.clone(),
            max_age: Duration::seconds(config.max_age),
            secure,
        }
    }

    /// Read the session from the request cookies
    ///
    /// Missing, forged, malformed or expired cookies all yield an empty
    /// session.
    pub fn load(&self, jar: &CookieJar) -> SessionData {
        let Some(cookie) = jar.get(&self.cookie_name) else {
            return SessionData::default();
        };

        match self.decode(cookie.value()) {
            Ok(data) => data,
            Err(error) => {
                tracing::debug!(%error, "Discarding unusable session cookie");
                SessionData::default()
            }
        }
    }

    /// Add the signed session cookie to the jar
    pub fn store(&self, jar: CookieJar, data: &SessionData) -> Result<CookieJar, AppError> {
        let token = self.encode(data)?;
        Ok(jar.add(self.build_cookie(token)))
    }

    /// Sign session data with a fresh expiry
    pub fn encode(&self, data: &SessionData) -> Result<String, AppError> {
        let now = Utc::now();
        let envelope = SessionEnvelope {
            data: data.clone(),
            issued_at: now,
            expires_at: now + self.max_age,
        };
        create_session_token(&envelope, &self.secret)
    }

    /// Verify and decode a cookie value
    pub fn decode(&self, token: &str) -> Result<SessionData, AppError> {
        let envelope: SessionEnvelope = verify_session_token(token, &self.secret)?;

        if envelope.expires_at < Utc::now() {
            return Err(AppError::Session("session expired".to_string()));
        }

        Ok(envelope.data)
    }

    fn build_cookie(&self, value: String) -> Cookie<'static> {
        Cookie::build((self.cookie_name.clone(), value))
            .path("/")
            .http_only(true)
            .secure(self.secure)
            .same_site(SameSite::Lax)
            .build()
    }
}

/// Create a signed session token
///
/// Token format: base64(payload).base64(hmac_sha256(payload))
fn create_session_token<T: Serialize>(payload: &T, secret: &str) -> Result<String, AppError> {
    use base64::{Engine as _, engine::general_purpose};
    use hmac::{Hmac, Mac};
    use sha2::Sha256;

    // 1. Serialize payload to JSON
    let payload = serde_json::to_string(payload).map_err(|e| AppError::Internal(e.into()))?;

    // 2. Base64 encode the payload
    let payload_b64 = general_purpose::URL_SAFE_NO_PAD.encode(payload.as_bytes());

    // 3. Create HMAC-SHA256 signature
    type HmacSha256 = Hmac<Sha256>;
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|e| AppError::Session(e.to_string()))?;
    mac.update(payload_b64.as_bytes());
    let signature = mac.finalize().into_bytes();
    let signature_b64 = general_purpose::URL_SAFE_NO_PAD.encode(signature);

    // 4. Return "{payload}.{signature}"
    Ok(format!("{}.{}", payload_b64, signature_b64))
}

/// Verify and decode a session token
///
/// # Errors
/// Returns error if signature is invalid or token is malformed
fn verify_session_token<T: for<'de> Deserialize<'de>>(
    token: &str,
    secret: &str,
) -> Result<T, AppError> {
    use base64::{Engine as _, engine::general_purpose};
    use hmac::{Hmac, Mac};
    use sha2::Sha256;

    let malformed = || AppError::Session("malformed session token".to_string());

    // 1. Split token into payload and signature
    let (payload_b64, signature_b64) = token.split_once('.').ok_or_else(malformed)?;

    // 2. Verify HMAC signature
    type HmacSha256 = Hmac<Sha256>;
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|e| AppError::Session(e.to_string()))?;
    mac.update(payload_b64.as_bytes());

    let signature = general_purpose::URL_SAFE_NO_PAD
        .decode(signature_b64)
        .map_err(|_| malformed())?;

    mac.verify_slice(&signature)
        .map_err(|_| AppError::Session("invalid session signature".to_string()))?;

    // 3. Decode and deserialize payload
    let payload_bytes = general_purpose::URL_SAFE_NO_PAD
        .decode(payload_b64)
        .map_err(|_| malformed())?;

    serde_json::from_slice(&payload_bytes).map_err(|_| malformed())
}
