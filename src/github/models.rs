//! Typed views of GitHub responses
//!
//! The gateway relays raw JSON; these types decide what a response means
//! before anything reads fields out of it.

use serde::Deserialize;
use serde::de::DeserializeOwned;

use crate::error::{AppError, OAuthError};

/// Error document GitHub returns for rejected API calls
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ProviderMessage {
    pub message: String,
    #[serde(default)]
    pub documentation_url: Option<String>,
}

/// Outcome of an API call, decided from the body shape alone
///
/// The gateway never checks the status code, so a 401 with
/// `{"message": "Requires authentication"}` lands in `Rejected`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProviderReply<T> {
    Ok(T),
    Rejected(ProviderMessage),
}

impl<T: DeserializeOwned> ProviderReply<T> {
    /// Interpret a JSON body
    ///
    /// # Errors
    /// Returns [`AppError::Upstream`] if the body is neither the expected
    /// document nor a GitHub error message.
    pub fn from_json(value: serde_json::Value) -> Result<Self, AppError> {
        match serde_json::from_value::<T>(value.clone()) {
            Ok(parsed) => Ok(ProviderReply::Ok(parsed)),
            Err(parse_error) => serde_json::from_value::<ProviderMessage>(value)
                .map(ProviderReply::Rejected)
                .map_err(|_| {
                    AppError::Upstream(format!("unexpected GitHub response: {parse_error}"))
                }),
        }
    }
}

/// Token endpoint response
///
/// Every field is optional: GitHub answers a failed exchange with HTTP 200
/// and an `error` field instead of a token.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TokenResponse {
    #[serde(default)]
    pub access_token: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub error_description: Option<String>,
}

impl TokenResponse {
    /// Lenient decode; a body that is not an object yields no token.
    pub fn from_json(value: serde_json::Value) -> Self {
        serde_json::from_value(value).unwrap_or_default()
    }

    /// The access token, or [`OAuthError::BadToken`] when absent or empty
    pub fn into_token(self) -> Result<String, OAuthError> {
        self.access_token
            .filter(|token| !token.is_empty())
            .ok_or(OAuthError::BadToken)
    }
}

/// Entry of `GET /user/repos`
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Repository {
    pub name: String,
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub html_url: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub private: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::CachedUser;
    use serde_json::json;

    #[test]
    fn repository_list_parses_as_ok() {
        let reply = ProviderReply::<Vec<Repository>>::from_json(json!([
            {"name": "hello-world", "full_name": "octocat/hello-world", "private": false},
            {"name": "secret", "private": true}
        ]))
        .unwrap();

        let ProviderReply::Ok(repos) = reply else {
            panic!("expected repositories");
        };
        assert_eq!(repos.len(), 2);
        assert_eq!(repos[0].name, "hello-world");
        assert!(repos[1].private);
    }

    #[test]
    fn authentication_error_parses_as_rejected() {
        let reply = ProviderReply::<Vec<Repository>>::from_json(json!({
            "message": "Requires authentication",
            "documentation_url": "https://docs.github.com/rest"
        }))
        .unwrap();

        assert_eq!(
            reply,
            ProviderReply::Rejected(ProviderMessage {
                message: "Requires authentication".to_string(),
                documentation_url: Some("https://docs.github.com/rest".to_string()),
            })
        );
    }

    #[test]
    fn unrecognized_body_is_upstream_error() {
        let result = ProviderReply::<CachedUser>::from_json(json!({"id": 1}));
        assert!(matches!(result, Err(AppError::Upstream(_))));
    }

    #[test]
    fn token_response_requires_access_token() {
        let granted = TokenResponse::from_json(json!({
            "access_token": "T1",
            "token_type": "bearer",
            "scope": "user,public_repo"
        }));
        assert_eq!(granted.into_token(), Ok("T1".to_string()));

        let denied = TokenResponse::from_json(json!({
            "error": "bad_verification_code",
            "error_description": "The code passed is incorrect or expired."
        }));
        assert_eq!(denied.error.as_deref(), Some("bad_verification_code"));
        assert_eq!(denied.into_token(), Err(OAuthError::BadToken));

        let empty = TokenResponse::from_json(json!({"access_token": ""}));
        assert_eq!(empty.into_token(), Err(OAuthError::BadToken));

        let not_an_object = TokenResponse::from_json(json!("access_token"));
        assert_eq!(not_an_object.into_token(), Err(OAuthError::BadToken));
    }
}
