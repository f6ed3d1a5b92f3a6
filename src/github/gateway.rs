//! GitHub API gateway
//!
//! Forwards a request to GitHub with the headers every call needs and the
//! session's bearer token, then hands back the JSON body as-is.

use std::time::Instant;

use reqwest::Method;
use reqwest::header::{ACCEPT, AUTHORIZATION, HeaderMap, HeaderValue, USER_AGENT};

use crate::auth::OAuthSession;
use crate::error::AppError;
use crate::metrics::{PROVIDER_REQUEST_DURATION_SECONDS, PROVIDER_REQUESTS_TOTAL};

/// Request forwarding helper for GitHub
#[derive(Debug, Clone)]
pub struct ProviderGateway {
    http: reqwest::Client,
    user_agent: HeaderValue,
}

impl ProviderGateway {
    /// Create a gateway identifying itself with `user_agent`
    ///
    /// # Errors
    /// Returns error if the user agent is not a valid header value or the
    /// HTTP client cannot be built
    pub fn new(user_agent: &str) -> Result<Self, AppError> {
        let http = reqwest::Client::builder()
            .build()
            .map_err(AppError::HttpClient)?;
        Self::with_http_client(http, user_agent)
    }

    /// Use a custom HTTP client
    pub fn with_http_client(http: reqwest::Client, user_agent: &str) -> Result<Self, AppError> {
        let user_agent = HeaderValue::from_str(user_agent)
            .map_err(|e| AppError::Config(format!("invalid user agent: {e}")))?;
        Ok(Self { http, user_agent })
    }

    /// Send a request to GitHub on behalf of `session`
    ///
    /// `params` become the query string for GET and the form body for
    /// everything else. The HTTP status is not checked; the body is parsed
    /// as JSON whatever it is.
    ///
    /// # Errors
    /// Returns [`AppError::HttpClient`] on transport failure and
    /// [`AppError::Upstream`] if the body is not JSON
    pub async fn request<S: OAuthSession + ?Sized>(
        &self,
        method: Method,
        url: &str,
        session: &S,
        extra_headers: HeaderMap,
        params: &[(&str, &str)],
    ) -> Result<serde_json::Value, AppError> {
        let headers = self.headers_for(session, extra_headers)?;

        let builder = self.http.request(method.clone(), url).headers(headers);
        let builder = if method == Method::GET {
            builder.query(params)
        } else {
            builder.form(params)
        };

        let started = Instant::now();
        let response = builder.send().await;
        PROVIDER_REQUEST_DURATION_SECONDS
            .with_label_values(&[method.as_str()])
            .observe(started.elapsed().as_secs_f64());

        let response = match response {
            Ok(response) => response,
            Err(error) => {
                PROVIDER_REQUESTS_TOTAL
                    .with_label_values(&[method.as_str(), "error"])
                    .inc();
                tracing::warn!(%error, %method, url, "GitHub request failed");
                return Err(error.into());
            }
        };

        let status = response.status();
        PROVIDER_REQUESTS_TOTAL
            .with_label_values(&[method.as_str(), status.as_str()])
            .inc();
        tracing::debug!(%method, url, status = status.as_u16(), "GitHub responded");

        let body = response.bytes().await?;
        serde_json::from_slice(&body).map_err(|e| {
            AppError::Upstream(format!(
                "GitHub returned a non-JSON body (status {}): {e}",
                status.as_u16()
            ))
        })
    }

    /// Headers for one call, built fresh each time
    fn headers_for<S: OAuthSession + ?Sized>(
        &self,
        session: &S,
        extra_headers: HeaderMap,
    ) -> Result<HeaderMap, AppError> {
        let mut headers = extra_headers;
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        headers.insert(USER_AGENT, self.user_agent.clone());

        match session.access_token() {
            Some(token) => {
                let value = HeaderValue::from_str(&format!("Bearer {token}"))
                    .map_err(|_| AppError::Validation("access token is not a valid header".to_string()))?;
                headers.insert(AUTHORIZATION, value);
            }
            None => {
                headers.remove(AUTHORIZATION);
            }
        }

        Ok(headers)
    }
}
