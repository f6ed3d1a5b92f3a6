//! Common test utilities for E2E tests

#![allow(dead_code)]

use github_oauth_demo::auth::SessionData;
use github_oauth_demo::{AppState, config};
use reqwest::header::{LOCATION, SET_COOKIE};
use tokio::net::TcpListener;
use wiremock::MockServer;

/// Test server instance
///
/// Runs the real router on a random port with every GitHub endpoint except
/// the browser-facing authorize page pointed at a mock server.
pub struct TestServer {
    pub addr: String,
    pub state: AppState,
    pub github: MockServer,
    pub client: reqwest::Client,
}

impl TestServer {
    /// Create a new test server instance
    pub async fn new() -> Self {
        let github = MockServer::start().await;

        // Bind first so the public URL is known before configuration is built
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let addr_str = format!("http://{}", addr);

        // Create test configuration
        let config = config::AppConfig {
            server: config::ServerConfig {
                host: "127.0.0.1".to_string(),
                port: addr.port(),
                public_url: Some(addr_str.clone()),
            },
            github: config::GitHubConfig {
                client_id: "test-client-id".to_string(),
                client_secret: "test-client-secret".to_string(),
                authorize_url: "https://github.com/login/oauth/authorize".to_string(),
                token_url: format!("{}/login/oauth/access_token", github.uri()),
                api_url: github.uri(),
                scope: "user public_repo".to_string(),
            },
            session: config::SessionConfig {
                secret: "test-secret-key-32-bytes-long!!!".to_string(),
                cookie_name: "session".to_string(),
                max_age: 3600,
            },
            logging: config::LoggingConfig {
                level: "info".to_string(),
                format: "pretty".to_string(),
            },
        };

        // Initialize app state
        let state = AppState::new(config).unwrap();

        // Redirects are asserted, never followed
        let client = reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .timeout(std::time::Duration::from_secs(10))
            .build()
            .unwrap();

        // Build router
        let app = github_oauth_demo::build_router(state.clone());

        // Spawn server in background
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            addr: addr_str,
            state,
            github,
            client,
        }
    }

    /// Get URL for a path on the app
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.addr, path)
    }

    /// Cookie header value carrying `data` as the session
    pub fn session_cookie(&self, data: &SessionData) -> String {
        let token = self.state.sessions.encode(data).unwrap();
        format!("session={token}")
    }

    /// Cookie header for a session holding `token`
    pub fn authenticated_cookie(&self, token: &str) -> String {
        self.session_cookie(&SessionData {
            access_token: Some(token.to_string()),
            ..SessionData::default()
        })
    }

    /// GET a path, optionally with a session cookie
    pub async fn get(&self, path: &str, cookie: Option<&str>) -> reqwest::Response {
        let mut request = self.client.get(self.url(path));
        if let Some(cookie) = cookie {
            request = request.header("Cookie", cookie);
        }
        request.send().await.expect("request succeeds")
    }

    /// Start a login and return the issued session cookie and state
    pub async fn login(&self) -> (String, String) {
        let response = self.get("/github?action=login", None).await;
        assert!(response.status().is_redirection());

        let state = query_param(&location(&response), "state").expect("state in authorize URL");
        let cookie = session_set_cookie(&response).expect("session cookie issued on login");
        (cookie, state)
    }

    /// Decode the session carried by a `session=...` cookie pair
    pub fn decode_session(&self, cookie: &str) -> SessionData {
        let token = cookie.strip_prefix("session=").expect("session cookie pair");
        self.state.sessions.decode(token).expect("valid session cookie")
    }
}

/// Location header of a redirect
pub fn location(response: &reqwest::Response) -> String {
    response
        .headers()
        .get(LOCATION)
        .and_then(|v| v.to_str().ok())
        .expect("location header")
        .to_string()
}

/// `session=...` pair from the Set-Cookie headers, if the session was re-issued
pub fn session_set_cookie(response: &reqwest::Response) -> Option<String> {
    response
        .headers()
        .get_all(SET_COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .filter_map(|raw| raw.split(';').next())
        .find(|pair| pair.starts_with("session="))
        .map(ToString::to_string)
}

/// Query parameter of an absolute URL
pub fn query_param(url: &str, key: &str) -> Option<String> {
    url::Url::parse(url)
        .ok()?
        .query_pairs()
        .find(|(name, _)| name == key)
        .map(|(_, value)| value.into_owned())
}
