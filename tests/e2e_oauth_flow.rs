//! E2E tests for the GitHub OAuth authorization code flow

mod common;

use common::{TestServer, location, query_param, session_set_cookie};
use github_oauth_demo::auth::SessionData;
use serde_json::json;
use wiremock::matchers::{body_string_contains, header, method, path};
use wiremock::{Mock, ResponseTemplate};

#[tokio::test]
async fn test_login_redirects_to_github_with_stored_state() {
    let server = TestServer::new().await;

    let response = server.get("/github?action=login", None).await;

    assert!(response.status().is_redirection());
    let location = location(&response);
    assert!(location.starts_with("https://github.com/login/oauth/authorize?"));
    assert_eq!(query_param(&location, "response_type").as_deref(), Some("code"));
    assert_eq!(
        query_param(&location, "client_id").as_deref(),
        Some("test-client-id")
    );
    assert_eq!(
        query_param(&location, "redirect_uri"),
        Some(server.url("/github/callback"))
    );
    assert_eq!(
        query_param(&location, "scope").as_deref(),
        Some("user public_repo")
    );

    let state = query_param(&location, "state").expect("state parameter");
    assert_eq!(state.len(), 32);

    let cookie = session_set_cookie(&response).expect("session cookie");
    let session = server.decode_session(&cookie);
    assert_eq!(session.state.as_deref(), Some(state.as_str()));
    assert_eq!(session.access_token, None);
}

#[tokio::test]
async fn test_each_login_generates_a_new_state() {
    let server = TestServer::new().await;

    let (_, first) = server.login().await;
    let (_, second) = server.login().await;

    assert_ne!(first, second);
}

#[tokio::test]
async fn test_login_clears_existing_token() {
    let server = TestServer::new().await;
    let cookie = server.authenticated_cookie("T0");

    let response = server.get("/github?action=login", Some(&cookie)).await;

    let cookie = session_set_cookie(&response).expect("session cookie");
    assert_eq!(server.decode_session(&cookie).access_token, None);
}

#[tokio::test]
async fn test_callback_with_matching_state_stores_token() {
    let server = TestServer::new().await;

    Mock::given(method("POST"))
        .and(path("/login/oauth/access_token"))
        .and(header("accept", "application/json"))
        .and(body_string_contains("grant_type=authorization_code"))
        .and(body_string_contains("client_id=test-client-id"))
        .and(body_string_contains("client_secret=test-client-secret"))
        .and(body_string_contains("code=xyz"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "T1",
            "token_type": "bearer",
            "scope": "public_repo,user"
        })))
        .expect(1)
        .mount(&server.github)
        .await;

    let (cookie, state) = server.login().await;
    let response = server
        .get(
            &format!("/github/callback?code=xyz&state={state}"),
            Some(&cookie),
        )
        .await;

    assert!(response.status().is_redirection());
    assert_eq!(location(&response), server.url("/github"));

    let cookie = session_set_cookie(&response).expect("session cookie");
    let session = server.decode_session(&cookie);
    assert_eq!(session.access_token.as_deref(), Some("T1"));
    assert_eq!(session.state, None);
}

#[tokio::test]
async fn test_callback_state_is_single_use() {
    let server = TestServer::new().await;

    Mock::given(method("POST"))
        .and(path("/login/oauth/access_token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"access_token": "T1"})))
        .expect(1)
        .mount(&server.github)
        .await;

    let (cookie, state) = server.login().await;
    let callback = format!("/github/callback?code=xyz&state={state}");

    let first = server.get(&callback, Some(&cookie)).await;
    assert_eq!(location(&first), server.url("/github"));

    // Replaying the consumed callback with the post-login cookie must fail
    let cookie = session_set_cookie(&first).expect("session cookie");
    let replay = server.get(&callback, Some(&cookie)).await;
    assert_eq!(location(&replay), server.url("/?error=invalid_state"));
}

#[tokio::test]
async fn test_callback_with_wrong_state_never_exchanges_code() {
    let server = TestServer::new().await;

    Mock::given(method("POST"))
        .and(path("/login/oauth/access_token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"access_token": "T1"})))
        .expect(0)
        .mount(&server.github)
        .await;

    let cookie = server.session_cookie(&SessionData {
        state: Some("abc".to_string()),
        ..SessionData::default()
    });

    let response = server
        .get("/github/callback?code=xyz&state=wrong", Some(&cookie))
        .await;

    assert!(response.status().is_redirection());
    assert_eq!(location(&response), server.url("/?error=invalid_state"));

    let cookie = session_set_cookie(&response).expect("state is consumed");
    assert_eq!(server.decode_session(&cookie).access_token, None);
}

#[tokio::test]
async fn test_callback_without_session_is_invalid_state() {
    let server = TestServer::new().await;

    Mock::given(method("POST"))
        .and(path("/login/oauth/access_token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"access_token": "T1"})))
        .expect(0)
        .mount(&server.github)
        .await;

    let response = server
        .get("/github/callback?code=xyz&state=abc", None)
        .await;

    assert_eq!(location(&response), server.url("/?error=invalid_state"));
}

#[tokio::test]
async fn test_callback_without_access_token_is_bad_token() {
    let server = TestServer::new().await;

    Mock::given(method("POST"))
        .and(path("/login/oauth/access_token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "error": "bad_verification_code",
            "error_description": "The code passed is incorrect or expired."
        })))
        .expect(1)
        .mount(&server.github)
        .await;

    let (cookie, state) = server.login().await;
    let response = server
        .get(
            &format!("/github/callback?code=expired&state={state}"),
            Some(&cookie),
        )
        .await;

    assert_eq!(location(&response), server.url("/?error=bad_token"));
    let cookie = session_set_cookie(&response).expect("session cookie");
    assert_eq!(server.decode_session(&cookie).access_token, None);
}

#[tokio::test]
async fn test_callback_with_non_json_token_response_fails_cycle() {
    let server = TestServer::new().await;

    Mock::given(method("POST"))
        .and(path("/login/oauth/access_token"))
        .respond_with(ResponseTemplate::new(500).set_body_string("<html>oops</html>"))
        .mount(&server.github)
        .await;

    let (cookie, state) = server.login().await;
    let response = server
        .get(
            &format!("/github/callback?code=xyz&state={state}"),
            Some(&cookie),
        )
        .await;

    assert_eq!(response.status(), 502);
    assert!(session_set_cookie(&response).is_none());
}

#[tokio::test]
async fn test_logout_clears_token_and_is_idempotent() {
    let server = TestServer::new().await;
    let cookie = server.session_cookie(&SessionData {
        access_token: Some("T1".to_string()),
        state: Some("pending".to_string()),
        user: None,
    });

    let first = server.get("/github?action=logout", Some(&cookie)).await;
    assert!(first.status().is_redirection());
    assert_eq!(location(&first), server.url("/github"));

    let cookie = session_set_cookie(&first).expect("session cookie");
    let session = server.decode_session(&cookie);
    assert_eq!(session.access_token, None);
    assert_eq!(session.state.as_deref(), Some("pending"));

    let second = server.get("/github?action=logout", Some(&cookie)).await;
    assert_eq!(location(&second), server.url("/github"));
    // Nothing changed, so the cookie is not re-issued
    assert!(session_set_cookie(&second).is_none());
}

#[tokio::test]
async fn test_logged_in_view_greets_user_with_bearer_token() {
    let server = TestServer::new().await;

    Mock::given(method("GET"))
        .and(path("/user"))
        .and(header("authorization", "Bearer T1"))
        .and(header("accept", "application/json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "login": "octocat",
            "id": 1,
            "name": "The Octocat",
            "avatar_url": "https://avatars.githubusercontent.com/u/583231",
            "html_url": "https://github.com/octocat"
        })))
        .expect(1)
        .mount(&server.github)
        .await;

    let cookie = server.authenticated_cookie("T1");
    let response = server.get("/github", Some(&cookie)).await;

    assert_eq!(response.status(), 200);
    let cookie = session_set_cookie(&response).expect("user cached in session");
    let body = response.text().await.unwrap();
    assert!(body.contains("Welcome, octocat"));

    let session = server.decode_session(&cookie);
    assert_eq!(
        session.user.map(|user| user.login).as_deref(),
        Some("octocat")
    );
}

#[tokio::test]
async fn test_logged_out_view_without_token() {
    let server = TestServer::new().await;

    let response = server.get("/github", None).await;

    assert_eq!(response.status(), 200);
    let body = response.text().await.unwrap();
    assert!(body.contains("/github?action=login"));
}

#[tokio::test]
async fn test_forged_cookie_is_treated_as_anonymous() {
    let server = TestServer::new().await;

    let response = server
        .get("/github", Some("session=eyJkYXRhIjp7fX0.forged"))
        .await;

    assert_eq!(response.status(), 200);
    let body = response.text().await.unwrap();
    assert!(body.contains("Logged Out"));
}
