mod common;

use serde_json::json;
use std::time::Duration;
use warp::http::StatusCode;

use common::TestApp;
use coursehub::auth::user::UserRole;
use coursehub::config::AuthConfig;
use coursehub::auth::token::TokenCodec;

#[tokio::test]
async fn test_register_login_and_me() {
    let app = TestApp::new().await;

    let registered = app
        .post(
            "/api/auth/register",
            None,
            json!({ "email": "a@x.com", "password": "secret1", "name": "Admin", "role": "admin" }),
        )
        .await;
    assert_eq!(registered.status, StatusCode::CREATED);
    assert_eq!(registered.body["token_type"], "bearer");
    assert_eq!(registered.body["user"]["role"], "admin");
    assert!(registered.body["access_token"].as_str().is_some());

    // Registration also hands out the session cookie
    let cookie = registered.headers["set-cookie"].to_str().unwrap();
    assert!(cookie.starts_with("auth_token="));
    assert!(cookie.contains("HttpOnly"));
    assert!(cookie.contains("SameSite=Lax"));

    let login = app
        .post("/api/auth/login", None, json!({ "email": "a@x.com", "password": "secret1" }))
        .await;
    assert_eq!(login.status, StatusCode::OK);
    let token = login.body["access_token"].as_str().unwrap().to_string();

    let me = app.get("/api/auth/me", Some(&token)).await;
    assert_eq!(me.status, StatusCode::OK);
    assert_eq!(me.body["email"], "a@x.com");
    assert_eq!(me.body["name"], "Admin");
    assert_eq!(me.body["role"], "admin");
    assert!(me.body.get("password_hash").is_none());
}

#[tokio::test]
async fn test_register_defaults_to_student() {
    let app = TestApp::new().await;

    let registered = app
        .post(
            "/api/auth/register",
            None,
            json!({ "email": "s@x.com", "password": "secret1", "name": "Stu" }),
        )
        .await;
    assert_eq!(registered.status, StatusCode::CREATED);
    assert_eq!(registered.body["user"]["role"], "student");
}

#[tokio::test]
async fn test_register_validation_and_conflict() {
    let app = TestApp::new().await;

    let missing = app
        .post("/api/auth/register", None, json!({ "email": "a@x.com", "password": "secret1" }))
        .await;
    assert_eq!(missing.status, StatusCode::BAD_REQUEST);
    assert_eq!(missing.body["error"], "Email, password, and name are required");

    let short = app
        .post(
            "/api/auth/register",
            None,
            json!({ "email": "a@x.com", "password": "abc", "name": "A" }),
        )
        .await;
    assert_eq!(short.status, StatusCode::BAD_REQUEST);

    let bad_role = app
        .post(
            "/api/auth/register",
            None,
            json!({ "email": "a@x.com", "password": "secret1", "name": "A", "role": "superuser" }),
        )
        .await;
    assert_eq!(bad_role.status, StatusCode::BAD_REQUEST);

    // Taken email is a conflict regardless of the password
    app.seed_user("taken@x.com", UserRole::Student).await;
    let duplicate = app
        .post(
            "/api/auth/register",
            None,
            json!({ "email": "taken@x.com", "password": "secret1", "name": "Dup" }),
        )
        .await;
    assert_eq!(duplicate.status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_login_rejects_bad_credentials() {
    let app = TestApp::new().await;
    app.post(
        "/api/auth/register",
        None,
        json!({ "email": "t@x.com", "password": "secret1", "name": "T", "role": "teacher" }),
    )
    .await;

    let wrong_password = app
        .post("/api/auth/login", None, json!({ "email": "t@x.com", "password": "secret2" }))
        .await;
    assert_eq!(wrong_password.status, StatusCode::UNAUTHORIZED);

    let unknown = app
        .post("/api/auth/login", None, json!({ "email": "nobody@x.com", "password": "secret1" }))
        .await;
    assert_eq!(unknown.status, StatusCode::UNAUTHORIZED);

    // Same message either way so accounts cannot be probed
    assert_eq!(wrong_password.body["error"], unknown.body["error"]);

    let missing = app.post("/api/auth/login", None, json!({ "email": "t@x.com" })).await;
    assert_eq!(missing.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_cookie_takes_precedence_over_bearer() {
    let app = TestApp::new().await;
    let user = app.seed_user("c@x.com", UserRole::Student).await;

    let via_cookie = warp::test::request()
        .method("GET")
        .path("/api/auth/me")
        .header("cookie", format!("auth_token={}", user.token))
        .header("authorization", "Bearer not-a-token")
        .reply(&coursehub::routes(app.state.clone()))
        .await;
    assert_eq!(via_cookie.status(), StatusCode::OK);

    let bad_cookie = warp::test::request()
        .method("GET")
        .path("/api/auth/me")
        .header("cookie", "auth_token=not-a-token")
        .header("authorization", format!("Bearer {}", user.token))
        .reply(&coursehub::routes(app.state.clone()))
        .await;
    assert_eq!(bad_cookie.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_invalid_tokens_are_unauthenticated() {
    let app = TestApp::new().await;
    let user = app.seed_user("v@x.com", UserRole::Student).await;

    assert_eq!(app.get("/api/auth/me", None).await.status, StatusCode::UNAUTHORIZED);

    let expired = app.state.codec().issue(&user.id, Duration::ZERO).unwrap();
    assert_eq!(
        app.get("/api/auth/me", Some(&expired)).await.status,
        StatusCode::UNAUTHORIZED
    );

    let mut tampered = user.token.clone();
    tampered.push('x');
    assert_eq!(
        app.get("/api/auth/me", Some(&tampered)).await.status,
        StatusCode::UNAUTHORIZED
    );

    // Signed with another secret
    let foreign = TokenCodec::new(&AuthConfig::with_secret("some-other-signing-key-abcdefghijkl"))
        .issue_default(&user.id)
        .unwrap();
    assert_eq!(
        app.get("/api/auth/me", Some(&foreign)).await.status,
        StatusCode::UNAUTHORIZED
    );

    // A valid token for a deleted account resolves to nobody
    assert!(app.db().users().delete(&user.id).await.unwrap());
    assert_eq!(
        app.get("/api/auth/me", Some(&user.token)).await.status,
        StatusCode::UNAUTHORIZED
    );
}

#[tokio::test]
async fn test_role_changes_apply_to_existing_tokens() {
    let app = TestApp::new().await;
    let admin = app.seed_user("admin@x.com", UserRole::Admin).await;
    let user = app.seed_user("p@x.com", UserRole::Student).await;

    assert_eq!(app.get("/api/users", Some(&user.token)).await.status, StatusCode::FORBIDDEN);

    let promoted = app
        .put(&format!("/api/users/{}", user.id), Some(&admin.token), json!({ "role": "admin" }))
        .await;
    assert_eq!(promoted.status, StatusCode::OK);

    assert_eq!(app.get("/api/users", Some(&user.token)).await.status, StatusCode::OK);
}

#[tokio::test]
async fn test_logout_clears_cookie() {
    let app = TestApp::new().await;

    let response = app.post("/api/auth/logout", None, json!({})).await;
    assert_eq!(response.status, StatusCode::OK);
    let cookie = response.headers["set-cookie"].to_str().unwrap();
    assert!(cookie.starts_with("auth_token=;"));
    assert!(cookie.contains("Max-Age=0"));
}

#[tokio::test]
async fn test_malformed_requests() {
    let app = TestApp::new().await;

    let bad_json = warp::test::request()
        .method("POST")
        .path("/api/auth/login")
        .header("content-type", "application/json")
        .body("{not json")
        .reply(&coursehub::routes(app.state.clone()))
        .await;
    assert_eq!(bad_json.status(), StatusCode::BAD_REQUEST);
    let body: serde_json::Value = serde_json::from_slice(bad_json.body()).unwrap();
    assert_eq!(body["error"], "Invalid request body");

    let unknown = app.get("/api/nothing-here", None).await;
    assert_eq!(unknown.status, StatusCode::NOT_FOUND);
    assert_eq!(unknown.body["error"], "Not found");

    let wrong_method = app.get("/api/auth/login", None).await;
    assert_eq!(wrong_method.status, StatusCode::METHOD_NOT_ALLOWED);
}

#[tokio::test]
async fn test_api_responses_carry_security_headers() {
    let app = TestApp::new().await;

    let response = app.get("/api/courses", None).await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.headers["x-content-type-options"], "nosniff");
    assert_eq!(response.headers["x-frame-options"], "DENY");

    let denied = app.get("/api/auth/me", None).await;
    assert_eq!(denied.headers["x-content-type-options"], "nosniff");
}

#[tokio::test]
async fn test_health_check() {
    let app = TestApp::new().await;

    let response = warp::test::request()
        .method("GET")
        .path("/health")
        .reply(&coursehub::routes(app.state.clone()))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.body().as_ref(), b"OK");
}
