mod common;

use serde_json::json;
use warp::http::StatusCode;

use common::TestApp;
use coursehub::auth::user::UserRole;

#[tokio::test]
async fn test_user_endpoints_require_admin() {
    let app = TestApp::new().await;
    let teacher = app.seed_user("t@x.com", UserRole::Teacher).await;
    let target = format!("/api/users/{}", teacher.id);

    assert_eq!(app.get("/api/users", None).await.status, StatusCode::UNAUTHORIZED);

    let as_teacher = app.get("/api/users", Some(&teacher.token)).await;
    assert_eq!(as_teacher.status, StatusCode::FORBIDDEN);
    assert_eq!(as_teacher.body["error"], "Admin access required");

    assert_eq!(app.get(&target, Some(&teacher.token)).await.status, StatusCode::FORBIDDEN);
    assert_eq!(
        app.put(&target, Some(&teacher.token), json!({ "role": "admin" })).await.status,
        StatusCode::FORBIDDEN
    );
    assert_eq!(app.delete(&target, Some(&teacher.token)).await.status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_admin_manages_users() {
    let app = TestApp::new().await;
    let admin = app.seed_user("admin@x.com", UserRole::Admin).await;

    let created = app
        .post(
            "/api/users",
            Some(&admin.token),
            json!({ "email": "new@x.com", "name": "Newcomer", "role": "teacher", "password": "secret1" }),
        )
        .await;
    assert_eq!(created.status, StatusCode::CREATED);
    assert_eq!(created.body["user"]["role"], "teacher");
    assert!(created.body["user"].get("password_hash").is_none());
    let path = format!("/api/users/{}", created.body["id"].as_str().unwrap());

    let fetched = app.get(&path, Some(&admin.token)).await;
    assert_eq!(fetched.status, StatusCode::OK);
    assert_eq!(fetched.body["email"], "new@x.com");

    let renamed = app.put(&path, Some(&admin.token), json!({ "name": "Renamed" })).await;
    assert_eq!(renamed.status, StatusCode::OK);
    assert_eq!(renamed.body["user"]["name"], "Renamed");
    assert_eq!(renamed.body["user"]["role"], "teacher");

    // The created account can log in with its password
    let login = app
        .post("/api/auth/login", None, json!({ "email": "new@x.com", "password": "secret1" }))
        .await;
    assert_eq!(login.status, StatusCode::OK);

    let deleted = app.delete(&path, Some(&admin.token)).await;
    assert_eq!(deleted.status, StatusCode::OK);
    assert_eq!(app.get(&path, Some(&admin.token)).await.status, StatusCode::NOT_FOUND);
    assert_eq!(app.delete(&path, Some(&admin.token)).await.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_create_user_validation() {
    let app = TestApp::new().await;
    let admin = app.seed_user("admin@x.com", UserRole::Admin).await;

    let missing = app
        .post("/api/users", Some(&admin.token), json!({ "email": "x@x.com", "name": "X" }))
        .await;
    assert_eq!(missing.status, StatusCode::BAD_REQUEST);
    assert_eq!(missing.body["error"], "Email, name, role, and password are required");

    let bad_role = app
        .post(
            "/api/users",
            Some(&admin.token),
            json!({ "email": "x@x.com", "name": "X", "role": "owner", "password": "secret1" }),
        )
        .await;
    assert_eq!(bad_role.status, StatusCode::BAD_REQUEST);

    let duplicate = app
        .post(
            "/api/users",
            Some(&admin.token),
            json!({ "email": "admin@x.com", "name": "X", "role": "student", "password": "secret1" }),
        )
        .await;
    assert_eq!(duplicate.status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_update_user_edge_cases() {
    let app = TestApp::new().await;
    let admin = app.seed_user("admin@x.com", UserRole::Admin).await;
    let student = app.seed_user("s@x.com", UserRole::Student).await;
    let path = format!("/api/users/{}", student.id);

    let empty = app.put(&path, Some(&admin.token), json!({})).await;
    assert_eq!(empty.status, StatusCode::BAD_REQUEST);
    assert_eq!(empty.body["error"], "No fields to update");

    let missing = app
        .put(
            &format!("/api/users/{}", uuid::Uuid::new_v4()),
            Some(&admin.token),
            json!({ "name": "Ghost" }),
        )
        .await;
    assert_eq!(missing.status, StatusCode::NOT_FOUND);

    let taken_email = app
        .put(&path, Some(&admin.token), json!({ "email": "admin@x.com" }))
        .await;
    assert_eq!(taken_email.status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_list_users_filters() {
    let app = TestApp::new().await;
    let admin = app.seed_user("admin@x.com", UserRole::Admin).await;
    app.seed_user("t1@x.com", UserRole::Teacher).await;
    app.seed_user("t2@x.com", UserRole::Teacher).await;
    app.seed_user("s1@x.com", UserRole::Student).await;

    let all = app.get("/api/users", Some(&admin.token)).await;
    assert_eq!(all.status, StatusCode::OK);
    assert_eq!(all.body["pagination"]["total"], 4);

    let teachers = app.get("/api/users?role=teacher", Some(&admin.token)).await;
    assert_eq!(teachers.body["pagination"]["total"], 2);

    let search = app.get("/api/users?search=s1@", Some(&admin.token)).await;
    let users = search.body["users"].as_array().unwrap();
    assert_eq!(users.len(), 1);
    assert_eq!(users[0]["email"], "s1@x.com");
}
