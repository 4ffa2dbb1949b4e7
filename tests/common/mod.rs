//! Shared harness for the HTTP integration tests

#![allow(dead_code)]

use serde_json::Value;
use std::time::Duration;
use tempfile::TempDir;
use warp::http::StatusCode;

use coursehub::auth::user::UserRole;
use coursehub::config::{AuthConfig, ServerConfig};
use coursehub::routes;
use coursehub::server::AppState;
use coursehub::storage::Database;

pub const TEST_SECRET: &str = "integration-test-signing-key-0123456789";
pub const BOUNDARY: &str = "coursehub-test-boundary";

/// An app wired to a fresh in-memory database and a temporary upload directory
pub struct TestApp {
    pub state: AppState,
    pub uploads: TempDir,
}

/// A seeded account and a token for it
pub struct TestUser {
    pub id: String,
    pub token: String,
}

/// Decoded reply
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: warp::http::HeaderMap,
    pub body: Value,
}

impl TestApp {
    pub async fn new() -> Self {
        Self::with_upload_limit(1024 * 1024).await
    }

    pub async fn with_upload_limit(max_upload_bytes: u64) -> Self {
        let uploads = tempfile::tempdir().expect("temp upload dir");
        let mut config = ServerConfig::with_auth(AuthConfig::new(TEST_SECRET, Duration::from_secs(3600)));
        config.database_path = ":memory:".to_string();
        config.upload_dir = uploads.path().to_path_buf();
        config.max_upload_bytes = max_upload_bytes;

        let db = Database::connect(":memory:").await.expect("in-memory database");
        Self {
            state: AppState::new(config, db),
            uploads,
        }
    }

    pub fn db(&self) -> &Database {
        &self.state.db
    }

    /// Insert a user directly (skipping Argon2) and mint a token for them
    pub async fn seed_user(&self, email: &str, role: UserRole) -> TestUser {
        let user = self
            .db()
            .users()
            .create(email, "not-a-real-hash", email, role)
            .await
            .expect("seed user");
        let token = self.state.codec().issue_default(&user.id).expect("token");
        TestUser { id: user.id, token }
    }

    /// Insert a course directly
    pub async fn seed_course(&self, teacher_id: &str, title: &str, published: bool) -> String {
        self.db()
            .courses()
            .create(&coursehub::storage::courses::CourseFields {
                teacher_id: teacher_id.to_string(),
                title: title.to_string(),
                description: format!("{} description", title),
                is_published: published,
            })
            .await
            .expect("seed course")
            .id
    }

    pub async fn request(
        &self,
        method: &str,
        path: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> TestResponse {
        let mut request = warp::test::request().method(method).path(path);
        if let Some(token) = token {
            request = request.header("authorization", format!("Bearer {}", token));
        }
        if let Some(body) = body {
            request = request.json(&body);
        }
        let response = request.reply(&routes(self.state.clone())).await;
        decode(response)
    }

    pub async fn get(&self, path: &str, token: Option<&str>) -> TestResponse {
        self.request("GET", path, token, None).await
    }

    pub async fn post(&self, path: &str, token: Option<&str>, body: Value) -> TestResponse {
        self.request("POST", path, token, Some(body)).await
    }

    pub async fn put(&self, path: &str, token: Option<&str>, body: Value) -> TestResponse {
        self.request("PUT", path, token, Some(body)).await
    }

    pub async fn delete(&self, path: &str, token: Option<&str>) -> TestResponse {
        self.request("DELETE", path, token, None).await
    }

    /// Send a multipart form; `fields` are plain text parts, `file` is (filename, contents)
    pub async fn upload(
        &self,
        token: Option<&str>,
        fields: &[(&str, &str)],
        file: Option<(&str, &[u8])>,
    ) -> TestResponse {
        let mut request = warp::test::request()
            .method("POST")
            .path("/api/files/upload")
            .header(
                "content-type",
                format!("multipart/form-data; boundary={}", BOUNDARY),
            )
            .body(multipart_body(fields, file));
        if let Some(token) = token {
            request = request.header("authorization", format!("Bearer {}", token));
        }
        let response = request.reply(&routes(self.state.clone())).await;
        decode(response)
    }
}

pub fn multipart_body(fields: &[(&str, &str)], file: Option<(&str, &[u8])>) -> Vec<u8> {
    let mut body = Vec::new();
    for (name, value) in fields {
        body.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: form-data; name=\"{}\"\r\n\r\n{}\r\n",
                BOUNDARY, name, value
            )
            .as_bytes(),
        );
    }
    if let Some((filename, contents)) = file {
        body.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"{}\"\r\nContent-Type: application/octet-stream\r\n\r\n",
                BOUNDARY, filename
            )
            .as_bytes(),
        );
        body.extend_from_slice(contents);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());
    body
}

fn decode(response: warp::http::Response<warp::hyper::body::Bytes>) -> TestResponse {
    let status = response.status();
    let headers = response.headers().clone();
    let body = serde_json::from_slice(response.body()).unwrap_or(Value::Null);
    TestResponse {
        status,
        headers,
        body,
    }
}
