#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::Arc;

use axum::Router;
use axum::body::{Body, to_bytes};
use axum::http::{Method, Request, StatusCode, header};
use serde_json::Value;
use tempfile::TempDir;
use tower::ServiceExt;

use exporterhub::auth::SessionCodec;
use exporterhub::server::{AppState, create_router};
use exporterhub::store::{SqliteStore, Store};
use exporterhub::types::Exporter;

pub use exporterhub::github::fake::FakeGithub;

pub const SECRET: &[u8] = b"integration-secret";

/// The full router over a temp SQLite database and a scripted GitHub.
pub struct TestApp {
    _temp_dir: TempDir,
    db_path: PathBuf,
    pub store: Arc<SqliteStore>,
    pub github: Arc<FakeGithub>,
    router: Router,
}

pub struct TestResponse {
    pub status: StatusCode,
    pub body: Value,
}

impl TestApp {
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("create temp dir");
        let db_path = temp_dir.path().join("test.db");
        let store = Arc::new(SqliteStore::new(&db_path).expect("open store"));
        store.initialize().expect("initialize schema");

        let github = Arc::new(FakeGithub::default());
        let sessions = SessionCodec::new(SECRET, None).expect("session codec");

        let state = Arc::new(AppState::new(store.clone(), github.clone(), sessions));

        Self {
            _temp_dir: temp_dir,
            db_path,
            store,
            github,
            router: create_router(state),
        }
    }

    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> TestResponse {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let request = match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string())),
            None => builder.body(Body::empty()),
        }
        .expect("build request");

        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("router is infallible");

        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("read body");
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or_else(|_| {
                Value::String(String::from_utf8_lossy(&bytes).into_owned())
            })
        };

        TestResponse { status, body }
    }

    pub async fn get(&self, uri: &str, token: &str) -> TestResponse {
        self.request(Method::GET, uri, Some(token), None).await
    }

    pub async fn post(&self, uri: &str, token: &str, body: Value) -> TestResponse {
        self.request(Method::POST, uri, Some(token), Some(body)).await
    }

    pub async fn patch(&self, uri: &str, token: &str, body: Value) -> TestResponse {
        self.request(Method::PATCH, uri, Some(token), Some(body)).await
    }

    pub async fn delete(&self, uri: &str, token: &str) -> TestResponse {
        self.request(Method::DELETE, uri, Some(token), None).await
    }

    /// Registers a GitHub account and logs it in, returning the session token.
    pub async fn login_as(&self, github_id: i64, login: &str) -> String {
        let credential = format!("gho_{login}");
        self.github.add_account(&credential, github_id, login);

        let response = self
            .request(
                Method::POST,
                "/api/v1/auth/login",
                None,
                Some(serde_json::json!({ "token": credential })),
            )
            .await;
        assert_eq!(response.status, StatusCode::OK, "login failed: {}", response.body);

        response.body["access_token"]
            .as_str()
            .expect("access token")
            .to_string()
    }

    /// Runs raw SQL on a separate connection to the test database.
    pub fn execute_sql(&self, sql: &str) {
        let conn = rusqlite::Connection::open(&self.db_path).expect("open database");
        conn.execute(sql, []).expect("execute sql");
    }

    pub fn add_exporter(&self, name: &str, repository_url: &str) -> i64 {
        self.store
            .create_exporter(&Exporter {
                id: 0,
                name: name.to_string(),
                repository_url: repository_url.to_string(),
                logo_url: None,
                category: Some("Database".to_string()),
                official: Some("Official".to_string()),
                description: Some(format!("{name} description")),
                stars: 0,
                recent_release: None,
            })
            .expect("create exporter")
    }

    pub fn role_of(&self, username: &str) -> String {
        self.store
            .get_user_by_username(username)
            .expect("query user")
            .expect("user exists")
            .role
            .to_string()
    }
}
