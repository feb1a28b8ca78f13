#![allow(dead_code)]

use std::sync::Arc;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, Request, Response, StatusCode};
use axum::Router;
use tempfile::TempDir;
use tower::ServiceExt;

use quill::auth::session;
use quill::config::Config;
use quill::db::{self, groups, users};
use quill::state::AppState;
use quill::textgen::{TextGenError, TextGenerator};

pub const BOUNDARY: &str = "quill-test-boundary";

/// Echoes the seed back so tests can tell what was sent.
pub struct FakeTextGenerator;

#[async_trait]
impl TextGenerator for FakeTextGenerator {
    async fn generate(&self, seed: &str) -> Result<String, TextGenError> {
        Ok(format!("and then {seed} went on"))
    }
}

pub struct FailingTextGenerator;

#[async_trait]
impl TextGenerator for FailingTextGenerator {
    async fn generate(&self, _seed: &str) -> Result<String, TextGenError> {
        Err(TextGenError::MissingField)
    }
}

/// A running site backed by a scratch data directory.
pub struct TestSite {
    pub state: AppState,
    pub app: Router,
    _dir: TempDir,
}

impl TestSite {
    pub fn new() -> Self {
        Self::with_textgen(Arc::new(FakeTextGenerator))
    }

    pub fn with_textgen(textgen: Arc<dyn TextGenerator>) -> Self {
        let dir = TempDir::new().unwrap();
        let mut config = Config::default();
        config.resolve_paths(dir.path());
        config.auth.bcrypt_cost = 4;

        let pool = db::create_pool(&config.db_path()).expect("Failed to create test database");
        db::run_migrations(&pool).expect("Failed to run migrations");

        let state = AppState::new(pool, config, textgen);
        let app = quill::routes::router(state.clone());
        Self {
            state,
            app,
            _dir: dir,
        }
    }

    pub fn create_user(&self, username: &str) -> i64 {
        let conn = self.state.db.get().unwrap();
        users::create_user(&conn, username, "unused-hash", false).unwrap()
    }

    pub fn create_admin(&self, username: &str) -> i64 {
        let conn = self.state.db.get().unwrap();
        users::create_user(&conn, username, "unused-hash", true).unwrap()
    }

    /// Cookie header value that authenticates as `user_id`.
    pub fn login_cookie(&self, user_id: i64) -> String {
        let conn = self.state.db.get().unwrap();
        let token = session::create_session(&conn, user_id, 1).unwrap();
        format!("{}={}", self.state.config.auth.cookie_name, token)
    }

    pub fn create_group(&self, title: &str, slug: &str) -> i64 {
        let conn = self.state.db.get().unwrap();
        groups::create_group(&conn, title, slug, "").unwrap()
    }

    pub fn create_post(&self, author_id: i64, text: &str, group_id: Option<i64>) -> i64 {
        let conn = self.state.db.get().unwrap();
        quill::db::posts::create_post(&conn, author_id, text, group_id, None).unwrap()
    }

    pub fn post_count(&self) -> i64 {
        let conn = self.state.db.get().unwrap();
        conn.query_row("SELECT COUNT(*) FROM posts", [], |row| row.get(0))
            .unwrap()
    }

    pub async fn send(&self, request: Request<Body>) -> Response<Body> {
        self.app.clone().oneshot(request).await.unwrap()
    }

    pub async fn get(&self, uri: &str, cookie: Option<&str>) -> Response<Body> {
        let mut builder = Request::builder().uri(uri);
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        self.send(builder.body(Body::empty()).unwrap()).await
    }

    pub async fn post_form(&self, uri: &str, cookie: Option<&str>, body: &str) -> Response<Body> {
        let mut builder = Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded");
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        self.send(builder.body(Body::from(body.to_string())).unwrap())
            .await
    }

    pub async fn post_multipart(&self, uri: &str, cookie: &str, body: Vec<u8>) -> Response<Body> {
        let request = Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::COOKIE, cookie)
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from(body))
            .unwrap();
        self.send(request).await
    }
}

/// Builds a multipart/form-data body.
#[derive(Default)]
pub struct MultipartBody {
    buf: Vec<u8>,
}

impl MultipartBody {
    pub fn text(mut self, name: &str, value: &str) -> Self {
        self.buf.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
            )
            .as_bytes(),
        );
        self
    }

    pub fn file(mut self, name: &str, file_name: &str, content_type: &str, data: &[u8]) -> Self {
        self.buf.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"; filename=\"{file_name}\"\r\nContent-Type: {content_type}\r\n\r\n"
            )
            .as_bytes(),
        );
        self.buf.extend_from_slice(data);
        self.buf.extend_from_slice(b"\r\n");
        self
    }

    pub fn finish(mut self) -> Vec<u8> {
        self.buf
            .extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
        self.buf
    }
}

pub async fn body_text(response: Response<Body>) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

pub fn location(response: &Response<Body>) -> &str {
    assert_eq!(response.status(), StatusCode::FOUND);
    response.headers()[header::LOCATION].to_str().unwrap()
}

/// A few bytes that start like a JPEG. Validation only looks at the
/// name and declared type.
pub const SMALL_JPEG: &[u8] = &[0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10, 0x4A, 0x46, 0x49, 0x46];
