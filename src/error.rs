use askama::Template;
use axum::extract::multipart::MultipartError;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};

use crate::media::MediaError;
use crate::textgen::TextGenError;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Not found")]
    NotFound,

    /// Carries the path the visitor was trying to reach.
    #[error("Login required")]
    LoginRequired(String),

    #[error("Forbidden")]
    Forbidden,

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Pool error: {0}")]
    Pool(#[from] r2d2::Error),

    #[error("Template error: {0}")]
    Template(#[from] askama::Error),

    #[error("Media error: {0}")]
    Media(#[from] MediaError),

    #[error("Text generation failed: {0}")]
    TextGen(#[from] TextGenError),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<MultipartError> for AppError {
    fn from(e: MultipartError) -> Self {
        AppError::BadRequest(format!("Malformed form upload: {}", e.body_text()))
    }
}

#[derive(Template)]
#[template(path = "pages/not_found.html")]
pub struct NotFoundTemplate {
    pub viewer: Option<String>,
    pub path: String,
}

/// The dedicated not-found page, with the navigation for `viewer`.
pub fn not_found_page(viewer: Option<String>, path: String) -> Response {
    match (NotFoundTemplate { viewer, path }).render() {
        Ok(body) => (
            StatusCode::NOT_FOUND,
            [(header::CONTENT_TYPE, "text/html; charset=utf-8")],
            body,
        )
            .into_response(),
        Err(e) => {
            tracing::error!("Template render error: {}", e);
            (StatusCode::NOT_FOUND, "Not found").into_response()
        }
    }
}

/// Where anonymous visitors are sent, with a `next` pointing back.
pub fn login_url(next: &str) -> String {
    let encoded: String = url::form_urlencoded::byte_serialize(next.as_bytes()).collect();
    format!("/auth/login/?next={}", encoded)
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            AppError::NotFound => return not_found_page(None, String::new()),
            AppError::LoginRequired(next) => {
                return (StatusCode::FOUND, [(header::LOCATION, login_url(next))]).into_response();
            }
            AppError::Forbidden => (StatusCode::FORBIDDEN, "Forbidden".to_string()),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            AppError::TextGen(e) => {
                tracing::error!("Text generation error: {}", e);
                (
                    StatusCode::BAD_GATEWAY,
                    "Text generation service unavailable".to_string(),
                )
            }
            AppError::Database(_)
            | AppError::Pool(_)
            | AppError::Template(_)
            | AppError::Media(_)
            | AppError::Internal(_) => {
                tracing::error!("{}", self);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
        };

        (status, message).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;
