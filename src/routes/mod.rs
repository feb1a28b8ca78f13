pub mod about;
pub mod admin;
pub mod assets;
pub mod auth;
pub mod follow;
pub mod home;
pub mod media;
pub mod posts;

use axum::extract::DefaultBodyLimit;
use axum::http::{header, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use tower_http::trace::TraceLayer;

use crate::error::{not_found_page, AppError};
use crate::extractors::MaybeUser;
use crate::state::AppState;

/// The whole site, ready to serve.
pub fn router(state: AppState) -> Router {
    let upload_limit = state.config.storage.max_upload_bytes;

    Router::new()
        .route("/", get(home::index))
        .route("/assets/{*path}", get(assets::serve))
        .route("/media/{*path}", get(media::serve))
        .merge(posts::router())
        .merge(follow::router())
        .merge(about::router())
        .merge(auth::router())
        .merge(admin::router())
        .fallback(not_found)
        .layer(DefaultBodyLimit::max(upload_limit))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn not_found(maybe_user: MaybeUser, uri: Uri) -> Response {
    not_found_page(maybe_user.viewer(), uri.path().to_string())
}

/// 302 to `location`.
pub fn found(location: &str) -> Response {
    (StatusCode::FOUND, [(header::LOCATION, location.to_string())]).into_response()
}

/// Ids come from the URL as text; anything that is not a number names no post.
pub fn parse_id(raw: &str) -> Result<i64, AppError> {
    raw.parse().map_err(|_| AppError::NotFound)
}

pub fn post_url(id: i64) -> String {
    format!("/posts/{}/", id)
}

pub fn profile_url(username: &str) -> String {
    let encoded: String = url::form_urlencoded::byte_serialize(username.as_bytes()).collect();
    format!("/profile/{}/", encoded)
}
