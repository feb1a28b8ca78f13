use axum::extract::{Path, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};

use crate::error::{AppError, AppResult};
use crate::media;
use crate::state::AppState;

/// GET /media/{*path}: uploaded post images.
pub async fn serve(State(state): State<AppState>, Path(path): Path<String>) -> AppResult<Response> {
    let file_path = media::resolve(&state.media_dir, &path).map_err(|_| AppError::NotFound)?;

    let data = match tokio::fs::read(&file_path).await {
        Ok(data) => data,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Err(AppError::NotFound),
        Err(e) => return Err(media::MediaError::from(e).into()),
    };

    let mime = mime_guess::from_path(&file_path).first_or_octet_stream();
    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, mime.as_ref().to_string()),
            (header::CACHE_CONTROL, "public, max-age=86400".to_string()),
        ],
        data,
    )
        .into_response())
}
