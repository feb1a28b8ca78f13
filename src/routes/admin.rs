use axum::extract::State;
use axum::response::Response;
use axum::routing::post;
use axum::Router;

use crate::error::{AppError, AppResult};
use crate::extractors::CurrentUser;
use crate::routes::found;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/admin/cache/clear/", post(clear_cache))
}

/// POST /admin/cache/clear/: drop every cached page. Admins only.
pub async fn clear_cache(State(state): State<AppState>, user: CurrentUser) -> AppResult<Response> {
    if !user.is_admin {
        return Err(AppError::Forbidden);
    }
    state.cache.clear();
    tracing::info!(user = %user.username, "Cache cleared by admin");
    Ok(found("/"))
}
