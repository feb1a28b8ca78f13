use askama::Template;
use axum::extract::{Query, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};

use crate::cache::PageCache;
use crate::db::models::Post;
use crate::db::posts::{self, PostFilter};
use crate::error::{AppError, AppResult};
use crate::extractors::MaybeUser;
use crate::pagination::{Page, PageQuery};
use crate::state::AppState;

#[derive(Template)]
#[template(path = "pages/index.html")]
pub struct IndexTemplate {
    pub viewer: Option<String>,
    pub page: Page<Post>,
}

/// Wrapper to render askama templates as axum responses
pub struct Html<T: Template>(pub T);

impl<T: Template> IntoResponse for Html<T> {
    fn into_response(self) -> Response {
        match self.0.render() {
            Ok(body) => (
                StatusCode::OK,
                [(header::CONTENT_TYPE, "text/html; charset=utf-8")],
                body,
            )
                .into_response(),
            Err(e) => {
                tracing::error!("Template render error: {}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "Template error").into_response()
            }
        }
    }
}

/// GET /: every post, newest first. The listing is cached, so new posts
/// may take up to one TTL window to show up here.
pub async fn index(
    State(state): State<AppState>,
    maybe_user: MaybeUser,
    Query(query): Query<PageQuery>,
) -> AppResult<Response> {
    let key = PageCache::home_page_key(query.page.as_deref());
    let db = state.db.clone();
    let per_page = state.config.posts.page_size;

    let page: Page<Post> = state
        .cache
        .get_or_compute(&key, move || async move {
            let conn = db.get()?;
            let page = posts::page_of_posts(&conn, PostFilter::All, per_page, query.page.as_deref())?;
            Ok::<_, AppError>(page)
        })
        .await?;

    Ok(Html(IndexTemplate {
        viewer: maybe_user.viewer(),
        page,
    })
    .into_response())
}
