use askama::Template;
use axum::extract::{Path, Query, State};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::Router;

use crate::db::models::Post;
use crate::db::posts::{self, PostFilter};
use crate::db::{follows, users};
use crate::error::{AppError, AppResult};
use crate::extractors::CurrentUser;
use crate::pagination::{Page, PageQuery};
use crate::routes::home::Html;
use crate::routes::{found, profile_url};
use crate::state::AppState;

#[derive(Template)]
#[template(path = "pages/follow.html")]
pub struct FollowTemplate {
    pub viewer: Option<String>,
    pub page: Page<Post>,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/follow/", get(follow_index))
        .route("/profile/{username}/follow/", post(profile_follow))
        .route("/profile/{username}/unfollow/", post(profile_unfollow))
}

/// GET /follow/: posts by everyone the current user follows.
pub async fn follow_index(
    State(state): State<AppState>,
    user: CurrentUser,
    Query(query): Query<PageQuery>,
) -> AppResult<Response> {
    let page = {
        let conn = state.db.get()?;
        posts::page_of_posts(
            &conn,
            PostFilter::FollowedBy(user.id),
            state.config.posts.page_size,
            query.page.as_deref(),
        )?
    };

    Ok(Html(FollowTemplate {
        viewer: Some(user.username),
        page,
    })
    .into_response())
}

/// POST /profile/{username}/follow/: following yourself is ignored.
pub async fn profile_follow(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(username): Path<String>,
) -> AppResult<Response> {
    let conn = state.db.get()?;
    let author = users::find_by_username(&conn, &username)?.ok_or(AppError::NotFound)?;

    if author.id != user.id && follows::follow(&conn, user.id, author.id)? {
        tracing::info!(user = %user.username, author = %author.username, "Followed");
    }

    Ok(found(&profile_url(&author.username)))
}

/// POST /profile/{username}/unfollow/
pub async fn profile_unfollow(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(username): Path<String>,
) -> AppResult<Response> {
    let conn = state.db.get()?;
    let author = users::find_by_username(&conn, &username)?.ok_or(AppError::NotFound)?;

    if follows::unfollow(&conn, user.id, author.id)? {
        tracing::info!(user = %user.username, author = %author.username, "Unfollowed");
    }

    Ok(found(&profile_url(&author.username)))
}
