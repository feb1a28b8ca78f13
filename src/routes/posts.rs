use askama::Template;
use axum::extract::{Multipart, Path, Query, State};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Form, Router};

use crate::db::models::{Comment, Group, Post, User};
use crate::db::posts::PostFilter;
use crate::db::{comments, follows, groups, posts, users};
use crate::error::{AppError, AppResult};
use crate::extractors::{CurrentUser, MaybeUser};
use crate::forms::{CommentForm, FormErrors, ImageChange, PostForm};
use crate::media;
use crate::pagination::{Page, PageQuery};
use crate::routes::home::Html;
use crate::routes::{found, parse_id, post_url, profile_url};
use crate::state::AppState;

// --- Templates ---

#[derive(Template)]
#[template(path = "pages/group_list.html")]
pub struct GroupTemplate {
    pub viewer: Option<String>,
    pub group: Group,
    pub page: Page<Post>,
}

#[derive(Template)]
#[template(path = "pages/profile.html")]
pub struct ProfileTemplate {
    pub viewer: Option<String>,
    pub author: User,
    pub page: Page<Post>,
    pub following: bool,
    pub is_self: bool,
    pub follower_count: i64,
}

#[derive(Template)]
#[template(path = "pages/post_detail.html")]
pub struct PostDetailTemplate {
    pub viewer: Option<String>,
    pub post: Post,
    pub comments: Vec<Comment>,
    pub can_edit: bool,
    pub comment_text: String,
    pub errors: FormErrors,
}

/// One option of the group select box.
pub struct GroupChoice {
    pub id: i64,
    pub title: String,
    pub selected: bool,
}

#[derive(Template)]
#[template(path = "pages/create_post.html")]
pub struct PostFormTemplate {
    pub viewer: Option<String>,
    /// Set when editing an existing post.
    pub post_id: Option<i64>,
    pub text: String,
    pub groups: Vec<GroupChoice>,
    pub current_image: Option<String>,
    pub errors: FormErrors,
}

impl PostFormTemplate {
    fn new(
        viewer: &CurrentUser,
        post_id: Option<i64>,
        text: String,
        selected_group: Option<&str>,
        all_groups: &[Group],
        current_image: Option<String>,
        errors: FormErrors,
    ) -> Self {
        let groups = all_groups
            .iter()
            .map(|g| GroupChoice {
                id: g.id,
                title: g.title.clone(),
                selected: selected_group == Some(g.id.to_string().as_str()),
            })
            .collect();
        Self {
            viewer: Some(viewer.username.clone()),
            post_id,
            text,
            groups,
            current_image,
            errors,
        }
    }

    pub fn is_edit(&self) -> bool {
        self.post_id.is_some()
    }
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/group/{slug}/", get(group_posts))
        .route("/profile/{username}/", get(profile))
        .route("/posts/{id}/", get(post_detail).post(post_detail_submit))
        .route("/posts/{id}/edit/", get(edit_form).post(edit_submit))
        .route("/posts/{id}/comment/", post(add_comment))
        .route("/create/", get(create_form).post(create_submit))
}

// --- Listings ---

/// GET /group/{slug}/
pub async fn group_posts(
    State(state): State<AppState>,
    maybe_user: MaybeUser,
    Path(slug): Path<String>,
    Query(query): Query<PageQuery>,
) -> AppResult<Response> {
    let (group, page) = {
        let conn = state.db.get()?;
        let group = groups::find_by_slug(&conn, &slug)?.ok_or(AppError::NotFound)?;
        let page = posts::page_of_posts(
            &conn,
            PostFilter::Group(group.id),
            state.config.posts.page_size,
            query.page.as_deref(),
        )?;
        (group, page)
    };

    Ok(Html(GroupTemplate {
        viewer: maybe_user.viewer(),
        group,
        page,
    })
    .into_response())
}

/// GET /profile/{username}/
pub async fn profile(
    State(state): State<AppState>,
    maybe_user: MaybeUser,
    Path(username): Path<String>,
    Query(query): Query<PageQuery>,
) -> AppResult<Response> {
    let conn = state.db.get()?;
    let author = users::find_by_username(&conn, &username)?.ok_or(AppError::NotFound)?;
    let page = posts::page_of_posts(
        &conn,
        PostFilter::Author(author.id),
        state.config.posts.page_size,
        query.page.as_deref(),
    )?;

    let (following, is_self) = match &maybe_user.0 {
        Some(viewer) => (
            follows::is_following(&conn, viewer.id, author.id)?,
            viewer.id == author.id,
        ),
        None => (false, false),
    };
    let follower_count = follows::follower_count(&conn, author.id)?;

    Ok(Html(ProfileTemplate {
        viewer: maybe_user.viewer(),
        author,
        page,
        following,
        is_self,
        follower_count,
    })
    .into_response())
}

// --- Detail and comments ---

fn render_detail(
    state: &AppState,
    viewer: Option<&CurrentUser>,
    id: i64,
    comment_text: String,
    errors: FormErrors,
) -> AppResult<Response> {
    let conn = state.db.get()?;
    let post = posts::find_post(&conn, id)?.ok_or(AppError::NotFound)?;
    let comments = comments::list_for_post(&conn, id)?;
    let can_edit = viewer.is_some_and(|v| v.id == post.author.id);

    Ok(Html(PostDetailTemplate {
        viewer: viewer.map(|v| v.username.clone()),
        post,
        comments,
        can_edit,
        comment_text,
        errors,
    })
    .into_response())
}

/// GET /posts/{id}/
pub async fn post_detail(
    State(state): State<AppState>,
    maybe_user: MaybeUser,
    Path(id): Path<String>,
) -> AppResult<Response> {
    let id = parse_id(&id)?;
    render_detail(&state, maybe_user.0.as_ref(), id, String::new(), FormErrors::default())
}

/// POST /posts/{id}/: binds the comment form and shows its errors. Nothing
/// is saved here; comments are stored through `/posts/{id}/comment/`.
pub async fn post_detail_submit(
    State(state): State<AppState>,
    maybe_user: MaybeUser,
    Path(id): Path<String>,
    Form(form): Form<CommentForm>,
) -> AppResult<Response> {
    let id = parse_id(&id)?;
    let errors = form.validate().err().unwrap_or_default();
    render_detail(&state, maybe_user.0.as_ref(), id, form.text, errors)
}

/// POST /posts/{id}/comment/: always lands back on the post. An invalid
/// comment is dropped without a message.
pub async fn add_comment(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<String>,
    Form(form): Form<CommentForm>,
) -> AppResult<Response> {
    let id = parse_id(&id)?;
    let conn = state.db.get()?;
    if posts::find_post(&conn, id)?.is_none() {
        return Err(AppError::NotFound);
    }

    match form.validate() {
        Ok(comment) => {
            comments::create_comment(&conn, id, user.id, &comment.text)?;
            tracing::info!(post = id, user = %user.username, "Comment added");
        }
        Err(_) => tracing::debug!(post = id, "Dropped empty comment"),
    }

    Ok(found(&post_url(id)))
}

// --- Create ---

/// GET /create/
pub async fn create_form(State(state): State<AppState>, user: CurrentUser) -> AppResult<Response> {
    let all_groups = {
        let conn = state.db.get()?;
        groups::list_groups(&conn)?
    };

    Ok(Html(PostFormTemplate::new(
        &user,
        None,
        String::new(),
        None,
        &all_groups,
        None,
        FormErrors::default(),
    ))
    .into_response())
}

/// POST /create/
pub async fn create_submit(
    State(state): State<AppState>,
    user: CurrentUser,
    multipart: Multipart,
) -> AppResult<Response> {
    let form = PostForm::from_multipart(multipart).await?;
    let all_groups = {
        let conn = state.db.get()?;
        groups::list_groups(&conn)?
    };

    let valid = match form.validate(&all_groups) {
        Ok(valid) => valid,
        Err((form, errors)) => {
            return Ok(Html(PostFormTemplate::new(
                &user,
                None,
                form.text,
                form.group.as_deref(),
                &all_groups,
                None,
                errors,
            ))
            .into_response());
        }
    };

    let image = match &valid.image {
        ImageChange::Replace(upload) => Some(media::save_post_image(&state.media_dir, upload).await?),
        ImageChange::Keep | ImageChange::Clear => None,
    };

    let id = {
        let conn = state.db.get()?;
        posts::create_post(&conn, user.id, &valid.text, valid.group_id, image.as_deref())?
    };
    tracing::info!(post = id, author = %user.username, "Post created");

    Ok(found(&profile_url(&user.username)))
}

// --- Edit ---

fn load_for_edit(state: &AppState, id: i64) -> AppResult<(Post, Vec<Group>)> {
    let conn = state.db.get()?;
    let post = posts::find_post(&conn, id)?.ok_or(AppError::NotFound)?;
    let all_groups = groups::list_groups(&conn)?;
    Ok((post, all_groups))
}

/// GET /posts/{id}/edit/: authors only; anyone else is sent to the post.
pub async fn edit_form(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<String>,
) -> AppResult<Response> {
    let id = parse_id(&id)?;
    let (post, all_groups) = load_for_edit(&state, id)?;
    if post.author.id != user.id {
        return Ok(found(&post_url(id)));
    }

    let selected = post.group.as_ref().map(|g| g.id.to_string());
    Ok(Html(PostFormTemplate::new(
        &user,
        Some(id),
        post.text.clone(),
        selected.as_deref(),
        &all_groups,
        post.image_url(),
        FormErrors::default(),
    ))
    .into_response())
}

/// POST /posts/{id}/edit/
pub async fn edit_submit(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<String>,
    multipart: Multipart,
) -> AppResult<Response> {
    let id = parse_id(&id)?;
    let (post, all_groups) = load_for_edit(&state, id)?;
    if post.author.id != user.id {
        tracing::info!(post = id, user = %user.username, "Edit refused for non-author");
        return Ok(found(&post_url(id)));
    }

    let form = PostForm::from_multipart(multipart).await?;
    let valid = match form.validate(&all_groups) {
        Ok(valid) => valid,
        Err((form, errors)) => {
            return Ok(Html(PostFormTemplate::new(
                &user,
                Some(id),
                form.text,
                form.group.as_deref(),
                &all_groups,
                post.image_url(),
                errors,
            ))
            .into_response());
        }
    };

    let image = match &valid.image {
        ImageChange::Keep => post.image.clone(),
        ImageChange::Clear => None,
        ImageChange::Replace(upload) => Some(media::save_post_image(&state.media_dir, upload).await?),
    };

    {
        let conn = state.db.get()?;
        posts::update_post(&conn, id, &valid.text, valid.group_id, image.as_deref())?;
    }
    tracing::info!(post = id, "Post updated");

    Ok(found(&post_url(id)))
}
