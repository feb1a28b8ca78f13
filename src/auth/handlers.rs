use askama::Template;
use axum::extract::{Query, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Form;
use serde::Deserialize;

use crate::auth::{password, session};
use crate::db::users;
use crate::error::AppResult;
use crate::extractors::MaybeUser;
use crate::forms::{FormErrors, LoginForm, SignupForm};
use crate::routes::home::Html;
use crate::state::AppState;

pub const BAD_CREDENTIALS: &str =
    "Please enter a correct username and password. Note that both fields may be case-sensitive.";
pub const USERNAME_TAKEN: &str = "A user with that username already exists.";

// -- Templates --

#[derive(Template)]
#[template(path = "pages/login.html")]
pub struct LoginTemplate {
    pub viewer: Option<String>,
    pub username: String,
    pub next: String,
    pub error: Option<String>,
}

#[derive(Template)]
#[template(path = "pages/signup.html")]
pub struct SignupTemplate {
    pub viewer: Option<String>,
    pub username: String,
    pub errors: FormErrors,
}

#[derive(Deserialize)]
pub struct NextQuery {
    pub next: Option<String>,
}

/// Only same-site relative paths are honoured as a post-login target.
pub fn safe_next(next: Option<&str>) -> String {
    match next {
        Some(path) if path.starts_with('/') && !path.starts_with("//") && !path.contains('\\') => {
            path.to_string()
        }
        _ => "/".to_string(),
    }
}

fn redirect_with_cookie(location: &str, cookie: String) -> Response {
    (
        StatusCode::FOUND,
        [
            (header::LOCATION, location.to_string()),
            (header::SET_COOKIE, cookie),
        ],
    )
        .into_response()
}

/// GET /auth/login/
pub async fn login_page(maybe_user: MaybeUser, Query(query): Query<NextQuery>) -> Response {
    Html(LoginTemplate {
        viewer: maybe_user.viewer(),
        username: String::new(),
        next: safe_next(query.next.as_deref()),
        error: None,
    })
    .into_response()
}

/// POST /auth/login/
pub async fn login(State(state): State<AppState>, Form(form): Form<LoginForm>) -> AppResult<Response> {
    let username = form.username.trim().to_string();
    let next = safe_next(form.next.as_deref());

    let credentials = {
        let conn = state.db.get()?;
        users::find_credentials(&conn, &username)?
    };

    let user = match credentials {
        Some((user, hash)) => password::verify_password(form.password, hash)
            .await?
            .then_some(user),
        None => None,
    };

    let Some(user) = user else {
        tracing::info!(username = %username, "Rejected login");
        return Ok(Html(LoginTemplate {
            viewer: None,
            username,
            next,
            error: Some(BAD_CREDENTIALS.to_string()),
        })
        .into_response());
    };

    let token = {
        let conn = state.db.get()?;
        session::create_session(&conn, user.id, state.config.auth.session_hours)?
    };
    tracing::info!(user = %user.username, "Logged in");

    let cookie = session::session_cookie(
        &state.config.auth.cookie_name,
        &token,
        state.config.auth.session_hours,
    );
    Ok(redirect_with_cookie(&next, cookie))
}

/// GET /auth/signup/
pub async fn signup_page(maybe_user: MaybeUser) -> Response {
    Html(SignupTemplate {
        viewer: maybe_user.viewer(),
        username: String::new(),
        errors: FormErrors::default(),
    })
    .into_response()
}

/// POST /auth/signup/: create the account and sign it in.
pub async fn signup(State(state): State<AppState>, Form(form): Form<SignupForm>) -> AppResult<Response> {
    let username = form.username.trim().to_string();

    let mut errors = form.validate().err().unwrap_or_default();
    if errors.get("username").is_none() {
        let conn = state.db.get()?;
        if users::username_taken(&conn, &username)? {
            errors.add("username", USERNAME_TAKEN);
        }
    }

    if !errors.is_empty() {
        return Ok(Html(SignupTemplate {
            viewer: None,
            username,
            errors,
        })
        .into_response());
    }

    let hash = password::hash_password(form.password, state.config.auth.bcrypt_cost).await?;

    let token = {
        let conn = state.db.get()?;
        let user_id = users::create_user(&conn, &username, &hash, false)?;
        session::create_session(&conn, user_id, state.config.auth.session_hours)?
    };
    tracing::info!(user = %username, "Signed up");

    let cookie = session::session_cookie(
        &state.config.auth.cookie_name,
        &token,
        state.config.auth.session_hours,
    );
    Ok(redirect_with_cookie("/", cookie))
}

/// POST /auth/logout/
pub async fn logout(State(state): State<AppState>, headers: HeaderMap) -> AppResult<Response> {
    let cookie_name = &state.config.auth.cookie_name;

    if let Some(token) = session::cookie_value(&headers, cookie_name) {
        let conn = state.db.get()?;
        if let Err(e) = session::delete_session(&conn, token) {
            tracing::warn!("Failed to delete session: {}", e);
        }
    }

    Ok(redirect_with_cookie("/", session::clear_session_cookie(cookie_name)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn safe_next_accepts_local_paths_only() {
        assert_eq!(safe_next(Some("/create/")), "/create/");
        assert_eq!(safe_next(Some("/posts/3/?page=2")), "/posts/3/?page=2");
        assert_eq!(safe_next(Some("//evil.example/")), "/");
        assert_eq!(safe_next(Some("https://evil.example/")), "/");
        assert_eq!(safe_next(Some("/\\evil.example")), "/");
        assert_eq!(safe_next(None), "/");
    }
}
