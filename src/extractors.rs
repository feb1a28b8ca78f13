use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use crate::auth::session;
use crate::error::AppError;
use crate::state::AppState;

/// Represents the currently authenticated user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrentUser {
    pub id: i64,
    pub username: String,
    pub is_admin: bool,
}

/// Extractor that requires authentication.
/// Anonymous visitors are redirected to the login page with a `next`
/// pointing back at the page they asked for.
impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let next = parts
            .uri
            .path_and_query()
            .map(|pq| pq.as_str().to_string())
            .unwrap_or_else(|| parts.uri.path().to_string());

        let token = session::cookie_value(&parts.headers, &state.config.auth.cookie_name)
            .ok_or_else(|| AppError::LoginRequired(next.clone()))?;

        let conn = state.db.get()?;
        let user = session::find_user_by_token(&conn, token)?
            .ok_or(AppError::LoginRequired(next))?;

        Ok(CurrentUser {
            id: user.id,
            username: user.username,
            is_admin: user.is_admin,
        })
    }
}

/// Optional user extractor: `None` instead of a redirect when anonymous.
pub struct MaybeUser(pub Option<CurrentUser>);

impl MaybeUser {
    /// Username for the navigation bar.
    pub fn viewer(&self) -> Option<String> {
        self.0.as_ref().map(|user| user.username.clone())
    }
}

impl FromRequestParts<AppState> for MaybeUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        match CurrentUser::from_request_parts(parts, state).await {
            Ok(user) => Ok(MaybeUser(Some(user))),
            Err(AppError::LoginRequired(_)) => Ok(MaybeUser(None)),
            Err(e) => Err(e),
        }
    }
}
