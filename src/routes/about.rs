use askama::Template;
use axum::extract::State;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Form, Router};
use serde::Deserialize;

use crate::error::AppResult;
use crate::extractors::MaybeUser;
use crate::forms::REQUIRED_TEXT;
use crate::routes::home::Html;
use crate::state::AppState;

#[derive(Template)]
#[template(path = "pages/about_author.html")]
pub struct AboutAuthorTemplate {
    pub viewer: Option<String>,
    pub seed: String,
    pub generated: Option<String>,
    pub error: Option<String>,
}

#[derive(Template)]
#[template(path = "pages/about_tech.html")]
pub struct AboutTechTemplate {
    pub viewer: Option<String>,
}

#[derive(Deserialize)]
pub struct GenerateForm {
    #[serde(default)]
    pub seed: String,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/about/author/", get(author))
        .route("/about/tech/", get(tech))
        .route("/about/generate/", post(generate))
}

pub async fn author(maybe_user: MaybeUser) -> Response {
    Html(AboutAuthorTemplate {
        viewer: maybe_user.viewer(),
        seed: String::new(),
        generated: None,
        error: None,
    })
    .into_response()
}

pub async fn tech(maybe_user: MaybeUser) -> Response {
    Html(AboutTechTemplate {
        viewer: maybe_user.viewer(),
    })
    .into_response()
}

/// POST /about/generate/: continue the submitted seed through the
/// text-generation service and show the result on the author page.
pub async fn generate(
    State(state): State<AppState>,
    maybe_user: MaybeUser,
    Form(form): Form<GenerateForm>,
) -> AppResult<Response> {
    let seed = form.seed.trim().to_string();
    if seed.is_empty() {
        return Ok(Html(AboutAuthorTemplate {
            viewer: maybe_user.viewer(),
            seed,
            generated: None,
            error: Some(REQUIRED_TEXT.to_string()),
        })
        .into_response());
    }

    let generated = state.textgen.generate(&seed).await?;
    tracing::debug!(chars = generated.chars().count(), "Generated text");

    Ok(Html(AboutAuthorTemplate {
        viewer: maybe_user.viewer(),
        seed,
        generated: Some(generated),
        error: None,
    })
    .into_response())
}
