//! Client for the third-party text continuation API used on the about page.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE, ORIGIN, REFERER, USER_AGENT};
use serde_json::json;

use crate::config::TextGenConfig;

const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 11_4) \
     AppleWebKit/605.1.15 (KHTML, like Gecko) Version/14.1.1 Safari/605.1.15";

#[derive(Debug, thiserror::Error)]
pub enum TextGenError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("unexpected status {0}")]
    Status(u16),

    #[error("response is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("response has no `text` field")]
    MissingField,

    #[error("invalid header value: {0}")]
    Header(#[from] reqwest::header::InvalidHeaderValue),
}

/// Continues a seed text. Swappable so tests and deployments can plug in
/// another backend.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, seed: &str) -> Result<String, TextGenError>;
}

pub fn request_body(seed: &str) -> serde_json::Value {
    json!({ "query": seed, "intro": 0, "filter": 1 })
}

/// Pull the generated text out of a raw response body.
pub fn extract_text(body: &[u8]) -> Result<String, TextGenError> {
    let value: serde_json::Value = serde_json::from_slice(body)?;
    value
        .get("text")
        .and_then(|text| text.as_str())
        .map(str::to_string)
        .ok_or(TextGenError::MissingField)
}

pub struct HttpTextGenerator {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpTextGenerator {
    pub fn new(config: &TextGenConfig) -> Result<Self, TextGenError> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(USER_AGENT, HeaderValue::from_static(BROWSER_USER_AGENT));
        headers.insert(ORIGIN, HeaderValue::from_str(&config.origin)?);
        headers.insert(
            REFERER,
            HeaderValue::from_str(&format!("{}/", config.origin.trim_end_matches('/')))?,
        );

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            endpoint: config.endpoint.clone(),
        })
    }
}

#[async_trait]
impl TextGenerator for HttpTextGenerator {
    async fn generate(&self, seed: &str) -> Result<String, TextGenError> {
        let response = self
            .client
            .post(&self.endpoint)
            .json(&request_body(seed))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            tracing::warn!(status = %status, "text generation request rejected");
            return Err(TextGenError::Status(status.as_u16()));
        }

        let body = response.bytes().await?;
        extract_text(&body)
    }
}
