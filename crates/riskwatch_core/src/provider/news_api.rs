//! NewsAPI-compatible HTTP provider.
//!
//! # Responsibility
//! - Query an `/v2/everything`-style endpoint for one company at a time.
//! - Map transport, status and payload problems onto [`ProviderError`].
//!
//! # Invariants
//! - The API key travels in the `X-Api-Key` header, never in the URL.
//! - Every request is bounded by the configured timeout.

use super::{ArticleProvider, ProviderError, ProviderResult};
use crate::model::article::Article;
use log::{debug, warn};
use reqwest::blocking::Client;
use serde::Deserialize;
use std::fmt::{Debug, Formatter};
use std::time::{Duration, Instant};

pub const DEFAULT_ENDPOINT: &str = "https://newsapi.org/v2/everything";
pub const DEFAULT_LANGUAGE: &str = "en";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

const MAX_ERROR_BODY_CHARS: usize = 200;

#[derive(Clone)]
pub struct NewsApiOptions {
    pub endpoint: String,
    pub api_key: String,
    pub language: String,
    pub timeout: Duration,
}

impl NewsApiOptions {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            api_key: api_key.into(),
            language: DEFAULT_LANGUAGE.to_string(),
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl Debug for NewsApiOptions {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NewsApiOptions")
            .field("endpoint", &self.endpoint)
            .field("api_key", &"<redacted>")
            .field("language", &self.language)
            .field("timeout", &self.timeout)
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct NewsApiProvider {
    options: NewsApiOptions,
    client: Client,
}

impl NewsApiProvider {
    pub fn new(options: NewsApiOptions) -> ProviderResult<Self> {
        let client = Client::builder()
            .timeout(options.timeout)
            .user_agent(concat!("riskwatch/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|err| ProviderError::Transport(err.without_url().to_string()))?;

        Ok(Self { options, client })
    }
}

impl ArticleProvider for NewsApiProvider {
    fn fetch_articles(&self, query: &str) -> ProviderResult<Vec<Article>> {
        let started_at = Instant::now();
        let response = self
            .client
            .get(self.options.endpoint.as_str())
            .header("X-Api-Key", self.options.api_key.as_str())
            .query(&[("q", query), ("language", self.options.language.as_str())])
            .send()
            .map_err(map_transport_error)?;

        let status = response.status().as_u16();
        let body = response.text().map_err(map_transport_error)?;
        let result = parse_response(status, &body);

        match &result {
            Ok(articles) => debug!(
                "event=provider_fetch module=provider status=ok http_status={} articles={} duration_ms={}",
                status,
                articles.len(),
                started_at.elapsed().as_millis()
            ),
            Err(err) => warn!(
                "event=provider_fetch module=provider status=error http_status={} error_code={} duration_ms={}",
                status,
                err.code(),
                started_at.elapsed().as_millis()
            ),
        }
        result
    }
}

#[derive(Debug, Deserialize)]
struct EverythingResponse {
    status: String,
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    articles: Vec<Article>,
}

/// Decodes one provider response body.
pub(crate) fn parse_response(status: u16, body: &str) -> ProviderResult<Vec<Article>> {
    if !(200..300).contains(&status) {
        let message = serde_json::from_str::<EverythingResponse>(body)
            .ok()
            .and_then(|payload| payload.message)
            .unwrap_or_else(|| truncate(body, MAX_ERROR_BODY_CHARS));
        return Err(ProviderError::Status { status, message });
    }

    let payload: EverythingResponse =
        serde_json::from_str(body).map_err(|err| ProviderError::Decode(err.to_string()))?;

    if payload.status != "ok" {
        return Err(ProviderError::Rejected {
            code: payload.code.unwrap_or_else(|| payload.status.clone()),
            message: payload.message.unwrap_or_default(),
        });
    }

    Ok(payload.articles)
}

fn map_transport_error(err: reqwest::Error) -> ProviderError {
    if err.is_timeout() {
        return ProviderError::Timeout;
    }
    ProviderError::Transport(err.without_url().to_string())
}

fn truncate(value: &str, max_chars: usize) -> String {
    let mut truncated = value.chars().take(max_chars).collect::<String>();
    if value.chars().count() > max_chars {
        truncated.push_str("...");
    }
    truncated
}
