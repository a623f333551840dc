//! Article provider contract and adapters.
//!
//! # Responsibility
//! - Define the seam between the report builder and news sources.
//! - Classify provider failures so callers can downgrade them.
//!
//! # Invariants
//! - Providers never panic on bad responses; they return [`ProviderError`].
//! - Credentials never appear in error messages.

pub mod news_api;

use crate::model::article::Article;

pub use news_api::{NewsApiOptions, NewsApiProvider};

pub type ProviderResult<T> = Result<T, ProviderError>;

/// Non-fatal failure of one article fetch.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProviderError {
    #[error("article fetch timed out")]
    Timeout,
    #[error("article fetch failed: {0}")]
    Transport(String),
    #[error("provider returned HTTP {status}: {message}")]
    Status { status: u16, message: String },
    #[error("provider rejected request ({code}): {message}")]
    Rejected { code: String, message: String },
    #[error("provider payload is malformed: {0}")]
    Decode(String),
}

impl ProviderError {
    /// Stable short code for log lines.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Timeout => "provider_timeout",
            Self::Transport(_) => "provider_transport",
            Self::Status { .. } => "provider_status",
            Self::Rejected { .. } => "provider_rejected",
            Self::Decode(_) => "provider_decode",
        }
    }
}

/// Source of articles for a company query.
///
/// `Sync` so the report builder can fan fetches out across scoped threads.
pub trait ArticleProvider: Sync {
    fn fetch_articles(&self, query: &str) -> ProviderResult<Vec<Article>>;
}

impl<P: ArticleProvider + ?Sized> ArticleProvider for &P {
    fn fetch_articles(&self, query: &str) -> ProviderResult<Vec<Article>> {
        (**self).fetch_articles(query)
    }
}

impl<P: ArticleProvider + ?Sized> ArticleProvider for Box<P> {
    fn fetch_articles(&self, query: &str) -> ProviderResult<Vec<Article>> {
        (**self).fetch_articles(query)
    }
}
