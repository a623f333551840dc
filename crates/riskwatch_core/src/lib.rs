//! Core domain logic for riskwatch adverse-media monitoring.
//! This crate is the single source of truth for matching and tenant invariants.

pub mod config;
pub mod db;
pub mod delivery;
pub mod logging;
pub mod model;
pub mod provider;
pub mod repo;
pub mod screening;
pub mod service;

pub use config::{AppConfig, ConfigError, DeliveryTarget};
pub use delivery::{
    deliver_with_retry, DeliveryError, LogDelivery, MailRelayDelivery, MailRelayOptions,
    ReportDelivery, SmtpDelivery, SmtpOptions,
};
pub use logging::{default_log_level, init_logging, init_stderr_logging, logging_status};
pub use model::article::Article;
pub use model::report::{FetchFailure, Report, ReportEntry, EMPTY_REPORT_TEXT, REPORT_SUBJECT};
pub use model::tenant::{TenantValidationError, TrackedCompany, User, UserId};
pub use provider::{ArticleProvider, NewsApiOptions, NewsApiProvider, ProviderError, ProviderResult};
pub use repo::tenant_repo::{RepoError, RepoResult, SqliteTenantRepository, TenantRepository};
pub use screening::matcher::{ArticleMatcher, MatchResult, MatcherError};
pub use screening::terms::{DictionaryError, TermDictionary, DEFAULT_NEGATIVE_TERMS};
pub use service::report_builder::{CancelToken, ReportBuilder, ScanError};
pub use service::report_run::{
    BatchSummary, Recipient, ReportRunner, RunError, RunSummary, DEFAULT_RETRY_DELAY,
};
pub use service::session::{Session, SessionError, SessionResult};
pub use service::tenant_service::{AddCompanyOutcome, RemoveCompanyOutcome, TenantService};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
