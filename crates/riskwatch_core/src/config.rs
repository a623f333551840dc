//! Runtime configuration loaded from the environment.
//!
//! # Responsibility
//! - Collect provider, delivery, store and logging settings in one value
//!   that is injected at startup.
//!
//! # Invariants
//! - Secrets are only reachable through explicit accessors; `Debug` output
//!   redacts them.
//! - Parsing never reads process state except through the supplied lookup.

use crate::delivery::{MailRelayOptions, SmtpOptions, DEFAULT_SMTP_PORT, DEFAULT_SMTP_SERVER};
use crate::provider::news_api::{self, NewsApiOptions};
use std::fmt::{Debug, Formatter};
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_DB_PATH: &str = "riskwatch.db";
pub const DEFAULT_WATCHLIST: &[&str] = &["Blackstone", "Tesla", "Amazon", "Wells Fargo", "Meta"];
const DEFAULT_FETCH_TIMEOUT_SECS: u64 = 10;
const DEFAULT_DELIVERY_ATTEMPTS: u32 = 2;
const DEFAULT_RETRY_DELAY_SECS: u64 = 2;
const FALLBACK_SENDER: &str = "riskwatch@localhost";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),
    #[error("{key} has an invalid value: {reason}")]
    Invalid { key: &'static str, reason: String },
}

/// Where reports go, in order of preference: relay, SMTP, local sink.
#[derive(Debug, Clone)]
pub enum DeliveryTarget {
    Relay(MailRelayOptions),
    Smtp(SmtpOptions),
    Local,
}

#[derive(Clone)]
pub struct AppConfig {
    pub db_path: PathBuf,
    news_api_key: Option<String>,
    pub news_api_url: String,
    pub news_language: String,
    pub fetch_timeout: Duration,
    pub fetch_concurrency: usize,
    pub mail_relay_url: Option<String>,
    pub smtp_server: Option<String>,
    pub smtp_port: u16,
    pub mail_user: Option<String>,
    mail_pass: Option<String>,
    pub report_recipient: Option<String>,
    pub watchlist: Vec<String>,
    pub delivery_attempts: u32,
    pub retry_delay: Duration,
    pub log_level: Option<String>,
    pub log_dir: Option<String>,
}

impl AppConfig {
    /// Loads `.env` when present, then reads the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Parses configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let watchlist = match get("WATCHLIST") {
            Some(raw) => parse_watchlist(&raw),
            None => DEFAULT_WATCHLIST.iter().map(|name| name.to_string()).collect(),
        };

        Ok(Self {
            db_path: PathBuf::from(get("RISKWATCH_DB").unwrap_or_else(|| DEFAULT_DB_PATH.to_string())),
            news_api_key: get("NEWS_API_KEY"),
            news_api_url: get("NEWS_API_URL")
                .unwrap_or_else(|| news_api::DEFAULT_ENDPOINT.to_string()),
            news_language: get("NEWS_LANGUAGE")
                .unwrap_or_else(|| news_api::DEFAULT_LANGUAGE.to_string()),
            fetch_timeout: Duration::from_secs(parse_number(
                "NEWS_FETCH_TIMEOUT_SECS",
                get("NEWS_FETCH_TIMEOUT_SECS"),
                DEFAULT_FETCH_TIMEOUT_SECS,
            )?),
            fetch_concurrency: parse_number("FETCH_CONCURRENCY", get("FETCH_CONCURRENCY"), 1)?,
            mail_relay_url: get("MAIL_RELAY_URL"),
            smtp_server: get("EMAIL_SMTP_SERVER"),
            smtp_port: parse_number("EMAIL_SMTP_PORT", get("EMAIL_SMTP_PORT"), DEFAULT_SMTP_PORT)?,
            mail_user: get("MAIL_USER").or_else(|| get("EMAIL_USER")),
            mail_pass: get("MAIL_PASS").or_else(|| get("EMAIL_PASS")),
            report_recipient: get("REPORT_RECIPIENT"),
            watchlist,
            delivery_attempts: parse_number(
                "DELIVERY_ATTEMPTS",
                get("DELIVERY_ATTEMPTS"),
                DEFAULT_DELIVERY_ATTEMPTS,
            )?,
            retry_delay: Duration::from_secs(parse_number(
                "DELIVERY_RETRY_DELAY_SECS",
                get("DELIVERY_RETRY_DELAY_SECS"),
                DEFAULT_RETRY_DELAY_SECS,
            )?),
            log_level: get("RISKWATCH_LOG_LEVEL"),
            log_dir: get("RISKWATCH_LOG_DIR"),
        })
    }

    /// Provider settings; fails when no API key is configured.
    pub fn news_api_options(&self) -> Result<NewsApiOptions, ConfigError> {
        let api_key = self
            .news_api_key
            .clone()
            .ok_or(ConfigError::Missing("NEWS_API_KEY"))?;

        Ok(NewsApiOptions {
            endpoint: self.news_api_url.clone(),
            api_key,
            language: self.news_language.clone(),
            timeout: self.fetch_timeout,
        })
    }

    /// Relay settings, or `None` when reports should go to the local sink.
    pub fn mail_relay_options(&self) -> Option<MailRelayOptions> {
        let endpoint = self.mail_relay_url.clone()?;
        Some(MailRelayOptions {
            endpoint,
            username: self.mail_user.clone(),
            password: self.mail_pass.clone(),
            sender: self.sender(),
            timeout: self.fetch_timeout,
        })
    }

    /// SMTP settings, or `None` when neither a server nor credentials are set.
    ///
    /// The server defaults to [`DEFAULT_SMTP_SERVER`] once credentials exist.
    pub fn smtp_options(&self) -> Option<SmtpOptions> {
        let has_credentials = self.mail_user.is_some() && self.mail_pass.is_some();
        if self.smtp_server.is_none() && !has_credentials {
            return None;
        }

        Some(SmtpOptions {
            host: self
                .smtp_server
                .clone()
                .unwrap_or_else(|| DEFAULT_SMTP_SERVER.to_string()),
            port: self.smtp_port,
            username: self.mail_user.clone(),
            password: self.mail_pass.clone(),
            sender: self.sender(),
            timeout: self.fetch_timeout,
        })
    }

    pub fn delivery_target(&self) -> DeliveryTarget {
        if let Some(options) = self.mail_relay_options() {
            return DeliveryTarget::Relay(options);
        }
        match self.smtp_options() {
            Some(options) => DeliveryTarget::Smtp(options),
            None => DeliveryTarget::Local,
        }
    }

    fn sender(&self) -> String {
        self.mail_user
            .clone()
            .unwrap_or_else(|| FALLBACK_SENDER.to_string())
    }

    /// Explicit recipient for the watchlist batch, defaulting to the sender.
    pub fn batch_recipient(&self) -> Result<String, ConfigError> {
        self.report_recipient
            .clone()
            .or_else(|| self.mail_user.clone())
            .ok_or(ConfigError::Missing("REPORT_RECIPIENT"))
    }
}

impl Debug for AppConfig {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let redact = |value: &Option<String>| value.as_ref().map(|_| "<redacted>");
        f.debug_struct("AppConfig")
            .field("db_path", &self.db_path)
            .field("news_api_key", &redact(&self.news_api_key))
            .field("news_api_url", &self.news_api_url)
            .field("news_language", &self.news_language)
            .field("fetch_timeout", &self.fetch_timeout)
            .field("fetch_concurrency", &self.fetch_concurrency)
            .field("mail_relay_url", &self.mail_relay_url)
            .field("smtp_server", &self.smtp_server)
            .field("smtp_port", &self.smtp_port)
            .field("mail_user", &self.mail_user)
            .field("mail_pass", &redact(&self.mail_pass))
            .field("report_recipient", &self.report_recipient)
            .field("watchlist", &self.watchlist)
            .field("delivery_attempts", &self.delivery_attempts)
            .field("retry_delay", &self.retry_delay)
            .field("log_level", &self.log_level)
            .field("log_dir", &self.log_dir)
            .finish()
    }
}

fn parse_watchlist(raw: &str) -> Vec<String> {
    let mut companies: Vec<String> = Vec::new();
    for name in raw.split(',').map(str::trim).filter(|name| !name.is_empty()) {
        if !companies.iter().any(|seen| seen.eq_ignore_ascii_case(name)) {
            companies.push(name.to_string());
        }
    }
    companies
}

fn parse_number<T: std::str::FromStr>(
    key: &'static str,
    value: Option<String>,
    default: T,
) -> Result<T, ConfigError> {
    match value {
        None => Ok(default),
        Some(raw) => raw.parse().map_err(|_| ConfigError::Invalid {
            key,
            reason: format!("`{raw}` is not a non-negative integer"),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::{AppConfig, ConfigError, DeliveryTarget, DEFAULT_WATCHLIST};
    use std::collections::HashMap;
    use std::time::Duration;

    fn config(pairs: &[(&str, &str)]) -> Result<AppConfig, ConfigError> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect();
        AppConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_apply_when_unset() {
        let config = config(&[]).unwrap();
        assert_eq!(config.watchlist, DEFAULT_WATCHLIST);
        assert_eq!(config.fetch_timeout, Duration::from_secs(10));
        assert_eq!(config.fetch_concurrency, 1);
        assert_eq!(config.delivery_attempts, 2);
        assert!(config.mail_relay_options().is_none());
        assert!(config.smtp_options().is_none());
        assert!(matches!(config.delivery_target(), DeliveryTarget::Local));
        assert_eq!(config.retry_delay, Duration::from_secs(2));
        assert_eq!(
            config.news_api_options().unwrap_err(),
            ConfigError::Missing("NEWS_API_KEY")
        );
    }

    #[test]
    fn watchlist_is_split_trimmed_and_deduplicated() {
        let config = config(&[("WATCHLIST", " Tesla, ,Meta,tesla ,Wells Fargo")]).unwrap();
        assert_eq!(config.watchlist, vec!["Tesla", "Meta", "Wells Fargo"]);
    }

    #[test]
    fn invalid_numbers_are_rejected() {
        let err = config(&[("FETCH_CONCURRENCY", "many")]).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { key: "FETCH_CONCURRENCY", .. }));
    }

    #[test]
    fn batch_recipient_falls_back_to_mail_user() {
        let config = config(&[("MAIL_USER", "alerts@example.test")]).unwrap();
        assert_eq!(config.batch_recipient().unwrap(), "alerts@example.test");
    }

    #[test]
    fn debug_output_never_contains_secrets() {
        let config = config(&[
            ("NEWS_API_KEY", "newsapi-secret"),
            ("MAIL_PASS", "mail-secret"),
            ("MAIL_USER", "alerts@example.test"),
        ])
        .unwrap();
        let rendered = format!("{config:?}");
        assert!(!rendered.contains("newsapi-secret"));
        assert!(!rendered.contains("mail-secret"));
        assert!(rendered.contains("<redacted>"));
    }

    #[test]
    fn smtp_credentials_select_default_server() {
        let config = config(&[
            ("EMAIL_USER", "alerts@example.test"),
            ("EMAIL_PASS", "app-password"),
        ])
        .unwrap();

        let DeliveryTarget::Smtp(options) = config.delivery_target() else {
            panic!("expected smtp delivery");
        };
        assert_eq!(options.host, "smtp.gmail.com");
        assert_eq!(options.port, 587);
        assert_eq!(options.sender, "alerts@example.test");
        assert_eq!(options.password.as_deref(), Some("app-password"));
        assert!(!format!("{config:?}").contains("app-password"));
    }

    #[test]
    fn explicit_smtp_server_and_port_are_used() {
        let config = config(&[
            ("EMAIL_SMTP_SERVER", "mail.example.test"),
            ("EMAIL_SMTP_PORT", "2525"),
        ])
        .unwrap();
        let options = config.smtp_options().unwrap();
        assert_eq!(options.host, "mail.example.test");
        assert_eq!(options.port, 2525);
        assert_eq!(options.username, None);
    }

    #[test]
    fn relay_takes_precedence_over_smtp() {
        let config = config(&[
            ("MAIL_RELAY_URL", "https://relay.example.test/send"),
            ("EMAIL_USER", "alerts@example.test"),
            ("EMAIL_PASS", "app-password"),
        ])
        .unwrap();
        assert!(matches!(config.delivery_target(), DeliveryTarget::Relay(_)));
    }

    #[test]
    fn out_of_range_port_is_rejected() {
        let err = config(&[("EMAIL_SMTP_PORT", "70000")]).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { key: "EMAIL_SMTP_PORT", .. }));
    }
}
