//! Report runs: scan, render and deliver.
//!
//! # Responsibility
//! - Resolve whose companies to scan and where to deliver.
//! - Share one [`ReportBuilder`] between the watchlist batch, the all-users
//!   batch and on-demand per-user scans.
//!
//! # Invariants
//! - A report is delivered whole or not at all.
//! - A delivery failure keeps the rendered text in the error and the log.
//! - In the all-users batch, one user's failure never stops the others.

use crate::delivery::{deliver_with_retry, DeliveryError, ReportDelivery};
use crate::model::report::Report;
use crate::model::tenant::UserId;
use crate::repo::tenant_repo::{RepoError, TenantRepository};
use crate::service::report_builder::{CancelToken, ReportBuilder, ScanError};
use crate::service::tenant_service::TenantService;
use log::{error, info, warn};
use std::time::Duration;

/// Pause between delivery attempts unless overridden.
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_secs(2);

/// Where a per-user report goes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Recipient {
    Explicit(String),
    /// The user's stored notification email.
    UserEmail,
}

#[derive(Debug, thiserror::Error)]
pub enum RunError {
    #[error(transparent)]
    Store(#[from] RepoError),
    #[error(transparent)]
    Scan(#[from] ScanError),
    #[error("user {0} has no notification email")]
    NoRecipient(UserId),
    #[error("report delivery failed: {source}")]
    Delivery {
        #[source]
        source: DeliveryError,
        report_text: String,
    },
}

/// Outcome of one delivered report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub recipient: String,
    pub flagged: usize,
    pub failed_fetches: usize,
}

/// Outcome of the all-users batch.
#[derive(Debug, Default)]
pub struct BatchSummary {
    pub delivered: Vec<(String, RunSummary)>,
    pub failed: Vec<(String, RunError)>,
}

impl BatchSummary {
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }
}

pub struct ReportRunner<'a> {
    builder: ReportBuilder<'a>,
    delivery: &'a dyn ReportDelivery,
    delivery_attempts: u32,
    retry_delay: Duration,
}

impl<'a> ReportRunner<'a> {
    pub fn new(builder: ReportBuilder<'a>, delivery: &'a dyn ReportDelivery) -> Self {
        Self {
            builder,
            delivery,
            delivery_attempts: 1,
            retry_delay: DEFAULT_RETRY_DELAY,
        }
    }

    pub fn with_delivery_attempts(mut self, attempts: u32) -> Self {
        self.delivery_attempts = attempts.max(1);
        self
    }

    pub fn with_retry_delay(mut self, retry_delay: Duration) -> Self {
        self.retry_delay = retry_delay;
        self
    }

    /// Unattended run over a fixed company list to one explicit address.
    pub fn run_for_companies(
        &self,
        companies: &[String],
        recipient: &str,
        cancel: &CancelToken,
    ) -> Result<RunSummary, RunError> {
        let report = self.builder.build(companies, cancel)?;
        self.deliver_report(&report, recipient)
    }

    /// Scans one user's tracked companies without delivering.
    pub fn scan_for_user<R: TenantRepository>(
        &self,
        tenants: &TenantService<R>,
        user_id: UserId,
        cancel: &CancelToken,
    ) -> Result<Report, RunError> {
        let companies = tenants.list_tracked_companies(user_id)?;
        Ok(self.builder.build(&companies, cancel)?)
    }

    /// Scans one user's tracked companies and delivers the report.
    pub fn run_for_user<R: TenantRepository>(
        &self,
        tenants: &TenantService<R>,
        user_id: UserId,
        recipient: &Recipient,
        cancel: &CancelToken,
    ) -> Result<RunSummary, RunError> {
        let address = match recipient {
            Recipient::Explicit(address) => address.clone(),
            Recipient::UserEmail => tenants
                .notification_email(user_id)?
                .ok_or(RunError::NoRecipient(user_id))?,
        };

        let report = self.scan_for_user(tenants, user_id, cancel)?;
        self.deliver_report(&report, &address)
    }

    /// Delivers a report to every user with a stored email.
    ///
    /// # Errors
    /// - [`RunError::Store`] when the user list cannot be read.
    /// - [`RunError::Scan`] when the batch is cancelled.
    pub fn run_for_all_users<R: TenantRepository>(
        &self,
        tenants: &TenantService<R>,
        cancel: &CancelToken,
    ) -> Result<BatchSummary, RunError> {
        let users = tenants.users_with_email()?;
        let mut summary = BatchSummary::default();

        for user in users {
            match self.run_for_user(tenants, user.id, &Recipient::UserEmail, cancel) {
                Ok(run) => summary.delivered.push((user.username, run)),
                Err(RunError::Scan(err)) => return Err(RunError::Scan(err)),
                Err(err) => {
                    error!(
                        "event=user_report module=service status=error user_id={} error={}",
                        user.id, err
                    );
                    summary.failed.push((user.username, err));
                }
            }
        }

        info!(
            "event=batch_users module=service status=done delivered={} failed={}",
            summary.delivered.len(),
            summary.failed.len()
        );
        Ok(summary)
    }

    /// Renders and delivers an already-built report.
    pub fn deliver_report(&self, report: &Report, recipient: &str) -> Result<RunSummary, RunError> {
        let report_text = report.render_text();
        if let Err(source) = deliver_with_retry(
            self.delivery,
            &report_text,
            recipient,
            self.delivery_attempts,
            self.retry_delay,
        ) {
            error!(
                "event=report_deliver module=service status=error attempts={} error={}",
                self.delivery_attempts, source
            );
            for line in report_text.lines() {
                warn!("event=undelivered_report module=service line={line}");
            }
            return Err(RunError::Delivery {
                source,
                report_text,
            });
        }

        Ok(RunSummary {
            recipient: recipient.to_string(),
            flagged: report.entries.len(),
            failed_fetches: report.failures.len(),
        })
    }
}
