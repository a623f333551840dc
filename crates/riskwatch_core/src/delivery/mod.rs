//! Report delivery contract and adapters.
//!
//! # Responsibility
//! - Hand a rendered report to a destination address.
//! - Retry a bounded number of times before failing the run.
//!
//! # Invariants
//! - Delivery failures are terminal for the run; callers keep the report text.
//! - Relay credentials never appear in logs or error messages.

mod log_sink;
mod mail_relay;
mod smtp;

pub use log_sink::LogDelivery;
pub use mail_relay::{MailRelayDelivery, MailRelayOptions};
pub use smtp::{SmtpDelivery, SmtpOptions, DEFAULT_SMTP_PORT, DEFAULT_SMTP_SERVER};

use log::warn;
use std::thread;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DeliveryError {
    #[error("delivery recipient is empty")]
    EmptyRecipient,
    #[error("invalid mail address `{0}`")]
    InvalidAddress(String),
    #[error("delivery transport failed: {0}")]
    Transport(String),
    #[error("delivery relay returned HTTP {status}")]
    Status { status: u16 },
}

/// Destination for rendered reports.
pub trait ReportDelivery {
    fn deliver(&self, report_text: &str, recipient: &str) -> Result<(), DeliveryError>;
}

impl<D: ReportDelivery + ?Sized> ReportDelivery for &D {
    fn deliver(&self, report_text: &str, recipient: &str) -> Result<(), DeliveryError> {
        (**self).deliver(report_text, recipient)
    }
}

impl<D: ReportDelivery + ?Sized> ReportDelivery for Box<D> {
    fn deliver(&self, report_text: &str, recipient: &str) -> Result<(), DeliveryError> {
        (**self).deliver(report_text, recipient)
    }
}

/// Calls `delivery` up to `attempts` times (at least once), sleeping
/// `retry_delay` between attempts.
///
/// Empty recipients and malformed addresses are not retried.
pub fn deliver_with_retry(
    delivery: &dyn ReportDelivery,
    report_text: &str,
    recipient: &str,
    attempts: u32,
    retry_delay: Duration,
) -> Result<(), DeliveryError> {
    if recipient.trim().is_empty() {
        return Err(DeliveryError::EmptyRecipient);
    }

    let attempts = attempts.max(1);
    let mut last_error = None;
    for attempt in 1..=attempts {
        if attempt > 1 && !retry_delay.is_zero() {
            thread::sleep(retry_delay);
        }
        match delivery.deliver(report_text, recipient) {
            Ok(()) => return Ok(()),
            Err(err @ DeliveryError::InvalidAddress(_)) => return Err(err),
            Err(err) => {
                warn!(
                    "event=report_deliver module=delivery status=retry attempt={} of={} error={}",
                    attempt, attempts, err
                );
                last_error = Some(err);
            }
        }
    }

    Err(last_error.unwrap_or(DeliveryError::EmptyRecipient))
}

#[cfg(test)]
mod tests {
    use super::{deliver_with_retry, DeliveryError, ReportDelivery};
    use std::cell::Cell;
    use std::time::{Duration, Instant};

    struct Flaky {
        failures_left: Cell<u32>,
        calls: Cell<u32>,
    }

    impl ReportDelivery for Flaky {
        fn deliver(&self, _report_text: &str, _recipient: &str) -> Result<(), DeliveryError> {
            self.calls.set(self.calls.get() + 1);
            if self.failures_left.get() > 0 {
                self.failures_left.set(self.failures_left.get() - 1);
                return Err(DeliveryError::Status { status: 503 });
            }
            Ok(())
        }
    }

    #[test]
    fn retries_until_success() {
        let flaky = Flaky {
            failures_left: Cell::new(1),
            calls: Cell::new(0),
        };
        deliver_with_retry(&flaky, "body", "ops@example.test", 3, Duration::ZERO).unwrap();
        assert_eq!(flaky.calls.get(), 2);
    }

    #[test]
    fn gives_up_after_configured_attempts() {
        let flaky = Flaky {
            failures_left: Cell::new(5),
            calls: Cell::new(0),
        };
        let err = deliver_with_retry(&flaky, "body", "ops@example.test", 2, Duration::ZERO)
            .unwrap_err();
        assert_eq!(err, DeliveryError::Status { status: 503 });
        assert_eq!(flaky.calls.get(), 2);
    }

    #[test]
    fn blank_recipient_is_rejected_before_transport() {
        let flaky = Flaky {
            failures_left: Cell::new(0),
            calls: Cell::new(0),
        };
        let err = deliver_with_retry(&flaky, "body", "  ", 2, Duration::ZERO).unwrap_err();
        assert_eq!(err, DeliveryError::EmptyRecipient);
        assert_eq!(flaky.calls.get(), 0);
    }

    #[test]
    fn waits_between_attempts_but_not_before_the_first() {
        let flaky = Flaky {
            failures_left: Cell::new(2),
            calls: Cell::new(0),
        };
        let started_at = Instant::now();
        deliver_with_retry(
            &flaky,
            "body",
            "ops@example.test",
            3,
            Duration::from_millis(25),
        )
        .unwrap();
        assert_eq!(flaky.calls.get(), 3);
        assert!(started_at.elapsed() >= Duration::from_millis(50));
    }

    #[test]
    fn malformed_address_is_not_retried() {
        struct Rejecting {
            calls: Cell<u32>,
        }

        impl ReportDelivery for Rejecting {
            fn deliver(&self, _report_text: &str, recipient: &str) -> Result<(), DeliveryError> {
                self.calls.set(self.calls.get() + 1);
                Err(DeliveryError::InvalidAddress(recipient.to_string()))
            }
        }

        let rejecting = Rejecting {
            calls: Cell::new(0),
        };
        let err = deliver_with_retry(&rejecting, "body", "nobody", 3, Duration::from_secs(5))
            .unwrap_err();
        assert_eq!(err, DeliveryError::InvalidAddress("nobody".to_string()));
        assert_eq!(rejecting.calls.get(), 1);
    }
}
