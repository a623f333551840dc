//! Delivery through an HTTP mail relay.
//!
//! The relay accepts a JSON message (`from`, `to`, `subject`, `text`) with
//! basic-auth credentials and performs the actual mail submission.

use super::{DeliveryError, ReportDelivery};
use crate::model::report::REPORT_SUBJECT;
use log::{error, info};
use reqwest::blocking::Client;
use serde::Serialize;
use std::fmt::{Debug, Formatter};
use std::time::{Duration, Instant};

#[derive(Clone)]
pub struct MailRelayOptions {
    pub endpoint: String,
    pub username: Option<String>,
    pub password: Option<String>,
    /// Sender address placed in `from`.
    pub sender: String,
    pub timeout: Duration,
}

impl Debug for MailRelayOptions {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MailRelayOptions")
            .field("endpoint", &self.endpoint)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("sender", &self.sender)
            .field("timeout", &self.timeout)
            .finish()
    }
}

#[derive(Debug, Serialize)]
struct RelayMessage<'a> {
    from: &'a str,
    to: &'a str,
    subject: &'a str,
    text: &'a str,
}

#[derive(Debug, Clone)]
pub struct MailRelayDelivery {
    options: MailRelayOptions,
    client: Client,
}

impl MailRelayDelivery {
    pub fn new(options: MailRelayOptions) -> Result<Self, DeliveryError> {
        let client = Client::builder()
            .timeout(options.timeout)
            .build()
            .map_err(|err| DeliveryError::Transport(err.without_url().to_string()))?;
        Ok(Self { options, client })
    }
}

impl ReportDelivery for MailRelayDelivery {
    fn deliver(&self, report_text: &str, recipient: &str) -> Result<(), DeliveryError> {
        let started_at = Instant::now();
        let message = RelayMessage {
            from: &self.options.sender,
            to: recipient,
            subject: REPORT_SUBJECT,
            text: report_text,
        };

        let mut request = self
            .client
            .post(self.options.endpoint.as_str())
            .json(&message);
        if let Some(username) = &self.options.username {
            request = request.basic_auth(username, self.options.password.as_ref());
        }

        let response = request.send().map_err(|err| {
            error!(
                "event=report_deliver module=delivery status=error transport=relay duration_ms={} error_code=relay_unreachable",
                started_at.elapsed().as_millis()
            );
            DeliveryError::Transport(err.without_url().to_string())
        })?;

        let status = response.status();
        if !status.is_success() {
            error!(
                "event=report_deliver module=delivery status=error transport=relay http_status={} duration_ms={}",
                status.as_u16(),
                started_at.elapsed().as_millis()
            );
            return Err(DeliveryError::Status {
                status: status.as_u16(),
            });
        }

        info!(
            "event=report_deliver module=delivery status=ok transport=relay duration_ms={}",
            started_at.elapsed().as_millis()
        );
        Ok(())
    }
}
