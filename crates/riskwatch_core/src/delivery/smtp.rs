//! Delivery over SMTP with STARTTLS.

use super::{DeliveryError, ReportDelivery};
use crate::model::report::REPORT_SUBJECT;
use lettre::message::header::ContentType;
use lettre::message::{Mailbox, Message};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{SmtpTransport, Transport};
use log::{error, info};
use std::fmt::{Debug, Formatter};
use std::time::{Duration, Instant};

pub const DEFAULT_SMTP_SERVER: &str = "smtp.gmail.com";
pub const DEFAULT_SMTP_PORT: u16 = 587;

#[derive(Clone)]
pub struct SmtpOptions {
    pub host: String,
    pub port: u16,
    pub username: Option<String>,
    pub password: Option<String>,
    /// Address placed in `From`.
    pub sender: String,
    pub timeout: Duration,
}

impl Debug for SmtpOptions {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SmtpOptions")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("sender", &self.sender)
            .field("timeout", &self.timeout)
            .finish()
    }
}

pub struct SmtpDelivery {
    sender: Mailbox,
    transport: SmtpTransport,
}

impl SmtpDelivery {
    /// Builds the transport; no connection is opened until the first send.
    pub fn new(options: SmtpOptions) -> Result<Self, DeliveryError> {
        let sender = parse_mailbox(&options.sender)?;
        let mut builder = SmtpTransport::starttls_relay(&options.host)
            .map_err(|err| DeliveryError::Transport(err.to_string()))?
            .port(options.port)
            .timeout(Some(options.timeout));
        if let (Some(username), Some(password)) = (options.username, options.password) {
            builder = builder.credentials(Credentials::new(username, password));
        }

        Ok(Self {
            sender,
            transport: builder.build(),
        })
    }
}

impl ReportDelivery for SmtpDelivery {
    fn deliver(&self, report_text: &str, recipient: &str) -> Result<(), DeliveryError> {
        let started_at = Instant::now();
        let message = build_message(&self.sender, report_text, recipient)?;

        if let Err(err) = self.transport.send(&message) {
            error!(
                "event=report_deliver module=delivery status=error transport=smtp duration_ms={} error={}",
                started_at.elapsed().as_millis(),
                err
            );
            return Err(DeliveryError::Transport(err.to_string()));
        }

        info!(
            "event=report_deliver module=delivery status=ok transport=smtp duration_ms={}",
            started_at.elapsed().as_millis()
        );
        Ok(())
    }
}

/// Plain-text report message from `sender` to `recipient`.
pub(crate) fn build_message(
    sender: &Mailbox,
    report_text: &str,
    recipient: &str,
) -> Result<Message, DeliveryError> {
    Message::builder()
        .from(sender.clone())
        .to(parse_mailbox(recipient)?)
        .subject(REPORT_SUBJECT)
        .header(ContentType::TEXT_PLAIN)
        .body(report_text.to_string())
        .map_err(|err| DeliveryError::Transport(err.to_string()))
}

fn parse_mailbox(address: &str) -> Result<Mailbox, DeliveryError> {
    address
        .trim()
        .parse()
        .map_err(|_| DeliveryError::InvalidAddress(address.trim().to_string()))
}
