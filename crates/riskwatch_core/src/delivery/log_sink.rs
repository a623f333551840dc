//! Delivery adapter that writes reports to a local sink.
//!
//! Used when no mail relay is configured, and by the CLI for dry runs.

use super::{DeliveryError, ReportDelivery};
use crate::model::report::REPORT_SUBJECT;
use log::info;
use std::io::Write;
use std::sync::Mutex;

/// Writes `To:`/`Subject:` headers and the report body to a writer.
pub struct LogDelivery<W: Write + Send> {
    sink: Mutex<W>,
}

impl LogDelivery<std::io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(std::io::stdout())
    }
}

impl<W: Write + Send> LogDelivery<W> {
    pub fn new(sink: W) -> Self {
        Self {
            sink: Mutex::new(sink),
        }
    }

    pub fn into_inner(self) -> W {
        match self.sink.into_inner() {
            Ok(sink) => sink,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

impl<W: Write + Send> ReportDelivery for LogDelivery<W> {
    fn deliver(&self, report_text: &str, recipient: &str) -> Result<(), DeliveryError> {
        let mut sink = self
            .sink
            .lock()
            .map_err(|_| DeliveryError::Transport("report sink lock poisoned".to_string()))?;
        writeln!(sink, "To: {recipient}\nSubject: {REPORT_SUBJECT}\n\n{report_text}")
            .and_then(|()| sink.flush())
            .map_err(|err| DeliveryError::Transport(err.to_string()))?;

        info!(
            "event=report_deliver module=delivery status=ok transport=local lines={}",
            report_text.lines().count()
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::LogDelivery;
    use crate::delivery::ReportDelivery;

    #[test]
    fn writes_headers_and_body() {
        let delivery = LogDelivery::new(Vec::new());
        delivery
            .deliver("Tesla: Tesla faces fraud charges - https://n/1", "ops@example.test")
            .unwrap();

        let written = String::from_utf8(delivery.into_inner()).unwrap();
        assert!(written.starts_with("To: ops@example.test\nSubject: Daily Risk Monitoring Report\n\n"));
        assert!(written.contains("Tesla faces fraud charges"));
    }
}
