//! Per-run report of flagged articles.
//!
//! # Invariants
//! - Entries keep the order companies and articles were processed in.
//! - A report is built fresh per run and never persisted.

use std::fmt::Write as _;

/// Body sent when a run flagged nothing.
pub const EMPTY_REPORT_TEXT: &str = "No negative news today.";

/// Subject line used by mail-style deliveries.
pub const REPORT_SUBJECT: &str = "Daily Risk Monitoring Report";

/// One flagged article for one company.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportEntry {
    pub company: String,
    pub article_title: String,
    pub article_url: String,
    pub term: String,
}

/// A company whose article fetch failed during the run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchFailure {
    pub company: String,
    pub reason: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Report {
    pub entries: Vec<ReportEntry>,
    pub failures: Vec<FetchFailure>,
}

impl Report {
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Plain-text body: one `"{company}: {title} - {url}"` line per entry.
    pub fn render_text(&self) -> String {
        if self.entries.is_empty() {
            return EMPTY_REPORT_TEXT.to_string();
        }

        let mut text = String::new();
        for (index, entry) in self.entries.iter().enumerate() {
            if index > 0 {
                text.push('\n');
            }
            let _ = write!(
                text,
                "{}: {} - {}",
                entry.company, entry.article_title, entry.article_url
            );
        }
        text
    }
}

#[cfg(test)]
mod tests {
    use super::{Report, ReportEntry, EMPTY_REPORT_TEXT};

    fn entry(company: &str, title: &str, url: &str) -> ReportEntry {
        ReportEntry {
            company: company.to_string(),
            article_title: title.to_string(),
            article_url: url.to_string(),
            term: "fraud".to_string(),
        }
    }

    #[test]
    fn empty_report_renders_placeholder() {
        assert_eq!(Report::default().render_text(), EMPTY_REPORT_TEXT);
    }

    #[test]
    fn entries_render_one_line_each_in_order() {
        let report = Report {
            entries: vec![
                entry("Tesla", "Tesla faces fraud charges", "https://n/1"),
                entry("Meta", "Meta sued again", "https://n/2"),
            ],
            failures: Vec::new(),
        };
        assert_eq!(
            report.render_text(),
            "Tesla: Tesla faces fraud charges - https://n/1\nMeta: Meta sued again - https://n/2"
        );
    }
}
