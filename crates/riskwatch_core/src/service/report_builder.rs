//! Report builder: fetch, screen and collect flagged articles.
//!
//! # Responsibility
//! - Request articles per company from an [`ArticleProvider`].
//! - Run every article through the [`ArticleMatcher`].
//! - Contain provider failures per company.
//!
//! # Invariants
//! - Entries are ordered by company, then by provider article order, even
//!   when fetches run in parallel.
//! - A failed fetch counts as zero articles and never aborts the run.
//! - A cancelled run yields no report at all.

use crate::model::article::Article;
use crate::model::report::{FetchFailure, Report, ReportEntry};
use crate::provider::{ArticleProvider, ProviderResult};
use crate::screening::matcher::ArticleMatcher;
use log::{debug, info, warn};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Instant;

/// Shared flag a caller flips to abandon a run between companies.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ScanError {
    #[error("scan cancelled after {completed} of {total} companies")]
    Cancelled { completed: usize, total: usize },
}

/// Per-company scan output, kept separate until merged in company order.
#[derive(Debug, Default)]
struct CompanyScan {
    entries: Vec<ReportEntry>,
    failure: Option<FetchFailure>,
}

pub struct ReportBuilder<'a> {
    provider: &'a dyn ArticleProvider,
    matcher: &'a ArticleMatcher,
    fetch_concurrency: usize,
}

impl<'a> ReportBuilder<'a> {
    pub fn new(provider: &'a dyn ArticleProvider, matcher: &'a ArticleMatcher) -> Self {
        Self {
            provider,
            matcher,
            fetch_concurrency: 1,
        }
    }

    /// Number of companies fetched at once. `0` and `1` both mean sequential.
    pub fn with_fetch_concurrency(mut self, fetch_concurrency: usize) -> Self {
        self.fetch_concurrency = fetch_concurrency.max(1);
        self
    }

    /// Scans `companies` in order and returns the assembled report.
    pub fn build(&self, companies: &[String], cancel: &CancelToken) -> Result<Report, ScanError> {
        let started_at = Instant::now();
        let total = companies.len();
        let mut report = Report::default();
        let mut completed = 0;

        for wave in companies.chunks(self.fetch_concurrency) {
            if cancel.is_cancelled() {
                info!(
                    "event=report_build module=service status=cancelled completed={completed} total={total}"
                );
                return Err(ScanError::Cancelled { completed, total });
            }

            for scan in self.scan_wave(wave) {
                report.entries.extend(scan.entries);
                report.failures.extend(scan.failure);
            }
            completed += wave.len();
        }

        info!(
            "event=report_build module=service status=ok companies={} flagged={} failed_fetches={} duration_ms={}",
            total,
            report.entries.len(),
            report.failures.len(),
            started_at.elapsed().as_millis()
        );
        Ok(report)
    }

    fn scan_wave(&self, wave: &[String]) -> Vec<CompanyScan> {
        if wave.len() == 1 {
            return vec![self.scan_company(&wave[0])];
        }

        thread::scope(|scope| {
            let handles = wave
                .iter()
                .map(|company| scope.spawn(move || self.scan_company(company)))
                .collect::<Vec<_>>();

            handles
                .into_iter()
                .zip(wave)
                .map(|(handle, company)| {
                    handle.join().unwrap_or_else(|_| CompanyScan {
                        entries: Vec::new(),
                        failure: Some(FetchFailure {
                            company: company.clone(),
                            reason: "fetch worker panicked".to_string(),
                        }),
                    })
                })
                .collect()
        })
    }

    fn scan_company(&self, company: &str) -> CompanyScan {
        let articles = match self.fetch(company) {
            Ok(articles) => articles,
            Err(failure) => {
                return CompanyScan {
                    entries: Vec::new(),
                    failure: Some(failure),
                }
            }
        };

        let entries = articles
            .iter()
            .filter_map(|article| {
                let result = self.matcher.evaluate(article, company);
                result.term().map(|term| ReportEntry {
                    company: company.to_string(),
                    article_title: article.display_title().to_string(),
                    article_url: article.display_url().to_string(),
                    term: term.to_string(),
                })
            })
            .collect::<Vec<_>>();

        debug!(
            "event=company_scan module=service status=ok articles={} flagged={}",
            articles.len(),
            entries.len()
        );
        CompanyScan {
            entries,
            failure: None,
        }
    }

    fn fetch(&self, company: &str) -> Result<Vec<Article>, FetchFailure> {
        let fetched: ProviderResult<Vec<Article>> = self.provider.fetch_articles(company);
        fetched.map_err(|err| {
            warn!(
                "event=company_scan module=service status=fetch_failed error_code={} error={}",
                err.code(),
                err
            );
            FetchFailure {
                company: company.to_string(),
                reason: err.to_string(),
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::{CancelToken, ReportBuilder, ScanError};
    use crate::model::article::Article;
    use crate::provider::{ArticleProvider, ProviderError, ProviderResult};
    use crate::screening::matcher::ArticleMatcher;
    use std::collections::HashMap;

    struct FixtureProvider {
        articles: HashMap<&'static str, Vec<Article>>,
    }

    impl ArticleProvider for FixtureProvider {
        fn fetch_articles(&self, query: &str) -> ProviderResult<Vec<Article>> {
            match self.articles.get(query) {
                Some(articles) => Ok(articles.clone()),
                None => Err(ProviderError::Timeout),
            }
        }
    }

    fn provider() -> FixtureProvider {
        let mut articles = HashMap::new();
        articles.insert(
            "Tesla",
            vec![
                Article::new(Some("Tesla faces fraud charges"), None, "https://n/t1"),
                Article::new(Some("Tesla unveils new factory"), Some("Production ramps up"), "https://n/t2"),
            ],
        );
        articles.insert(
            "Meta",
            vec![Article::new(Some("Meta hit with lawsuit"), None, "https://n/m1")],
        );
        articles.insert(
            "Amazon",
            vec![Article::new(None, Some("Amazon fined by regulator"), "")],
        );
        FixtureProvider { articles }
    }

    fn companies(names: &[&str]) -> Vec<String> {
        names.iter().map(|name| name.to_string()).collect()
    }

    #[test]
    fn parallel_fetches_keep_company_order() {
        let provider = provider();
        let matcher = ArticleMatcher::builtin().unwrap();
        let builder = ReportBuilder::new(&provider, &matcher).with_fetch_concurrency(4);

        let report = builder
            .build(&companies(&["Meta", "Blackstone", "Tesla"]), &CancelToken::new())
            .unwrap();

        let flagged = report
            .entries
            .iter()
            .map(|entry| (entry.company.as_str(), entry.term.as_str()))
            .collect::<Vec<_>>();
        assert_eq!(flagged, vec![("Meta", "lawsuit"), ("Tesla", "fraud")]);
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].company, "Blackstone");
    }

    #[test]
    fn untitled_article_without_url_gets_display_fallbacks() {
        let provider = provider();
        let matcher = ArticleMatcher::builtin().unwrap();
        let report = ReportBuilder::new(&provider, &matcher)
            .build(&companies(&["Amazon"]), &CancelToken::new())
            .unwrap();

        assert_eq!(report.entries.len(), 1);
        assert_eq!(report.entries[0].article_title, "No title");
        assert_eq!(report.entries[0].article_url, "#");
        assert_eq!(report.render_text(), "Amazon: No title - #");
    }

    #[test]
    fn cancelled_run_returns_no_report() {
        let provider = provider();
        let matcher = ArticleMatcher::builtin().unwrap();
        let cancel = CancelToken::new();
        cancel.cancel();

        let err = ReportBuilder::new(&provider, &matcher)
            .build(&companies(&["Tesla"]), &cancel)
            .unwrap_err();
        assert_eq!(err, ScanError::Cancelled { completed: 0, total: 1 });
    }

    #[test]
    fn empty_company_list_builds_empty_report() {
        let provider = provider();
        let matcher = ArticleMatcher::builtin().unwrap();
        let report = ReportBuilder::new(&provider, &matcher)
            .build(&[], &CancelToken::new())
            .unwrap();
        assert!(report.is_empty());
        assert!(report.failures.is_empty());
    }
}
