//! Article matcher: negative term + company co-occurrence.
//!
//! # Responsibility
//! - Compile the term dictionary once into a boundary-aware `RegexSet`.
//! - Evaluate one article against one company name.
//!
//! # Invariants
//! - A term never matches as a fragment of a larger word ("risk" vs "brisket").
//! - Phrase terms match only as the whole phrase; any whitespace run may
//!   separate their words.
//! - Blank company names never match.
//! - When several terms match, the first in dictionary order is reported.

use crate::model::article::Article;
use crate::screening::terms::TermDictionary;
use regex::RegexSet;

#[derive(Debug, thiserror::Error)]
#[error("failed to compile negative term patterns: {0}")]
pub struct MatcherError(#[from] regex::Error);

/// Outcome of one evaluation. `matched()` is true exactly when a term is set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchResult {
    term: Option<String>,
}

impl MatchResult {
    pub fn hit(term: impl Into<String>) -> Self {
        Self {
            term: Some(term.into()),
        }
    }

    pub fn miss() -> Self {
        Self { term: None }
    }

    pub fn matched(&self) -> bool {
        self.term.is_some()
    }

    /// Triggering term when matched.
    pub fn term(&self) -> Option<&str> {
        self.term.as_deref()
    }
}

/// Compiled matcher over an immutable [`TermDictionary`].
#[derive(Debug, Clone)]
pub struct ArticleMatcher {
    dictionary: TermDictionary,
    patterns: RegexSet,
}

impl ArticleMatcher {
    pub fn new(dictionary: TermDictionary) -> Result<Self, MatcherError> {
        let patterns = RegexSet::new(dictionary.terms().map(boundary_pattern))?;
        Ok(Self {
            dictionary,
            patterns,
        })
    }

    /// Matcher over the built-in dictionary.
    pub fn builtin() -> Result<Self, MatcherError> {
        Self::new(TermDictionary::builtin())
    }

    pub fn dictionary(&self) -> &TermDictionary {
        &self.dictionary
    }

    /// Decides whether `article` is flagged for `company_name`.
    pub fn evaluate(&self, article: &Article, company_name: &str) -> MatchResult {
        let company = company_name.trim().to_lowercase();
        if company.is_empty() {
            return MatchResult::miss();
        }

        let text = article.normalized_text();
        if !text.contains(company.as_str()) {
            return MatchResult::miss();
        }

        match self.first_term(&text) {
            Some(term) => MatchResult::hit(term),
            None => MatchResult::miss(),
        }
    }

    /// First dictionary term present in already-normalized `text`.
    pub fn first_term(&self, text: &str) -> Option<&str> {
        // SetMatches iterates indices in ascending order.
        let index = self.patterns.matches(text).iter().next()?;
        self.dictionary.get(index)
    }
}

/// Builds a whole-word/phrase pattern for one normalized term.
///
/// `\b` is only asserted on edges that are word characters; an edge such as
/// `/` is a boundary by itself.
fn boundary_pattern(term: &str) -> String {
    let body = term
        .split(' ')
        .map(regex::escape)
        .collect::<Vec<_>>()
        .join(r"\s+");

    let starts_word = term.chars().next().is_some_and(is_word_char);
    let ends_word = term.chars().last().is_some_and(is_word_char);

    format!(
        "{}{}{}",
        if starts_word { r"\b" } else { "" },
        body,
        if ends_word { r"\b" } else { "" }
    )
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}
