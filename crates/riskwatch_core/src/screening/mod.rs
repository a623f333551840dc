//! Adverse-media screening of articles.
//!
//! # Responsibility
//! - Hold the negative-term dictionary.
//! - Decide, per article and company, whether the article is flagged.
//!
//! # Invariants
//! - Terms match on word/phrase boundaries only, never inside larger words.
//! - Screening is pure; it performs no I/O and keeps no state between calls.

pub mod matcher;
pub mod terms;
