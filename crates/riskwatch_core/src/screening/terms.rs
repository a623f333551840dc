//! Negative-term dictionary.
//!
//! # Invariants
//! - Entries are lowercase, whitespace-collapsed and non-empty.
//! - No two entries normalize to the same string.
//! - Enumeration order is the tie-break order used by the matcher.

use std::collections::HashSet;

/// Built-in adverse-media vocabulary, in tie-break order.
pub const DEFAULT_NEGATIVE_TERMS: &[&str] = &[
    "abuse", "accuse", "allege", "ambush", "aml", "arraign", "arrest", "assault",
    "asset freeze", "attack", "bankrupt", "beat", "blackmail", "breach", "bribe",
    "chapter pre/1", "chapter 7", "chapter 11", "captive", "censure", "charge",
    "class action", "conspire", "conspirator", "co conspirator", "contraband", "convict",
    "corrupt", "counterfeit", "court", "crime", "criminal", "criticism", "deceive",
    "deception", "deprave", "defendant", "defraud", "denied", "deny", "discipline",
    "discriminate", "distort", "doj", "department of justice", "drug", "detain",
    "detention", "disgrace", "disqualify", "embattled", "embezzle", "extort", "extremist",
    "fail", "felon", "fined", "fraud", "fcpa", "foreign corrupt practices act", "fugitive",
    "guilty", "harass", "illegal", "illicit", "imprison", "incarcerate", "incrimination",
    "indict", "injunction", "inside deal", "inside info", "insolvent", "investigation",
    "kickback", "kidnap", "jail", "judgment", "larceny", "laundering", "lawsuit", "license",
    "liquidate", "litigation", "loss", "mafia", "manipulate", "misappropriate",
    "misconduct", "misdemeanor", "mismanage", "misrepresent", "mob", "money laundering",
    "murder", "narcotic", "negligence", "nefarious", "offend", "offensive",
    "organized crime", "panama papers", "parole", "politically exposed", "prohibit",
    "probation", "prosecute", "racketeer", "rape", "robbery", "revocation", "revoke",
    "risk", "sabotage", "sanction", "scam", "scandal", "separate", "sexual", "smuggle",
    "steal", "stole", "sued", "suing", "suspend", "terminate", "terrorist", "theft",
    "threat", "trafficking", "unlawful", "verdict", "violate", "violent", "watchlist",
    "wikileaks",
];

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DictionaryError {
    #[error("negative term at position {0} is empty")]
    EmptyTerm(usize),
    #[error("negative term `{0}` appears more than once")]
    DuplicateTerm(String),
}

/// Immutable, ordered set of negative terms and phrases.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TermDictionary {
    terms: Vec<String>,
}

impl TermDictionary {
    /// Builds a dictionary from caller-supplied terms.
    ///
    /// # Errors
    /// - [`DictionaryError::EmptyTerm`] for blank entries.
    /// - [`DictionaryError::DuplicateTerm`] when two entries normalize equal.
    pub fn new<I, S>(terms: I) -> Result<Self, DictionaryError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut seen = HashSet::new();
        let mut normalized_terms = Vec::new();
        for (position, raw) in terms.into_iter().enumerate() {
            let term = normalize_term(raw.as_ref());
            if term.is_empty() {
                return Err(DictionaryError::EmptyTerm(position));
            }
            if !seen.insert(term.clone()) {
                return Err(DictionaryError::DuplicateTerm(term));
            }
            normalized_terms.push(term);
        }

        Ok(Self {
            terms: normalized_terms,
        })
    }

    /// The built-in adverse-media dictionary.
    pub fn builtin() -> Self {
        Self {
            terms: DEFAULT_NEGATIVE_TERMS
                .iter()
                .map(|term| normalize_term(term))
                .collect(),
        }
    }

    pub fn terms(&self) -> impl Iterator<Item = &str> {
        self.terms.iter().map(String::as_str)
    }

    pub fn get(&self, index: usize) -> Option<&str> {
        self.terms.get(index).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.terms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }
}

impl Default for TermDictionary {
    fn default() -> Self {
        Self::builtin()
    }
}

/// Lowercases and collapses whitespace runs to single spaces.
pub fn normalize_term(raw: &str) -> String {
    raw.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::{DictionaryError, TermDictionary, DEFAULT_NEGATIVE_TERMS};

    #[test]
    fn builtin_terms_are_unique_after_normalization() {
        TermDictionary::new(DEFAULT_NEGATIVE_TERMS).expect("builtin list must be valid");
        assert_eq!(TermDictionary::builtin().len(), DEFAULT_NEGATIVE_TERMS.len());
    }

    #[test]
    fn builtin_keeps_phrases_atomic() {
        let dictionary = TermDictionary::builtin();
        assert!(dictionary.terms().any(|term| term == "money laundering"));
        assert!(dictionary.terms().any(|term| term == "asset freeze"));
    }

    #[test]
    fn new_rejects_normalized_duplicates() {
        let err = TermDictionary::new(["fraud", "Money  Laundering", "money laundering"])
            .unwrap_err();
        assert_eq!(err, DictionaryError::DuplicateTerm("money laundering".to_string()));
    }

    #[test]
    fn new_rejects_blank_terms() {
        let err = TermDictionary::new(["fraud", "  "]).unwrap_err();
        assert_eq!(err, DictionaryError::EmptyTerm(1));
    }
}
