//! Domain model for adverse-media screening.
//!
//! # Responsibility
//! - Define the records exchanged between the matcher, the tenant store and
//!   the report builder.
//!
//! # Invariants
//! - Articles and reports are transient; only tenant records are persisted.
//! - Company names are compared through [`tenant::company_key`] in the tenant store.

pub mod article;
pub mod report;
pub mod tenant;
