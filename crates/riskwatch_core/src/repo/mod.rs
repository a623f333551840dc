//! Repository layer abstractions and persistence implementations.
//!
//! # Responsibility
//! - Define tenant-scoped data access contracts.
//! - Isolate SQLite query details from service orchestration.
//!
//! # Invariants
//! - Every tracked-company query is filtered by `user_id`.
//! - Repository APIs return semantic errors (`NotFound`, `Conflict`) in
//!   addition to DB transport errors.

pub mod tenant_repo;
