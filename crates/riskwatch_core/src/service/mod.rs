//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate repository, provider, matcher and delivery calls into
//!   use-case level APIs.
//! - Keep CLI callers decoupled from storage and transport details.

pub mod password;
pub mod report_builder;
pub mod report_run;
pub mod session;
pub mod tenant_service;
