//! Tenant records: users and the companies they track.
//!
//! # Responsibility
//! - Define user and tracked-company shapes shared by repo and service layers.
//! - Own input validation and company-name normalization.
//!
//! # Invariants
//! - A user never tracks two companies with the same [`company_key`].
//! - Password hashes never leave the repository layer inside [`User`].

/// Row identifier of a user in the tenant store.
pub type UserId = i64;

/// Account view returned to callers. Carries no credential material.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: UserId,
    pub username: String,
    pub notification_email: Option<String>,
}

/// One company monitored by one user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackedCompany {
    pub id: i64,
    pub user_id: UserId,
    /// Display name as first entered, trimmed and whitespace-collapsed.
    pub company_name: String,
}

/// Rejected tenant input. No state is changed when one of these is returned.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TenantValidationError {
    #[error("username cannot be empty")]
    EmptyUsername,
    #[error("password cannot be empty")]
    EmptyPassword,
    #[error("email cannot be empty")]
    EmptyEmail,
    #[error("company name cannot be empty")]
    EmptyCompanyName,
}

/// Trims and collapses inner whitespace runs to a single space.
pub fn normalize_company_name(raw: &str) -> String {
    raw.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Case- and whitespace-insensitive identity of a company name.
pub fn company_key(raw: &str) -> String {
    normalize_company_name(raw).to_lowercase()
}

pub(crate) fn validate_username(username: &str) -> Result<&str, TenantValidationError> {
    let trimmed = username.trim();
    if trimmed.is_empty() {
        return Err(TenantValidationError::EmptyUsername);
    }
    // Stored as given; uniqueness is case-sensitive.
    Ok(username)
}

pub(crate) fn validate_password(password: &str) -> Result<&str, TenantValidationError> {
    if password.is_empty() {
        return Err(TenantValidationError::EmptyPassword);
    }
    Ok(password)
}

pub(crate) fn validate_email(email: &str) -> Result<&str, TenantValidationError> {
    let trimmed = email.trim();
    if trimmed.is_empty() {
        return Err(TenantValidationError::EmptyEmail);
    }
    Ok(trimmed)
}

pub(crate) fn validate_company_name(raw: &str) -> Result<String, TenantValidationError> {
    let normalized = normalize_company_name(raw);
    if normalized.is_empty() {
        return Err(TenantValidationError::EmptyCompanyName);
    }
    Ok(normalized)
}

#[cfg(test)]
mod tests {
    use super::{
        company_key, normalize_company_name, validate_company_name, validate_email,
        validate_username, TenantValidationError,
    };

    #[test]
    fn company_key_ignores_case_and_spacing() {
        assert_eq!(company_key("  Wells   Fargo "), "wells fargo");
        assert_eq!(company_key("WELLS FARGO"), company_key("wells fargo"));
        assert_eq!(normalize_company_name(" Wells\tFargo "), "Wells Fargo");
    }

    #[test]
    fn blank_inputs_are_rejected() {
        assert_eq!(
            validate_company_name("   "),
            Err(TenantValidationError::EmptyCompanyName)
        );
        assert_eq!(validate_email(" \t"), Err(TenantValidationError::EmptyEmail));
        assert_eq!(validate_username(""), Err(TenantValidationError::EmptyUsername));
    }

    #[test]
    fn email_is_trimmed() {
        assert_eq!(validate_email("  a@b.test "), Ok("a@b.test"));
    }
}
