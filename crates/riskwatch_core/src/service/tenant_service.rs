//! Tenant use-case service.
//!
//! # Responsibility
//! - Provide register/authenticate and tracked-company entry points.
//! - Validate input and hash passwords before delegating to the repository.
//!
//! # Invariants
//! - Every operation is scoped to one user; no call reads another tenant.
//! - Plaintext passwords are never persisted or logged.
//! - Service layer remains storage-agnostic.

use crate::model::tenant::{
    company_key, validate_company_name, validate_email, validate_password, validate_username,
    User, UserId,
};
use crate::repo::tenant_repo::{RepoError, RepoResult, TenantRepository};
use crate::service::password::{hash_password, verify_password};
use log::{info, warn};

/// Result of an add-company request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddCompanyOutcome {
    Added,
    AlreadyTracked,
}

/// Result of a remove-company request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoveCompanyOutcome {
    Removed,
    NotTracked,
}

/// Use-case service wrapper for tenant operations.
pub struct TenantService<R: TenantRepository> {
    repo: R,
}

impl<R: TenantRepository> TenantService<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Creates a new account.
    ///
    /// # Errors
    /// - [`RepoError::Validation`] for empty username or password.
    /// - [`RepoError::Conflict`] when the username is taken; the existing
    ///   account is left untouched.
    pub fn register(&self, username: &str, password: &str) -> RepoResult<UserId> {
        let username = validate_username(username)?;
        let password = validate_password(password)?;

        let password_hash =
            hash_password(password).map_err(|err| RepoError::Hashing(err.to_string()))?;

        match self.repo.create_user(username, &password_hash) {
            Ok(id) => {
                info!("event=tenant_register module=service status=ok user_id={id}");
                Ok(id)
            }
            Err(RepoError::Conflict(name)) => {
                warn!("event=tenant_register module=service status=conflict");
                Err(RepoError::Conflict(name))
            }
            Err(err) => Err(err),
        }
    }

    /// Returns the account when `password` matches the stored hash.
    pub fn authenticate(&self, username: &str, password: &str) -> RepoResult<Option<User>> {
        if username.trim().is_empty() || password.is_empty() {
            return Ok(None);
        }

        let Some(stored) = self.repo.find_credentials(username)? else {
            warn!("event=tenant_login module=service status=rejected");
            return Ok(None);
        };

        if verify_password(password, &stored.password_hash) {
            info!(
                "event=tenant_login module=service status=ok user_id={}",
                stored.user.id
            );
            Ok(Some(stored.user))
        } else {
            warn!("event=tenant_login module=service status=rejected");
            Ok(None)
        }
    }

    pub fn user(&self, user_id: UserId) -> RepoResult<Option<User>> {
        self.repo.get_user(user_id)
    }

    /// Stores the trimmed notification email, replacing any prior value.
    pub fn set_notification_email(&self, user_id: UserId, email: &str) -> RepoResult<()> {
        let email = validate_email(email)?;
        self.repo.set_email(user_id, email)
    }

    pub fn notification_email(&self, user_id: UserId) -> RepoResult<Option<String>> {
        self.require_user(user_id)
            .map(|user| user.notification_email)
    }

    /// Starts tracking a company; a repeat of the same normalized name is a no-op.
    pub fn add_tracked_company(
        &self,
        user_id: UserId,
        company_name: &str,
    ) -> RepoResult<AddCompanyOutcome> {
        let display_name = validate_company_name(company_name)?;
        let key = company_key(&display_name);

        if self.repo.insert_company(user_id, &display_name, &key)? {
            info!("event=company_add module=service status=ok user_id={user_id}");
            Ok(AddCompanyOutcome::Added)
        } else {
            info!("event=company_add module=service status=noop user_id={user_id}");
            Ok(AddCompanyOutcome::AlreadyTracked)
        }
    }

    /// Stops tracking a company for this user only; absent names are a no-op.
    pub fn remove_tracked_company(
        &self,
        user_id: UserId,
        company_name: &str,
    ) -> RepoResult<RemoveCompanyOutcome> {
        let key = company_key(company_name);
        if key.is_empty() {
            return Ok(RemoveCompanyOutcome::NotTracked);
        }

        if self.repo.delete_company(user_id, &key)? > 0 {
            info!("event=company_remove module=service status=ok user_id={user_id}");
            return Ok(RemoveCompanyOutcome::Removed);
        }

        self.require_user(user_id)?;
        Ok(RemoveCompanyOutcome::NotTracked)
    }

    /// Display names of the user's companies, in the order they were added.
    pub fn list_tracked_companies(&self, user_id: UserId) -> RepoResult<Vec<String>> {
        Ok(self
            .repo
            .list_companies(user_id)?
            .into_iter()
            .map(|company| company.company_name)
            .collect())
    }

    /// Users that have a notification email on file.
    pub fn users_with_email(&self) -> RepoResult<Vec<User>> {
        self.repo.list_users_with_email()
    }

    fn require_user(&self, user_id: UserId) -> RepoResult<User> {
        self.repo
            .get_user(user_id)?
            .ok_or(RepoError::NotFound(user_id))
    }
}
