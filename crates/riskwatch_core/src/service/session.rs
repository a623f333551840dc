//! Explicit login session for interactive callers.
//!
//! # Invariants
//! - Two states only: `LoggedOut` and `LoggedIn`.
//! - Tenant mutations are reachable only through a `LoggedIn` session and
//!   always act on that session's own user.

use crate::model::tenant::{User, UserId};
use crate::repo::tenant_repo::{RepoError, TenantRepository};
use crate::service::tenant_service::{AddCompanyOutcome, RemoveCompanyOutcome, TenantService};

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("not logged in")]
    NotLoggedIn,
    #[error("already logged in; log out first")]
    AlreadyLoggedIn,
    #[error("invalid credentials")]
    InvalidCredentials,
    #[error(transparent)]
    Repo(#[from] RepoError),
}

pub type SessionResult<T> = Result<T, SessionError>;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Session {
    #[default]
    LoggedOut,
    LoggedIn(User),
}

impl Session {
    pub fn new() -> Self {
        Self::LoggedOut
    }

    pub fn is_logged_in(&self) -> bool {
        matches!(self, Self::LoggedIn(_))
    }

    pub fn user(&self) -> SessionResult<&User> {
        match self {
            Self::LoggedIn(user) => Ok(user),
            Self::LoggedOut => Err(SessionError::NotLoggedIn),
        }
    }

    pub fn user_id(&self) -> SessionResult<UserId> {
        self.user().map(|user| user.id)
    }

    /// `LoggedOut -> LoggedIn` on valid credentials; state is unchanged otherwise.
    pub fn login<R: TenantRepository>(
        &mut self,
        tenants: &TenantService<R>,
        username: &str,
        password: &str,
    ) -> SessionResult<&User> {
        if self.is_logged_in() {
            return Err(SessionError::AlreadyLoggedIn);
        }

        let user = tenants
            .authenticate(username, password)?
            .ok_or(SessionError::InvalidCredentials)?;
        *self = Self::LoggedIn(user);
        self.user()
    }

    /// Registers a new account. The session stays logged out.
    pub fn register<R: TenantRepository>(
        &self,
        tenants: &TenantService<R>,
        username: &str,
        password: &str,
    ) -> SessionResult<UserId> {
        if self.is_logged_in() {
            return Err(SessionError::AlreadyLoggedIn);
        }
        Ok(tenants.register(username, password)?)
    }

    pub fn logout(&mut self) {
        *self = Self::LoggedOut;
    }

    pub fn set_notification_email<R: TenantRepository>(
        &mut self,
        tenants: &TenantService<R>,
        email: &str,
    ) -> SessionResult<()> {
        let user_id = self.user_id()?;
        tenants.set_notification_email(user_id, email)?;
        if let Self::LoggedIn(user) = self {
            user.notification_email = Some(email.trim().to_string());
        }
        Ok(())
    }

    pub fn add_company<R: TenantRepository>(
        &self,
        tenants: &TenantService<R>,
        company_name: &str,
    ) -> SessionResult<AddCompanyOutcome> {
        Ok(tenants.add_tracked_company(self.user_id()?, company_name)?)
    }

    pub fn remove_company<R: TenantRepository>(
        &self,
        tenants: &TenantService<R>,
        company_name: &str,
    ) -> SessionResult<RemoveCompanyOutcome> {
        Ok(tenants.remove_tracked_company(self.user_id()?, company_name)?)
    }

    pub fn companies<R: TenantRepository>(
        &self,
        tenants: &TenantService<R>,
    ) -> SessionResult<Vec<String>> {
        Ok(tenants.list_tracked_companies(self.user_id()?)?)
    }
}
