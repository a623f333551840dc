//! Tenant repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Persist users, credentials and tracked companies.
//! - Keep SQL details inside the core persistence boundary.
//!
//! # Invariants
//! - Each mutation is a single statement, committed before returning.
//! - `(user_id, company_key)` is unique; duplicate adds are no-ops.
//! - Tracked-company reads and deletes never cross `user_id`.

use crate::db::DbError;
use crate::model::tenant::{TenantValidationError, TrackedCompany, User, UserId};
use rusqlite::{params, Connection, OptionalExtension, Row};

const USER_SELECT_SQL: &str = "SELECT id, username, email FROM users";

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository error for tenant persistence and query operations.
#[derive(Debug, thiserror::Error)]
pub enum RepoError {
    #[error(transparent)]
    Validation(#[from] TenantValidationError),
    #[error(transparent)]
    Db(#[from] DbError),
    #[error("user not found: {0}")]
    NotFound(UserId),
    #[error("username already exists: {0}")]
    Conflict(String),
    #[error("invalid persisted tenant data: {0}")]
    InvalidData(String),
    #[error("password hashing failed: {0}")]
    Hashing(String),
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Stored account together with its password hash.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredCredentials {
    pub user: User,
    pub password_hash: String,
}

/// Repository interface for tenant data.
pub trait TenantRepository {
    fn create_user(&self, username: &str, password_hash: &str) -> RepoResult<UserId>;
    fn find_credentials(&self, username: &str) -> RepoResult<Option<StoredCredentials>>;
    fn get_user(&self, id: UserId) -> RepoResult<Option<User>>;
    fn set_email(&self, id: UserId, email: &str) -> RepoResult<()>;
    /// Returns `false` when the company key was already tracked.
    fn insert_company(&self, id: UserId, company_name: &str, company_key: &str)
        -> RepoResult<bool>;
    /// Returns the number of removed rows.
    fn delete_company(&self, id: UserId, company_key: &str) -> RepoResult<usize>;
    fn list_companies(&self, id: UserId) -> RepoResult<Vec<TrackedCompany>>;
    fn list_users_with_email(&self) -> RepoResult<Vec<User>>;
}

/// SQLite-backed tenant repository.
pub struct SqliteTenantRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteTenantRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl TenantRepository for SqliteTenantRepository<'_> {
    fn create_user(&self, username: &str, password_hash: &str) -> RepoResult<UserId> {
        let inserted = self.conn.execute(
            "INSERT INTO users (username, password_hash) VALUES (?1, ?2);",
            params![username, password_hash],
        );

        match inserted {
            Ok(_) => Ok(self.conn.last_insert_rowid()),
            Err(err) if is_constraint(&err, rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE) => {
                Err(RepoError::Conflict(username.to_string()))
            }
            Err(err) => Err(err.into()),
        }
    }

    fn find_credentials(&self, username: &str) -> RepoResult<Option<StoredCredentials>> {
        let row = self
            .conn
            .query_row(
                "SELECT id, username, email, password_hash FROM users WHERE username = ?1;",
                [username],
                |row| Ok((parse_user_row(row), row.get::<_, String>("password_hash")?)),
            )
            .optional()?;

        match row {
            Some((user, password_hash)) => Ok(Some(StoredCredentials {
                user: user?,
                password_hash,
            })),
            None => Ok(None),
        }
    }

    fn get_user(&self, id: UserId) -> RepoResult<Option<User>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{USER_SELECT_SQL} WHERE id = ?1;"))?;
        let mut rows = stmt.query([id])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_user_row(row)?));
        }

        Ok(None)
    }

    fn set_email(&self, id: UserId, email: &str) -> RepoResult<()> {
        let changed = self
            .conn
            .execute("UPDATE users SET email = ?1 WHERE id = ?2;", params![email, id])?;

        if changed == 0 {
            return Err(RepoError::NotFound(id));
        }

        Ok(())
    }

    fn insert_company(
        &self,
        id: UserId,
        company_name: &str,
        company_key: &str,
    ) -> RepoResult<bool> {
        let inserted = self.conn.execute(
            "INSERT INTO tracked_companies (user_id, company_name, company_key)
             VALUES (?1, ?2, ?3)
             ON CONFLICT (user_id, company_key) DO NOTHING;",
            params![id, company_name, company_key],
        );

        match inserted {
            Ok(changed) => Ok(changed > 0),
            Err(err) if is_constraint(&err, rusqlite::ffi::SQLITE_CONSTRAINT_FOREIGNKEY) => {
                Err(RepoError::NotFound(id))
            }
            Err(err) => Err(err.into()),
        }
    }

    fn delete_company(&self, id: UserId, company_key: &str) -> RepoResult<usize> {
        let removed = self.conn.execute(
            "DELETE FROM tracked_companies WHERE user_id = ?1 AND company_key = ?2;",
            params![id, company_key],
        )?;
        Ok(removed)
    }

    fn list_companies(&self, id: UserId) -> RepoResult<Vec<TrackedCompany>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, user_id, company_name
             FROM tracked_companies
             WHERE user_id = ?1
             ORDER BY id ASC;",
        )?;
        let mut rows = stmt.query([id])?;
        let mut companies = Vec::new();

        while let Some(row) = rows.next()? {
            companies.push(parse_company_row(row)?);
        }

        Ok(companies)
    }

    fn list_users_with_email(&self) -> RepoResult<Vec<User>> {
        let mut stmt = self.conn.prepare(&format!(
            "{USER_SELECT_SQL}
             WHERE email IS NOT NULL AND trim(email) <> ''
             ORDER BY id ASC;"
        ))?;
        let mut rows = stmt.query([])?;
        let mut users = Vec::new();

        while let Some(row) = rows.next()? {
            users.push(parse_user_row(row)?);
        }

        Ok(users)
    }
}

fn parse_user_row(row: &Row<'_>) -> RepoResult<User> {
    let id: UserId = row.get("id")?;
    let username: String = row.get("username")?;
    if username.trim().is_empty() {
        return Err(RepoError::InvalidData(format!(
            "empty username in users.username for id {id}"
        )));
    }

    Ok(User {
        id,
        username,
        notification_email: row.get("email")?,
    })
}

fn parse_company_row(row: &Row<'_>) -> RepoResult<TrackedCompany> {
    let id: i64 = row.get("id")?;
    let company_name: String = row.get("company_name")?;
    if company_name.trim().is_empty() {
        return Err(RepoError::InvalidData(format!(
            "empty company name in tracked_companies.company_name for id {id}"
        )));
    }

    Ok(TrackedCompany {
        id,
        user_id: row.get("user_id")?,
        company_name,
    })
}

fn is_constraint(err: &rusqlite::Error, extended_code: i32) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(failure, _) if failure.extended_code == extended_code
    )
}
