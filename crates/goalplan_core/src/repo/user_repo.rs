//! Account repository contract and SQLite implementation.

use crate::model::user::{validate_password_hash, UserAccount};
use crate::repo::goal_repo::{RepoError, RepoResult};
use rusqlite::{params, Connection};

/// Repository interface for login accounts.
pub trait UserRepository {
    /// Inserts a new account; fails with `AlreadyExists` for a taken username.
    fn create_user(&self, account: &UserAccount) -> RepoResult<()>;
    fn get_user(&self, username: &str) -> RepoResult<Option<UserAccount>>;
}

/// SQLite-backed account repository.
pub struct SqliteUserRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteUserRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl UserRepository for SqliteUserRepository<'_> {
    fn create_user(&self, account: &UserAccount) -> RepoResult<()> {
        let changed = self.conn.execute(
            "INSERT OR IGNORE INTO users (username, password_hash)
             VALUES (?1, ?2);",
            params![account.username.as_str(), account.password_hash.as_str()],
        )?;
        if changed == 0 {
            return Err(RepoError::AlreadyExists(format!(
                "user `{}`",
                account.username
            )));
        }
        Ok(())
    }

    fn get_user(&self, username: &str) -> RepoResult<Option<UserAccount>> {
        let mut stmt = self.conn.prepare(
            "SELECT username, password_hash FROM users WHERE username = ?1;",
        )?;
        let mut rows = stmt.query([username])?;
        let Some(row) = rows.next()? else {
            return Ok(None);
        };

        let password_hash: String = row.get("password_hash")?;
        validate_password_hash(&password_hash).map_err(|err| {
            RepoError::InvalidData(format!("users.password_hash for `{username}`: {err}"))
        })?;
        Ok(Some(UserAccount {
            username: row.get("username")?,
            password_hash,
        }))
    }
}
