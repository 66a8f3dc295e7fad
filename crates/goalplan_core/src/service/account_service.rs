//! Account registration and login.
//!
//! # Invariants
//! - Usernames are trimmed before any check or write.
//! - Passwords are only handled as Argon2 hashes past this layer.
//! - A password must contain at least one non-whitespace character; it is
//!   otherwise stored exactly as typed.
//! - Log events never include usernames or passwords.

use crate::model::user::{is_valid_username, PasswordHashError, UserAccount};
use crate::repo::goal_repo::RepoError;
use crate::repo::user_repo::UserRepository;
use log::{info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};

#[derive(Debug)]
pub enum AccountError {
    /// A required form field was empty.
    MissingField(&'static str),
    InvalidUsername(String),
    UserExists(String),
    InvalidCredentials,
    PasswordHash(PasswordHashError),
    Repo(RepoError),
}

impl Display for AccountError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingField(field) => write!(f, "{field} is required"),
            Self::InvalidUsername(username) => write!(
                f,
                "invalid username `{username}`; use 1-64 letters, digits, `_`, `.` or `-`"
            ),
            Self::UserExists(username) => write!(f, "user `{username}` already exists"),
            Self::InvalidCredentials => write!(f, "incorrect username or password"),
            Self::PasswordHash(err) => write!(f, "{err}"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for AccountError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::PasswordHash(err) => Some(err),
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<PasswordHashError> for AccountError {
    fn from(value: PasswordHashError) -> Self {
        Self::PasswordHash(value)
    }
}

impl From<RepoError> for AccountError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

/// Use-case service for login accounts.
pub struct AccountService<R: UserRepository> {
    repo: R,
}

impl<R: UserRepository> AccountService<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Creates an account.
    ///
    /// # Errors
    /// - `MissingField` when username or password is empty or only whitespace.
    /// - `InvalidUsername` when the username breaks naming rules.
    /// - `UserExists` when the username is taken.
    pub fn register(&self, username: &str, password: &str) -> Result<(), AccountError> {
        let username = username.trim();
        if username.is_empty() {
            return Err(AccountError::MissingField("username"));
        }
        if password.trim().is_empty() {
            return Err(AccountError::MissingField("password"));
        }
        if !is_valid_username(username) {
            return Err(AccountError::InvalidUsername(username.to_string()));
        }

        let account = UserAccount::with_password(username, password)?;
        match self.repo.create_user(&account) {
            Ok(()) => {
                info!("event=account_register module=service status=ok");
                Ok(())
            }
            Err(RepoError::AlreadyExists(_)) => {
                warn!("event=account_register module=service status=error error_code=user_exists");
                Err(AccountError::UserExists(username.to_string()))
            }
            Err(err) => Err(err.into()),
        }
    }

    /// Returns whether the pair matches a stored account.
    pub fn verify_credentials(&self, username: &str, password: &str) -> Result<bool, AccountError> {
        let account = self.repo.get_user(username.trim())?;
        Ok(account.is_some_and(|account| account.verify_password(password)))
    }

    /// Checks credentials and returns the canonical username on success.
    pub fn login(&self, username: &str, password: &str) -> Result<String, AccountError> {
        if self.verify_credentials(username, password)? {
            info!("event=account_login module=service status=ok");
            Ok(username.trim().to_string())
        } else {
            warn!("event=account_login module=service status=error error_code=invalid_credentials");
            Err(AccountError::InvalidCredentials)
        }
    }
}
