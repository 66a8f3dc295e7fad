//! User account model and credential hashing.
//!
//! # Responsibility
//! - Define the stored shape of a login account.
//! - Derive Argon2 password hashes so plain passwords never reach storage.
//!
//! # Invariants
//! - `username` matches `USERNAME_RE`.
//! - `password_hash` is an Argon2 PHC string carrying its own salt and parameters.

use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use once_cell::sync::Lazy;
use regex::Regex;
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

static USERNAME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9_.\-]{1,64}$").expect("valid username regex"));

/// Failure while deriving or reading a password hash.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PasswordHashError(String);

impl Display for PasswordHashError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "password hash error: {}", self.0)
    }
}

impl Error for PasswordHashError {}

impl From<argon2::password_hash::Error> for PasswordHashError {
    fn from(value: argon2::password_hash::Error) -> Self {
        Self(value.to_string())
    }
}

/// Stored login account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserAccount {
    pub username: String,
    pub password_hash: String,
}

impl UserAccount {
    /// Builds an account whose hash uses a fresh random salt.
    pub fn with_password(
        username: impl Into<String>,
        password: &str,
    ) -> Result<Self, PasswordHashError> {
        Ok(Self {
            username: username.into(),
            password_hash: hash_password(password)?,
        })
    }

    /// Returns whether `password` matches the stored hash.
    ///
    /// A hash that does not parse as a PHC string never matches.
    pub fn verify_password(&self, password: &str) -> bool {
        let Ok(parsed) = PasswordHash::new(&self.password_hash) else {
            return false;
        };
        Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok()
    }
}

/// Returns whether `username` is acceptable as an account name.
pub fn is_valid_username(username: &str) -> bool {
    USERNAME_RE.is_match(username)
}

/// Checks that `value` is a well-formed PHC hash string.
pub fn validate_password_hash(value: &str) -> Result<(), PasswordHashError> {
    PasswordHash::new(value)?;
    Ok(())
}

fn hash_password(password: &str) -> Result<String, PasswordHashError> {
    let salt = SaltString::encode_b64(Uuid::new_v4().as_bytes())?;
    let hash = Argon2::default().hash_password(password.as_bytes(), &salt)?;
    Ok(hash.to_string())
}
