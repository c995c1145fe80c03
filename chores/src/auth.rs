//! Who may do what: toggle authorization and the household user directory.
//!
//! The directory is small: usernames with salted SHA-256 password digests,
//! seeded from configuration at startup. Changed passwords are exported as
//! [`StoredCredential`]s so the board can save them and apply them again on
//! the next start.

use std::collections::HashMap;
use std::sync::Arc;

use chores_proto::credential::StoredCredential;
use chores_proto::resident::Assignee;
use serde::Serialize;
use sha2::{Digest, Sha256};

/// Shortest password accepted by [`UserRepository::change_password`].
pub const MIN_PASSWORD_LEN: usize = 6;

const SALT_PREFIX: &str = "chores-board:";

/// Error type for login and password changes.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthError {
    /// Username or password did not match.
    #[error("invalid username or password")]
    InvalidCredentials,
    /// No such user.
    #[error("unknown user: {0}")]
    UnknownUser(String),
    /// The current password given for a change was wrong.
    #[error("current password is incorrect")]
    WrongPassword,
    /// The new password is too short.
    #[error("password must be at least {MIN_PASSWORD_LEN} characters")]
    PasswordTooShort,
}

// --- toggle authorization ---

/// Decides whether a requester may toggle a task.
pub trait Authorizer: Send + Sync {
    /// Whether `requester` may complete or reopen a task assigned to
    /// `assigned_to`.
    fn may_toggle(&self, assigned_to: &Assignee, requester: &str) -> bool;
}

/// Only the current assignee (either member of a pair) may toggle.
#[derive(Debug, Clone, Copy, Default)]
pub struct AssigneeAuthorizer;

impl Authorizer for AssigneeAuthorizer {
    fn may_toggle(&self, assigned_to: &Assignee, requester: &str) -> bool {
        assigned_to.includes(requester)
    }
}

impl<A: Authorizer + ?Sized> Authorizer for Arc<A> {
    fn may_toggle(&self, assigned_to: &Assignee, requester: &str) -> bool {
        (**self).may_toggle(assigned_to, requester)
    }
}

// --- user directory ---

/// A user as seen after a successful login.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserInfo {
    /// Display name as configured.
    pub username: String,
    /// Whether the user may reset the board.
    pub admin: bool,
}

/// Credential lookup and password updates.
pub trait UserRepository: Send + Sync {
    /// Checks a username/password pair.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidCredentials` if either part is wrong.
    fn verify(&self, username: &str, password: &str) -> Result<UserInfo, AuthError>;

    /// Replaces a user's password after checking the current one.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::UnknownUser`, `AuthError::WrongPassword`, or
    /// `AuthError::PasswordTooShort`.
    fn change_password(
        &mut self,
        username: &str,
        current: &str,
        new: &str,
    ) -> Result<(), AuthError>;

    /// Looks a user up by name (case-insensitive).
    fn user(&self, username: &str) -> Option<UserInfo>;
}

#[derive(Debug, Clone)]
struct UserRecord {
    username: String,
    digest: String,
    admin: bool,
    changed: bool,
}

/// In-memory [`UserRepository`].
#[derive(Debug, Clone, Default)]
pub struct UserDirectory {
    users: HashMap<String, UserRecord>,
}

impl UserDirectory {
    /// Creates an empty directory.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a user (replacing any user with the same name).
    pub fn add_user(&mut self, username: &str, password: &str, admin: bool) {
        let key = username.to_lowercase();
        let digest = password_digest(&key, password);
        self.users.insert(
            key,
            UserRecord {
                username: username.to_string(),
                digest,
                admin,
                changed: false,
            },
        );
    }

    /// Digests of every password changed since the directory was seeded,
    /// ordered by username.
    #[must_use]
    pub fn credentials(&self) -> Vec<StoredCredential> {
        let mut changed: Vec<StoredCredential> = self
            .users
            .values()
            .filter(|record| record.changed)
            .map(|record| StoredCredential {
                username: record.username.clone(),
                digest: record.digest.clone(),
            })
            .collect();
        changed.sort_by_key(|c| c.username.to_lowercase());
        changed
    }

    /// Applies saved digests over the seeded ones. Credentials for users
    /// that are no longer configured are dropped. Returns how many were
    /// applied.
    pub fn restore_credentials(&mut self, credentials: Vec<StoredCredential>) -> usize {
        let mut applied = 0;
        for credential in credentials {
            match self.users.get_mut(&credential.username.to_lowercase()) {
                Some(record) => {
                    record.digest = credential.digest;
                    record.changed = true;
                    applied += 1;
                }
                None => {
                    tracing::warn!(
                        username = %credential.username,
                        "dropping saved password for unknown user"
                    );
                }
            }
        }
        applied
    }

    /// Number of users.
    #[must_use]
    pub fn len(&self) -> usize {
        self.users.len()
    }

    /// Whether the directory has no users.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }
}

impl UserRepository for UserDirectory {
    fn verify(&self, username: &str, password: &str) -> Result<UserInfo, AuthError> {
        let key = username.to_lowercase();
        let record = self.users.get(&key).ok_or(AuthError::InvalidCredentials)?;
        if record.digest != password_digest(&key, password) {
            tracing::debug!(username, "login rejected");
            return Err(AuthError::InvalidCredentials);
        }
        Ok(UserInfo {
            username: record.username.clone(),
            admin: record.admin,
        })
    }

    fn change_password(
        &mut self,
        username: &str,
        current: &str,
        new: &str,
    ) -> Result<(), AuthError> {
        let key = username.to_lowercase();
        let record = self
            .users
            .get_mut(&key)
            .ok_or_else(|| AuthError::UnknownUser(username.to_string()))?;
        if record.digest != password_digest(&key, current) {
            return Err(AuthError::WrongPassword);
        }
        if new.chars().count() < MIN_PASSWORD_LEN {
            return Err(AuthError::PasswordTooShort);
        }
        record.digest = password_digest(&key, new);
        record.changed = true;
        tracing::info!(username = %record.username, "password changed");
        Ok(())
    }

    fn user(&self, username: &str) -> Option<UserInfo> {
        self.users
            .get(&username.to_lowercase())
            .map(|record| UserInfo {
                username: record.username.clone(),
                admin: record.admin,
            })
    }
}

fn password_digest(key: &str, password: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(SALT_PREFIX.as_bytes());
    hasher.update(key.as_bytes());
    hasher.update(b":");
    hasher.update(password.as_bytes());
    hex::encode(hasher.finalize())
}
