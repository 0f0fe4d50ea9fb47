//! Error type shared by the store, the token store and the registration service.

use sea_orm::{DbErr, SqlErr};
use thiserror::Error;

/// Errors surfaced by registration and access-token operations.
///
/// Lookup misses are not errors: they come back as `Ok(None)`.
#[derive(Debug, Error)]
pub enum RegistrationError {
    #[error("Validation failed: {0}")]
    Validation(String),

    /// A unique index rejected the write (username, linked account or token).
    #[error("Duplicate value: {0}")]
    Uniqueness(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Gave up generating a unique {what} after {attempts} attempts")]
    ResourceExhausted { what: &'static str, attempts: u32 },

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl RegistrationError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    #[must_use]
    pub const fn is_uniqueness(&self) -> bool {
        matches!(self, Self::Uniqueness(_))
    }

    /// Whether a unique index over `column` (e.g. `users.username`) rejected the write.
    #[must_use]
    pub fn is_uniqueness_on(&self, column: &str) -> bool {
        matches!(self, Self::Uniqueness(detail) if detail.contains(column))
    }
}

impl From<DbErr> for RegistrationError {
    fn from(err: DbErr) -> Self {
        match err.sql_err() {
            Some(SqlErr::UniqueConstraintViolation(detail)) => Self::Uniqueness(detail),
            _ => Self::Database(err.to_string()),
        }
    }
}

impl From<anyhow::Error> for RegistrationError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(err.to_string())
    }
}

impl From<tokio::task::JoinError> for RegistrationError {
    fn from(err: tokio::task::JoinError) -> Self {
        Self::Internal(format!("Blocking task failed: {err}"))
    }
}

pub type Result<T, E = RegistrationError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generic_db_errors_map_to_database() {
        let err: RegistrationError = DbErr::Custom("boom".to_string()).into();
        assert!(matches!(err, RegistrationError::Database(_)));
        assert!(!err.is_uniqueness());
    }

    #[test]
    fn uniqueness_names_the_violated_column() {
        let err = RegistrationError::Uniqueness(
            "UNIQUE constraint failed: users.username".to_string(),
        );
        assert!(err.is_uniqueness_on("users.username"));
        assert!(!err.is_uniqueness_on("linked_accounts.account_id"));

        let err = RegistrationError::validation("users.username");
        assert!(!err.is_uniqueness_on("users.username"));
    }

    #[test]
    fn anyhow_errors_map_to_internal() {
        let err: RegistrationError = anyhow::anyhow!("hash failed").into();
        assert!(matches!(err, RegistrationError::Internal(msg) if msg == "hash failed"));
    }

    #[test]
    fn exhausted_message_names_the_resource() {
        let err = RegistrationError::ResourceExhausted {
            what: "access token",
            attempts: 16,
        };
        assert_eq!(
            err.to_string(),
            "Gave up generating a unique access token after 16 attempts"
        );
    }
}
