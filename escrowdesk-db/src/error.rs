//! Structured error types for the escrowdesk database layer.
//!
//! Nothing in this crate recovers from an error locally: every failure is
//! returned to the caller, which decides how to present it. Display strings
//! never include the connection URL.

use std::fmt;
use thiserror::Error;

/// Main error type for escrowdesk-db operations
#[derive(Error, Debug)]
pub enum DbError {
    /// No usable connection configuration (missing or malformed)
    #[error("Configuration error: {reason}")]
    Configuration { reason: String },

    /// The catalog query checking for a table failed
    #[error("Schema check failed for table '{table}': {source}")]
    SchemaCheck {
        table: &'static str,
        #[source]
        source: sqlx::Error,
    },

    /// The CREATE TABLE statement failed for a reason other than a creation race
    #[error("Schema creation failed for table '{table}': {source}")]
    SchemaCreation {
        table: &'static str,
        #[source]
        source: sqlx::Error,
    },

    /// A select or insert failed
    #[error("Query failed: {0}")]
    Query(#[from] sqlx::Error),

    /// Password hashing or verification failed
    #[error("Password hashing failed: {0}")]
    PasswordHash(#[from] bcrypt::BcryptError),

    /// A blocking worker (password hashing) panicked or was cancelled
    #[error("Background task failed: {0}")]
    Task(#[from] tokio::task::JoinError),

    /// Input rejected before reaching the database
    #[error("Invalid input: {0}")]
    Validation(#[from] ValidationError),

    /// `pool::init` called after the process-wide database was built
    #[error("Database already initialized")]
    AlreadyInitialized,
}

/// Result type alias for escrowdesk-db operations
pub type Result<T> = std::result::Result<T, DbError>;

impl DbError {
    /// Create a configuration error
    pub fn config(reason: impl Into<String>) -> Self {
        Self::Configuration {
            reason: reason.into(),
        }
    }

    /// True when the process cannot reach a database at all.
    pub fn is_fatal_config(&self) -> bool {
        matches!(self, Self::Configuration { .. } | Self::AlreadyInitialized)
    }
}

/// Validation error for values bound for a length-limited column
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Field is empty when it shouldn't be
    Empty { field: &'static str },

    /// Field exceeds the column's maximum length
    TooLong { field: &'static str, max: usize },

    /// Field exceeds a byte limit (e.g. bcrypt's 72-byte input)
    TooManyBytes { field: &'static str, max: usize },
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty { field } => write!(f, "{} cannot be empty", field),
            Self::TooLong { field, max } => {
                write!(f, "{} exceeds maximum length of {} characters", field, max)
            }
            Self::TooManyBytes { field, max } => {
                write!(f, "{} exceeds maximum length of {} bytes", field, max)
            }
        }
    }
}

impl std::error::Error for ValidationError {}

/// Check a value against a VARCHAR(n) column.
pub(crate) fn check_varchar(
    field: &'static str,
    value: &str,
    max: usize,
) -> std::result::Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::Empty { field });
    }
    if value.chars().count() > max {
        return Err(ValidationError::TooLong { field, max });
    }
    Ok(())
}
