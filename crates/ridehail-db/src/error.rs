//! Error types for the data layer.
//!
//! All errors are propagated via [`DbError`] which wraps the underlying
//! [`sqlx`] errors. Callers never inspect error messages: conflict-class
//! failures are classified by SQLSTATE into [`ConflictClass`] so the
//! transition engine can decide whether to retry.

use std::borrow::Cow;

/// SQLSTATE for `serialization_failure`.
pub const SQLSTATE_SERIALIZATION_FAILURE: &str = "40001";

/// SQLSTATE for `deadlock_detected`.
pub const SQLSTATE_DEADLOCK_DETECTED: &str = "40P01";

/// A transaction aborted because it lost against a concurrent transaction.
///
/// Both classes are safe to retry from the start of the transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConflictClass {
    /// The serializable snapshot could not be committed (`40001`).
    SerializationFailure,
    /// `PostgreSQL` broke a lock cycle by aborting this transaction (`40P01`).
    Deadlock,
}

impl ConflictClass {
    /// Classify a SQLSTATE code. Returns `None` for non-conflict codes.
    pub fn from_sqlstate(code: &str) -> Option<Self> {
        match code {
            SQLSTATE_SERIALIZATION_FAILURE => Some(Self::SerializationFailure),
            SQLSTATE_DEADLOCK_DETECTED => Some(Self::Deadlock),
            _ => None,
        }
    }
}

/// Errors that can occur in the data layer.
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    /// A `PostgreSQL` operation failed.
    #[error("PostgreSQL error: {0}")]
    Postgres(#[from] sqlx::Error),

    /// A `PostgreSQL` migration failed.
    #[error("PostgreSQL migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// A row held a value outside the closed set the schema allows.
    #[error("corrupt row: {0}")]
    Corrupt(String),

    /// A configuration error.
    #[error("Configuration error: {0}")]
    Config(String),
}

impl DbError {
    /// The SQLSTATE of the underlying database error, if any.
    pub fn sqlstate(&self) -> Option<Cow<'_, str>> {
        match self {
            Self::Postgres(sqlx::Error::Database(db)) => db.code(),
            _ => None,
        }
    }

    /// The conflict class of this error, if it is one.
    pub fn conflict_class(&self) -> Option<ConflictClass> {
        self.sqlstate()
            .and_then(|code| ConflictClass::from_sqlstate(&code))
    }

    /// Whether retrying the whole transaction may succeed.
    pub fn is_retryable(&self) -> bool {
        self.conflict_class().is_some()
    }

    /// Whether a foreign key constraint rejected the statement.
    pub fn is_foreign_key_violation(&self) -> bool {
        matches!(
            self,
            Self::Postgres(sqlx::Error::Database(db)) if db.is_foreign_key_violation()
        )
    }

    /// Whether a unique constraint rejected the statement.
    pub fn is_unique_violation(&self) -> bool {
        matches!(
            self,
            Self::Postgres(sqlx::Error::Database(db)) if db.is_unique_violation()
        )
    }
}
