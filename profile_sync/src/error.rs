//! Error types for the store boundary, the save protocol, and field edits.
//!
//! Failures are classified by what the caller can do about them:
//! - absence ([`StoreError::NotFound`]) is never surfaced; readers turn it into `None`
//! - single-table failures during the parallel phase of a save are collected into
//!   [`SaveError::Sections`], without rolling back the sections that committed
//! - a failed specialty replace aborts the save ([`SaveError::Specialties`])
//! - city-path failures never reach this module; they are logged and dropped

use diesel::result::{DatabaseErrorKind, Error as DieselError};
use thiserror::Error;

/// Result type used throughout the store implementations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors raised by a [`crate::store::ProfileStore`].
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StoreError {
    /// The requested row does not exist.
    #[error("record not found")]
    NotFound,

    /// The store rejected a value it could not parse or that broke a check constraint.
    #[error("invalid input syntax: {0}")]
    InvalidInput(String),

    /// A unique constraint rejected the write.
    #[error("duplicate key: {0}")]
    UniqueViolation(String),

    /// A foreign key constraint rejected the write.
    #[error("foreign key violation: {0}")]
    ForeignKeyViolation(String),

    /// Any other query failure.
    #[error("query failed: {0}")]
    Query(String),

    /// No connection could be checked out of the pool.
    #[error("connection pool error: {0}")]
    Pool(String),

    /// The blocking task running the query panicked or was cancelled.
    #[error("store task failed: {0}")]
    Task(String),
}

impl StoreError {
    /// True for the "row does not exist" outcome.
    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound)
    }

    /// Message suitable for showing to the person editing the profile.
    pub fn user_message(&self) -> String {
        match self {
            StoreError::InvalidInput(_) => {
                "problem with location data, check selected cities".to_string()
            }
            StoreError::UniqueViolation(_) => "duplicate data, try again".to_string(),
            StoreError::ForeignKeyViolation(_) => {
                "invalid reference in submitted data".to_string()
            }
            StoreError::NotFound => self.to_string(),
            StoreError::Query(msg) | StoreError::Pool(msg) | StoreError::Task(msg) => msg.clone(),
        }
    }
}

impl From<DieselError> for StoreError {
    fn from(err: DieselError) -> Self {
        match err {
            DieselError::NotFound => StoreError::NotFound,
            DieselError::DatabaseError(kind, info) => {
                let msg = info.message().to_string();
                match kind {
                    DatabaseErrorKind::UniqueViolation => StoreError::UniqueViolation(msg),
                    DatabaseErrorKind::ForeignKeyViolation => StoreError::ForeignKeyViolation(msg),
                    DatabaseErrorKind::CheckViolation | DatabaseErrorKind::NotNullViolation => {
                        StoreError::InvalidInput(msg)
                    }
                    _ if msg.contains("invalid input syntax") || msg.contains("datatype mismatch") => {
                        StoreError::InvalidInput(msg)
                    }
                    _ => StoreError::Query(msg),
                }
            }
            other => StoreError::Query(other.to_string()),
        }
    }
}

impl From<diesel::r2d2::PoolError> for StoreError {
    fn from(err: diesel::r2d2::PoolError) -> Self {
        StoreError::Pool(err.to_string())
    }
}

impl From<tokio::task::JoinError> for StoreError {
    fn from(err: tokio::task::JoinError) -> Self {
        StoreError::Task(err.to_string())
    }
}

/// Which singular table a parallel save step wrote to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Section {
    /// `users.phone`.
    Identity,
    /// `profiles`.
    Profile,
    /// `trainer_profiles`.
    TrainerProfile,
}

impl std::fmt::Display for Section {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Section::Identity => "identity",
            Section::Profile => "profile",
            Section::TrainerProfile => "trainer profile",
        };
        f.write_str(name)
    }
}

/// Errors that make [`crate::writer::save_profile`] report failure.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SaveError {
    /// One or more of the concurrent singular writes failed. The others may have committed.
    #[error("failed to save {failed} of {total} profile sections: {}", describe(.failures))]
    Sections {
        /// How many sections failed.
        failed: usize,
        /// How many sections were attempted.
        total: usize,
        /// Each failing section and its error.
        failures: Vec<(Section, StoreError)>,
    },

    /// Replacing the specialty set failed.
    #[error("failed to save specialties: {0}")]
    Specialties(StoreError),
}

fn describe(failures: &[(Section, StoreError)]) -> String {
    failures
        .iter()
        .map(|(section, err)| format!("{section} ({})", err.user_message()))
        .collect::<Vec<_>>()
        .join(", ")
}

impl SaveError {
    /// Message suitable for the UI's dismissible error banner.
    pub fn user_message(&self) -> String {
        match self {
            SaveError::Sections { failures, .. } if failures.len() == 1 => {
                failures[0].1.user_message()
            }
            SaveError::Sections { .. } => self.to_string(),
            SaveError::Specialties(err) => err.user_message(),
        }
    }
}

/// Errors from [`crate::synchronizer::ProfileSynchronizer::update_field`].
#[derive(Debug, Error)]
pub enum FieldError {
    /// The path is empty or walks into something that does not exist.
    #[error("unknown field path: {0}")]
    UnknownPath(String),

    /// The value does not fit the field's type.
    #[error("invalid value for {path}: {source}")]
    InvalidValue {
        /// Dot path that was being edited.
        path: String,
        /// Underlying deserialization error.
        source: serde_json::Error,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn relational_errors_map_to_friendly_messages() {
        assert_eq!(
            StoreError::InvalidInput("bad city id".into()).user_message(),
            "problem with location data, check selected cities"
        );
        assert_eq!(
            StoreError::UniqueViolation("x".into()).user_message(),
            "duplicate data, try again"
        );
        assert_eq!(
            StoreError::ForeignKeyViolation("x".into()).user_message(),
            "invalid reference in submitted data"
        );
        assert_eq!(StoreError::Query("disk I/O error".into()).user_message(), "disk I/O error");
    }

    #[test]
    fn diesel_not_found_is_absence() {
        assert!(StoreError::from(DieselError::NotFound).is_not_found());
    }

    #[test]
    fn sections_error_counts_failures() {
        let err = SaveError::Sections {
            failed: 1,
            total: 3,
            failures: vec![(Section::Profile, StoreError::Query("boom".into()))],
        };
        assert_eq!(
            err.to_string(),
            "failed to save 1 of 3 profile sections: profile (boom)"
        );
        assert_eq!(err.user_message(), "boom");
    }
}
