//! Error types for the data access layer.

use std::error::Error;
use std::fmt::{self, Display, Formatter};

use argon2::password_hash::Error as PasswordHashError;
use berth_labels::LabelError;

/// Result alias for data layer operations.
pub type Result<T> = std::result::Result<T, DataError>;

/// Errors raised by the data access layer.
#[derive(Debug)]
pub enum DataError {
    /// Migration execution failed.
    MigrationFailed {
        /// Underlying migration error.
        source: sqlx::migrate::MigrateError,
    },
    /// A database operation failed.
    QueryFailed {
        /// Operation identifier.
        operation: &'static str,
        /// Underlying SQL error.
        source: sqlx::Error,
    },
    /// Hashing or verifying secret material failed.
    SecretHash {
        /// Operation identifier.
        operation: &'static str,
        /// Hashing error detail.
        detail: PasswordHashError,
    },
    /// A stored value did not match the expected vocabulary.
    InvalidStoredValue {
        /// Column holding the value.
        field: &'static str,
        /// Offending value.
        value: String,
    },
}

impl DataError {
    /// Wrap a `sqlx` failure with its operation identifier.
    #[must_use]
    pub const fn query(operation: &'static str, source: sqlx::Error) -> Self {
        Self::QueryFailed { operation, source }
    }

    /// Operation identifier used when surfacing the failure upstream.
    #[must_use]
    pub const fn operation(&self) -> &'static str {
        match self {
            Self::MigrationFailed { .. } => "migrations.apply",
            Self::QueryFailed { operation, .. } | Self::SecretHash { operation, .. } => operation,
            Self::InvalidStoredValue { .. } => "decode.stored_value",
        }
    }
}

impl Display for DataError {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::MigrationFailed { .. } => formatter.write_str("migration failed"),
            Self::QueryFailed { .. } => formatter.write_str("database operation failed"),
            Self::SecretHash { .. } => formatter.write_str("secret hashing failed"),
            Self::InvalidStoredValue { .. } => formatter.write_str("stored value was invalid"),
        }
    }
}

impl Error for DataError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::MigrationFailed { source } => Some(source),
            Self::QueryFailed { source, .. } => Some(source),
            Self::SecretHash { .. } | Self::InvalidStoredValue { .. } => None,
        }
    }
}

impl From<DataError> for LabelError {
    fn from(err: DataError) -> Self {
        Self::backend(err.operation(), err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use berth_labels::ErrorKind;

    #[test]
    fn data_error_display_and_source() {
        let migration = DataError::MigrationFailed {
            source: sqlx::migrate::MigrateError::VersionMissing(1),
        };
        assert_eq!(migration.to_string(), "migration failed");
        assert!(migration.source().is_some());

        let query = DataError::query("labels.insert", sqlx::Error::RowNotFound);
        assert_eq!(query.to_string(), "database operation failed");
        assert_eq!(query.operation(), "labels.insert");
        assert!(query.source().is_some());

        let hash = DataError::SecretHash {
            operation: "api_keys.hash",
            detail: PasswordHashError::Password,
        };
        assert_eq!(hash.to_string(), "secret hashing failed");
        assert!(hash.source().is_none());

        let stored = DataError::InvalidStoredValue {
            field: "role",
            value: "owner".to_string(),
        };
        assert_eq!(stored.to_string(), "stored value was invalid");
    }

    #[test]
    fn data_errors_surface_as_internal_label_errors() {
        let err: LabelError = DataError::query("labels.get", sqlx::Error::PoolTimedOut).into();
        assert_eq!(err.kind(), ErrorKind::Internal);
        assert_eq!(err.detail(), "labels.get failed");
    }
}
