//! Error taxonomy for label operations.
//!
//! # Design
//! - Messages stay constant; operational context lives in structured fields.
//! - `ErrorKind` is the coarse outcome surfaced to transports and metrics.
//! - Backend failures keep their source for diagnostics.

use std::error::Error;
use std::fmt::{self, Display, Formatter};

use thiserror::Error;

use crate::authz::Operation;
use crate::model::{LabelScope, ProjectId};

/// Result alias for label operations.
pub type LabelResult<T> = Result<T, LabelError>;

/// Kind of entity a `NotFound` error refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resource {
    /// A label record.
    Label,
    /// A project owned by the registry.
    Project,
}

impl Resource {
    /// Stable identifier used in logs and problem details.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Label => "label",
            Self::Project => "project",
        }
    }
}

impl Display for Resource {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// Primary error type for label operations.
#[derive(Debug, Error)]
pub enum LabelError {
    /// A required field was missing or malformed.
    #[error("invalid argument")]
    InvalidArgument {
        /// Field that failed validation.
        field: &'static str,
        /// Machine-readable reason for the failure.
        reason: &'static str,
    },
    /// The operation requires an authenticated caller.
    #[error("authentication required")]
    Unauthenticated,
    /// The caller is authenticated but lacks the required role.
    #[error("operation forbidden")]
    Forbidden {
        /// Operation that was denied.
        operation: Operation,
    },
    /// The referenced label or project does not exist.
    #[error("resource not found")]
    NotFound {
        /// Kind of the missing entity.
        resource: Resource,
        /// Identifier that was looked up.
        id: i64,
    },
    /// A label with the same name already exists in the scope.
    #[error("label name already in use")]
    Conflict {
        /// Scope of the colliding label.
        scope: LabelScope,
        /// Project of the colliding label (0 for global labels).
        project_id: ProjectId,
        /// Colliding name.
        name: String,
    },
    /// A collaborator (database, directory) failed.
    #[error("label backend operation failed")]
    Backend {
        /// Operation identifier.
        operation: &'static str,
        /// Underlying failure.
        #[source]
        source: Box<dyn Error + Send + Sync>,
    },
}

/// Coarse outcome classes for label operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Malformed or missing input.
    InvalidArgument,
    /// No credential presented.
    Unauthenticated,
    /// Insufficient privileges.
    Forbidden,
    /// Missing label or project.
    NotFound,
    /// Uniqueness violation.
    Conflict,
    /// Backend failure.
    Internal,
}

impl ErrorKind {
    /// Stable identifier for metrics labels.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::InvalidArgument => "invalid_argument",
            Self::Unauthenticated => "unauthenticated",
            Self::Forbidden => "forbidden",
            Self::NotFound => "not_found",
            Self::Conflict => "conflict",
            Self::Internal => "internal",
        }
    }
}

impl LabelError {
    /// Shorthand for validation failures.
    #[must_use]
    pub const fn invalid(field: &'static str, reason: &'static str) -> Self {
        Self::InvalidArgument { field, reason }
    }

    /// Shorthand for a missing label.
    #[must_use]
    pub const fn label_not_found(id: i64) -> Self {
        Self::NotFound {
            resource: Resource::Label,
            id,
        }
    }

    /// Shorthand for a missing project.
    #[must_use]
    pub const fn project_not_found(id: ProjectId) -> Self {
        Self::NotFound {
            resource: Resource::Project,
            id,
        }
    }

    /// Wrap a collaborator failure.
    pub fn backend<E>(operation: &'static str, source: E) -> Self
    where
        E: Error + Send + Sync + 'static,
    {
        Self::Backend {
            operation,
            source: Box::new(source),
        }
    }

    /// Coarse outcome class for this error.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidArgument { .. } => ErrorKind::InvalidArgument,
            Self::Unauthenticated => ErrorKind::Unauthenticated,
            Self::Forbidden { .. } => ErrorKind::Forbidden,
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::Conflict { .. } => ErrorKind::Conflict,
            Self::Backend { .. } => ErrorKind::Internal,
        }
    }

    /// Human-readable detail assembled from the structured fields.
    #[must_use]
    pub fn detail(&self) -> String {
        match self {
            Self::InvalidArgument { field, reason } => format!("{field}: {reason}"),
            Self::Unauthenticated => "credentials are required for this operation".to_string(),
            Self::Forbidden { operation } => {
                format!("{} is not permitted for this caller", operation.as_str())
            }
            Self::NotFound { resource, id } => format!("{resource} {id} not found"),
            Self::Conflict {
                scope,
                project_id,
                name,
            } => match scope {
                LabelScope::Global => format!("global label '{name}' already exists"),
                LabelScope::Project => {
                    format!("label '{name}' already exists in project {project_id}")
                }
            },
            Self::Backend { operation, .. } => format!("{operation} failed"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn label_error_kinds_and_sources() {
        let invalid = LabelError::invalid("name", "must_not_be_empty");
        assert_eq!(invalid.kind(), ErrorKind::InvalidArgument);
        assert_eq!(invalid.to_string(), "invalid argument");
        assert_eq!(invalid.detail(), "name: must_not_be_empty");
        assert!(invalid.source().is_none());

        let missing = LabelError::project_not_found(42);
        assert_eq!(missing.kind(), ErrorKind::NotFound);
        assert_eq!(missing.detail(), "project 42 not found");

        let forbidden = LabelError::Forbidden {
            operation: Operation::Delete,
        };
        assert_eq!(forbidden.kind().as_str(), "forbidden");
        assert_eq!(forbidden.detail(), "delete is not permitted for this caller");

        let conflict = LabelError::Conflict {
            scope: LabelScope::Project,
            project_id: 7,
            name: "release".to_string(),
        };
        assert_eq!(conflict.kind(), ErrorKind::Conflict);
        assert_eq!(
            conflict.detail(),
            "label 'release' already exists in project 7"
        );

        let backend = LabelError::backend("labels.insert", io::Error::other("down"));
        assert_eq!(backend.kind(), ErrorKind::Internal);
        assert!(backend.source().is_some());
    }
}
