//! Error types for cigraph operations.
//!
//! Errors fall into the categories callers render differently:
//!
//! - **Not found**: a referenced item or relationship does not exist
//! - **Validation**: self-loops and unknown relationship types, rejected
//!   before any store write
//! - **Conflict**: a second active edge for the same `(source, target, type)`
//! - **Store**: any backend failure; traversals abort and return nothing
//!
//! [`Error::code`] maps each error to a stable string code for programmatic
//! consumers.

use crate::domain::{CmdbId, EdgeId, ItemId, RelationshipType};
use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// The error type for cigraph operations.
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration item not found (by external or internal ID).
    #[error("Configuration item not found: {0}")]
    ItemNotFound(String),

    /// Relationship not found or no longer active.
    #[error("Relationship not found: {0}")]
    RelationshipNotFound(EdgeId),

    /// Source and target of a relationship are the same item.
    #[error("Cannot relate configuration item {0} to itself")]
    SelfLoop(CmdbId),

    /// Relationship type is not in the registry.
    #[error(
        "Invalid relationship type '{0}'. Valid types: depends_on, hosts, connects_to, part_of, uses, provides, backs_up, monitors"
    )]
    InvalidRelationshipType(String),

    /// An identical active relationship already exists.
    #[error("Relationship already exists: {from} {relationship_type} {to}")]
    DuplicateRelationship {
        /// Source item
        from: ItemId,
        /// Target item
        to: ItemId,
        /// Relationship type
        relationship_type: RelationshipType,
    },

    /// Storage backend error.
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// Configuration error.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// IO error occurred.
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// JSON error occurred.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Stable error code for programmatic consumers.
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Error::ItemNotFound(_) | Error::RelationshipNotFound(_) => "not_found",
            Error::SelfLoop(_) => "self_loop",
            Error::InvalidRelationshipType(_) => "invalid_type",
            Error::DuplicateRelationship { .. } => "duplicate",
            Error::Storage(_) | Error::Io(_) | Error::Json(_) => "store_error",
            Error::Config(_) => "config_error",
        }
    }

    /// Returns `true` for validation failures rejected before any write.
    #[must_use]
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Error::SelfLoop(_) | Error::InvalidRelationshipType(_)
        )
    }
}

/// Errors raised by storage backends.
#[derive(Debug, Error)]
pub enum StorageError {
    /// The backing data has an invalid format.
    #[error("Invalid data format: {0}")]
    InvalidFormat(String),

    /// A record could not be serialized.
    #[error("Serialization failed: {0}")]
    Serialization(#[source] serde_json::Error),

    /// The backend could not answer the query.
    #[error("Backend unavailable: {0}")]
    Unavailable(String),

    /// In-memory indexes disagree with each other.
    #[error("Inconsistent store state: {0}")]
    Inconsistent(String),
}

/// Errors raised while locating or loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// No `.cigraph/` directory was found.
    #[error("Not a cigraph workspace (or any parent directory). Run 'cigraph init' first.")]
    NotInitialized,

    /// `.cigraph/` already exists.
    #[error("cigraph is already initialized. Found existing '{}'", .0.display())]
    AlreadyInitialized(PathBuf),

    /// The configuration file could not be parsed or written.
    #[error("Invalid configuration: {0}")]
    Invalid(String),

    /// A configuration value is not supported.
    #[error("Unsupported {field} '{value}'. Valid values: {valid_values}")]
    UnsupportedValue {
        /// Configuration field
        field: &'static str,
        /// Value found in the file
        value: String,
        /// Accepted values
        valid_values: &'static str,
    },
}

/// A specialized Result type for cigraph operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(Error::ItemNotFound("CI-1".into()), "not_found")]
    #[case(Error::RelationshipNotFound(EdgeId(4)), "not_found")]
    #[case(Error::SelfLoop(CmdbId::new("CI-1")), "self_loop")]
    #[case(Error::InvalidRelationshipType("hosted_by".into()), "invalid_type")]
    #[case(
        Error::DuplicateRelationship {
            from: ItemId(1),
            to: ItemId(2),
            relationship_type: RelationshipType::Uses,
        },
        "duplicate"
    )]
    #[case(Error::Storage(StorageError::Unavailable("down".into())), "store_error")]
    #[case(Error::Config(ConfigError::NotInitialized), "config_error")]
    fn test_error_codes(#[case] error: Error, #[case] code: &str) {
        assert_eq!(error.code(), code);
    }

    #[test]
    fn test_duplicate_message_is_specific() {
        let err = Error::DuplicateRelationship {
            from: ItemId(1),
            to: ItemId(2),
            relationship_type: RelationshipType::DependsOn,
        };
        assert_eq!(
            err.to_string(),
            "Relationship already exists: #1 depends_on #2"
        );
        assert!(!err.is_validation());
    }

    #[test]
    fn test_validation_errors() {
        assert!(Error::SelfLoop(CmdbId::new("a")).is_validation());
        assert!(Error::InvalidRelationshipType("x".into()).is_validation());
        assert!(!Error::ItemNotFound("a".into()).is_validation());
    }
}
