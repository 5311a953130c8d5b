//! Error types for codeplug configuration handling.
//!
//! All failures in this crate are local, recoverable conditions reported to
//! the immediate caller; nothing here is fatal to the process and there is no
//! global error channel.
//!
//! ## Error Categories
//!
//! - **Validation Errors**: a setter received an out-of-domain value; the
//!   field is left unchanged
//! - **Type-Mismatch Errors**: a reference target or `copy_from` source has
//!   the wrong concrete variant
//! - **Resolution Errors**: a serialized reference id has no matching entity
//!   during populate
//! - **Parse Errors**: a node tree is missing a required field or carries a
//!   malformed value
//!
//! Lookups that find nothing return `Option::None` instead of an error;
//! absence is a normal outcome.
//!
//! ## Helper Constructors
//!
//! ```rust
//! use codeplug::ConfigError;
//!
//! let err = ConfigError::validation("rxFrequency", "frequency must be positive");
//! assert!(err.to_string().contains("rxFrequency"));
//! ```

use thiserror::Error;

/// Result type alias for configuration operations.
pub type Result<T, E = ConfigError> = std::result::Result<T, E>;

/// Main error type for codeplug configuration operations.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum ConfigError {
    #[error("Invalid value for field '{field}': {reason}")]
    Validation { field: &'static str, reason: String },

    #[error("Type mismatch: expected {expected}, found {found}")]
    TypeMismatch { expected: &'static str, found: &'static str },

    #[error("Cannot resolve reference '{id}' for field '{field}'")]
    Resolution { field: &'static str, id: String },

    #[error("Parse error in {context}: {details}")]
    Parse { context: String, details: String },

    #[error("Duplicate identifier '{id}'")]
    DuplicateId { id: String },
}

impl ConfigError {
    /// Helper constructor for setter validation failures.
    pub fn validation(field: &'static str, reason: impl Into<String>) -> Self {
        ConfigError::Validation { field, reason: reason.into() }
    }

    /// Helper constructor for variant type mismatches.
    pub fn type_mismatch(expected: &'static str, found: &'static str) -> Self {
        ConfigError::TypeMismatch { expected, found }
    }

    /// Helper constructor for unresolved reference identifiers.
    pub fn unresolved(field: &'static str, id: impl Into<String>) -> Self {
        ConfigError::Resolution { field, id: id.into() }
    }

    /// Helper constructor for node-tree parse failures.
    pub fn parse(context: impl Into<String>, details: impl Into<String>) -> Self {
        ConfigError::Parse { context: context.into(), details: details.into() }
    }

    /// Returns whether this error stems from user-supplied values rather than
    /// a malformed document. Presentation layers use this to decide between
    /// field-level feedback and a file-level diagnostic.
    pub fn is_field_error(&self) -> bool {
        matches!(self, ConfigError::Validation { .. } | ConfigError::TypeMismatch { .. })
    }

    /// Returns the field name associated with this error, if any.
    pub fn field(&self) -> Option<&'static str> {
        match self {
            ConfigError::Validation { field, .. } => Some(field),
            ConfigError::Resolution { field, .. } => Some(field),
            _ => None,
        }
    }
}

impl From<serde_yaml_ng::Error> for ConfigError {
    fn from(err: serde_yaml_ng::Error) -> Self {
        ConfigError::Parse { context: "YAML document".to_string(), details: err.to_string() }
    }
}
