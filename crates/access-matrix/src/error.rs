//! Error types for permission compilation
//!
//! Evaluation never fails. Only compilation (malformed row metadata),
//! role selection, and configuration can produce an [`AccessError`].

use thiserror::Error;

use crate::matrix::RowId;
use crate::resources::ResourceId;
use crate::roles::RoleId;

/// Access-control error types.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AccessError {
    /// Metadata on a permission row could not be parsed.
    ///
    /// Restrictions that fail to parse are never treated as absent, since that
    /// would turn a restricted grant into an unrestricted one.
    #[error("Malformed metadata on row {row_id} for resource {resource_id}: {message}")]
    MalformedMetadata {
        /// Resource whose compiled entry was affected.
        resource_id: ResourceId,
        /// Row carrying the bad metadata.
        row_id: RowId,
        /// Parser message.
        message: String,
    },

    /// The requested role does not exist in the role list.
    #[error("Unknown role: {0}")]
    UnknownRole(RoleId),

    /// Invalid configuration value.
    #[error("Invalid configuration value for {key}: {message}")]
    Config {
        /// Configuration key.
        key: String,
        /// Error message.
        message: String,
    },
}

/// Result type for access-control operations.
pub type AccessResult<T> = Result<T, AccessError>;

impl AccessError {
    /// Get error code for API responses.
    pub fn error_code(&self) -> &'static str {
        match self {
            AccessError::MalformedMetadata { .. } => "MALFORMED_METADATA",
            AccessError::UnknownRole(_) => "UNKNOWN_ROLE",
            AccessError::Config { .. } => "CONFIG_ERROR",
        }
    }

    /// Resource id affected by this error, if it is scoped to one.
    pub fn resource_id(&self) -> Option<ResourceId> {
        match self {
            AccessError::MalformedMetadata { resource_id, .. } => Some(*resource_id),
            _ => None,
        }
    }
}
