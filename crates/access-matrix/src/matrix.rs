//! # Permission Matrix
//!
//! Raw permission rows as stored and transmitted: one row grants one action
//! on one resource to one role, optionally within a validity window.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::actions::ActionId;
use crate::resources::ResourceId;
use crate::roles::RoleId;

/// Numeric permission row identifier.
pub type RowId = i64;

/// A single row of the permission matrix.
///
/// `metadata` is kept in its serialized text form here; it is parsed into a
/// typed [`PermissionMetadata`](crate::metadata::PermissionMetadata) during
/// compilation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PermissionMatrixRow {
    /// Row identifier.
    pub id: RowId,
    /// Role the grant belongs to.
    pub role_id: RoleId,
    /// Resource the grant applies to.
    pub resource_id: ResourceId,
    /// Granted action.
    pub action_id: ActionId,
    /// Inactive rows are ignored entirely.
    pub is_active: bool,
    /// Start of the validity window (inclusive).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub valid_from: Option<DateTime<Utc>>,
    /// End of the validity window (inclusive).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub valid_to: Option<DateTime<Utc>>,
    /// Override grants are authoritative on an exact path match.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_override: Option<bool>,
    /// Serialized metadata (workflow restrictions).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<String>,
}

impl PermissionMatrixRow {
    /// Create an active, unbounded, non-override row.
    pub fn new(id: RowId, role_id: RoleId, resource_id: ResourceId, action_id: ActionId) -> Self {
        Self {
            id,
            role_id,
            resource_id,
            action_id,
            is_active: true,
            valid_from: None,
            valid_to: None,
            is_override: None,
            metadata: None,
        }
    }

    /// Mark the row inactive.
    pub fn inactive(mut self) -> Self {
        self.is_active = false;
        self
    }

    /// Mark the row as an override.
    pub fn overriding(mut self) -> Self {
        self.is_override = Some(true);
        self
    }

    /// Set the validity window.
    pub fn valid_between(
        mut self,
        from: Option<DateTime<Utc>>,
        to: Option<DateTime<Utc>>,
    ) -> Self {
        self.valid_from = from;
        self.valid_to = to;
        self
    }

    /// Attach serialized metadata.
    pub fn with_metadata(mut self, metadata: impl Into<String>) -> Self {
        self.metadata = Some(metadata.into());
        self
    }

    /// Check if `now` falls within the validity window.
    ///
    /// Both bounds are inclusive and an absent bound is open.
    ///
    /// # Example
    ///
    /// ```
    /// use access_matrix::matrix::PermissionMatrixRow;
    /// use chrono::{Duration, Utc};
    ///
    /// let now = Utc::now();
    /// let expired = PermissionMatrixRow::new(1, 1, 1, 1)
    ///     .valid_between(None, Some(now - Duration::days(1)));
    /// assert!(!expired.is_valid_at(now));
    /// assert!(PermissionMatrixRow::new(2, 1, 1, 1).is_valid_at(now));
    /// ```
    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        self.valid_from.map_or(true, |from| from <= now)
            && self.valid_to.map_or(true, |to| to >= now)
    }
}
