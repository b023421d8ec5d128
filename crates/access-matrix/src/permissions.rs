//! # Compiled Permissions
//!
//! A [`UserPermission`] is the compiled, per-resource-path view of what the
//! active role may do. It is produced by the
//! [compiler](crate::compiler::compile) and consumed by the
//! [evaluator](crate::evaluator::evaluate).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::metadata::PermissionMetadata;
use crate::resources::{segments, ResourceId};

/// Permissions the active role holds on one resource path.
///
/// `actions` is the union over every active, currently valid row for the
/// resource. `is_override`, the validity window, and `metadata` come from the
/// first such row only; they are not merged across rows.
///
/// # Example
///
/// ```
/// use access_matrix::permissions::UserPermission;
///
/// let perm = UserPermission::new("/orders", ["READ", "UPDATE"]);
/// assert!(perm.allows("READ"));
/// assert!(!perm.allows("read"));
/// assert_eq!(perm.depth, 1);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct UserPermission {
    /// Resource path this entry applies to.
    pub resource_path: String,
    /// Resource identifier.
    pub resource_id: ResourceId,
    /// Granted action names, before workflow filtering.
    pub actions: BTreeSet<String>,
    /// Authoritative on an exact path match; bypasses workflow rules.
    pub is_override: bool,
    /// Hierarchy depth of the resource.
    pub depth: u32,
    /// Validity window start of the first row.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub valid_from: Option<DateTime<Utc>>,
    /// Validity window end of the first row.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub valid_to: Option<DateTime<Utc>>,
    /// Parsed metadata of the first row.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<PermissionMetadata>,
}

impl UserPermission {
    /// Create a non-override entry for `path` granting `actions`.
    ///
    /// The resource id is left at zero and the depth derived from the path.
    pub fn new<I, S>(path: impl Into<String>, actions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let resource_path = path.into();
        let depth = segments(&resource_path).len() as u32;
        Self {
            resource_path,
            resource_id: 0,
            actions: actions.into_iter().map(Into::into).collect(),
            is_override: false,
            depth,
            valid_from: None,
            valid_to: None,
            metadata: None,
        }
    }

    /// Mark the entry as an override.
    pub fn overriding(mut self) -> Self {
        self.is_override = true;
        self
    }

    /// Attach parsed metadata.
    pub fn with_metadata(mut self, metadata: PermissionMetadata) -> Self {
        self.metadata = Some(metadata);
        self
    }

    /// Check if `action` is in the granted action set.
    pub fn allows(&self, action: &str) -> bool {
        self.actions.contains(action)
    }

    /// Find the entry whose path equals `path` exactly.
    pub fn find<'a>(permissions: &'a [UserPermission], path: &str) -> Option<&'a UserPermission> {
        permissions.iter().find(|perm| perm.resource_path == path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find_exact_only() {
        let perms = vec![
            UserPermission::new("/orders", ["READ"]),
            UserPermission::new("/orders/form", ["UPDATE"]),
        ];
        assert_eq!(
            UserPermission::find(&perms, "/orders/form").map(|p| p.allows("UPDATE")),
            Some(true)
        );
        assert!(UserPermission::find(&perms, "/orders/").is_none());
        assert!(UserPermission::find(&perms, "/order").is_none());
    }

    #[test]
    fn test_serialize_camel_case() {
        let perm = UserPermission::new("/a", ["READ"]).overriding();
        let json = serde_json::to_value(&perm).unwrap();
        assert_eq!(json["resourcePath"], "/a");
        assert_eq!(json["isOverride"], true);
        assert!(json.get("metadata").is_none());
    }
}
