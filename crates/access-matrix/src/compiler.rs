//! # Permission Compiler
//!
//! Turns raw permission matrix rows into the per-resource-path index for
//! the active role.
//!
//! ```text
//! rows ──filter(role, active)──► group by resource ──► resolve resource
//!      ──► keep currently valid rows ──► union action names
//!      ──► first valid row: override flag, window, metadata
//! ```
//!
//! Dangling resource or action ids are inert and skipped silently. Malformed
//! metadata is reported per group in [`Compilation::errors`]; the caller
//! decides whether to drop the group or abort.

use chrono::{DateTime, Utc};
use std::collections::{HashMap, HashSet};
use tracing::{debug, warn};

use crate::actions::{Action, ActionId};
use crate::error::{AccessError, AccessResult};
use crate::matrix::PermissionMatrixRow;
use crate::metadata::PermissionMetadata;
use crate::permissions::UserPermission;
use crate::resources::{Resource, ResourceId};
use crate::roles::RoleId;

/// Result of compiling the permission matrix for one role.
///
/// Always a fresh value: compiling never touches a previous result.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Compilation {
    /// Role the permissions were compiled for.
    pub role_id: Option<RoleId>,
    /// Compiled entries, one per reachable resource path. Order is unspecified.
    pub permissions: Vec<UserPermission>,
    /// Groups left out because their metadata could not be parsed.
    pub errors: Vec<AccessError>,
}

impl Compilation {
    /// Check if every group compiled without error.
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }

    /// Keep the compiled entries and discard the per-group errors.
    pub fn into_permissions(self) -> Vec<UserPermission> {
        self.permissions
    }

    /// Fail with the first recorded error, if any.
    pub fn into_strict(self) -> AccessResult<Vec<UserPermission>> {
        match self.errors.into_iter().next() {
            Some(err) => Err(err),
            None => Ok(self.permissions),
        }
    }
}

/// Compile the permission matrix for `active_role_id` as of now.
///
/// See [`compile_at`].
pub fn compile(
    rows: &[PermissionMatrixRow],
    resources: &[Resource],
    actions: &[Action],
    active_role_id: Option<RoleId>,
) -> Compilation {
    compile_at(rows, resources, actions, active_role_id, Utc::now())
}

/// Compile the permission matrix for `active_role_id` as of `now`.
///
/// No active role yields an empty compilation.
///
/// # Example
///
/// ```
/// use access_matrix::actions::Action;
/// use access_matrix::compiler::compile;
/// use access_matrix::matrix::PermissionMatrixRow;
/// use access_matrix::resources::{Resource, ResourceKind};
///
/// let resources = vec![Resource::new(1, "/orders", "Orders", ResourceKind::Page)];
/// let actions = vec![Action::new(1, "READ"), Action::new(2, "UPDATE")];
/// let rows = vec![
///     PermissionMatrixRow::new(1, 7, 1, 1),
///     PermissionMatrixRow::new(2, 7, 1, 2).inactive(),
///     PermissionMatrixRow::new(3, 8, 1, 2),
/// ];
///
/// let compiled = compile(&rows, &resources, &actions, Some(7)).into_strict().unwrap();
/// assert_eq!(compiled.len(), 1);
/// assert!(compiled[0].allows("READ"));
/// assert!(!compiled[0].allows("UPDATE"));
///
/// assert!(compile(&rows, &resources, &actions, None).permissions.is_empty());
/// ```
pub fn compile_at(
    rows: &[PermissionMatrixRow],
    resources: &[Resource],
    actions: &[Action],
    active_role_id: Option<RoleId>,
    now: DateTime<Utc>,
) -> Compilation {
    let Some(role_id) = active_role_id else {
        debug!("No active role, compiling empty permission set");
        return Compilation::default();
    };

    let mut resource_by_id: HashMap<ResourceId, &Resource> = HashMap::new();
    let mut seen_paths: HashSet<&str> = HashSet::new();
    for resource in resources {
        if !seen_paths.insert(resource.path.as_str()) {
            warn!(path = %resource.path, resource_id = resource.id, "Duplicate resource path");
        }
        resource_by_id.entry(resource.id).or_insert(resource);
    }

    let action_by_id: HashMap<ActionId, String> = actions
        .iter()
        .map(|action| (action.id, action.canonical_name()))
        .collect();

    // Groups keep first-appearance order so "first row" means list order.
    let mut groups: Vec<(ResourceId, Vec<&PermissionMatrixRow>)> = Vec::new();
    let mut group_index: HashMap<ResourceId, usize> = HashMap::new();
    let mut considered = 0usize;
    for row in rows.iter().filter(|r| r.role_id == role_id && r.is_active) {
        considered += 1;
        let idx = *group_index.entry(row.resource_id).or_insert_with(|| {
            groups.push((row.resource_id, Vec::new()));
            groups.len() - 1
        });
        groups[idx].1.push(row);
    }

    let mut compilation = Compilation {
        role_id: Some(role_id),
        ..Compilation::default()
    };

    for (resource_id, group) in groups {
        let Some(resource) = resource_by_id.get(&resource_id) else {
            debug!(resource_id, "Skipping rows for unknown resource");
            continue;
        };

        let valid: Vec<&PermissionMatrixRow> =
            group.into_iter().filter(|row| row.is_valid_at(now)).collect();
        let Some(first) = valid.first() else {
            continue;
        };

        let metadata = match first.metadata.as_deref().map(PermissionMetadata::parse).transpose() {
            Ok(parsed) => parsed.flatten(),
            Err(e) => {
                warn!(
                    resource_id,
                    row_id = first.id,
                    error = %e,
                    "Malformed permission metadata"
                );
                compilation.errors.push(AccessError::MalformedMetadata {
                    resource_id,
                    row_id: first.id,
                    message: e.to_string(),
                });
                continue;
            }
        };

        let granted = valid
            .iter()
            .filter_map(|row| action_by_id.get(&row.action_id))
            .cloned()
            .collect();

        compilation.permissions.push(UserPermission {
            resource_path: resource.path.clone(),
            resource_id,
            actions: granted,
            is_override: first.is_override.unwrap_or(false),
            depth: resource.depth,
            valid_from: first.valid_from,
            valid_to: first.valid_to,
            metadata,
        });
    }

    debug!(
        role_id,
        rows_considered = considered,
        entries = compilation.permissions.len(),
        errors = compilation.errors.len(),
        "Compiled permission matrix"
    );

    compilation
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resources::ResourceKind;
    use chrono::Duration;

    fn resources() -> Vec<Resource> {
        vec![
            Resource::new(1, "/orders", "Orders", ResourceKind::Page),
            Resource::new(2, "/orders/form", "Order form", ResourceKind::Section).with_parent(1),
        ]
    }

    fn actions() -> Vec<Action> {
        vec![
            Action::new(1, "READ"),
            Action::new(2, "UPDATE"),
            Action::new(3, "SUBMIT"),
        ]
    }

    #[test]
    fn test_groups_rows_by_resource() {
        let rows = vec![
            PermissionMatrixRow::new(1, 1, 1, 1),
            PermissionMatrixRow::new(2, 1, 2, 1),
            PermissionMatrixRow::new(3, 1, 1, 2),
        ];
        let compiled = compile(&rows, &resources(), &actions(), Some(1));
        assert!(compiled.is_clean());
        assert_eq!(compiled.permissions.len(), 2);

        let orders = UserPermission::find(&compiled.permissions, "/orders").unwrap();
        assert_eq!(orders.actions.len(), 2);
        assert!(orders.allows("READ") && orders.allows("UPDATE"));
        assert_eq!(orders.resource_id, 1);
    }

    #[test]
    fn test_dangling_ids_are_inert() {
        let rows = vec![
            PermissionMatrixRow::new(1, 1, 99, 1),
            PermissionMatrixRow::new(2, 1, 1, 99),
            PermissionMatrixRow::new(3, 1, 1, 1),
        ];
        let compiled = compile(&rows, &resources(), &actions(), Some(1));
        assert!(compiled.is_clean());
        assert_eq!(compiled.permissions.len(), 1);
        assert_eq!(compiled.permissions[0].actions.len(), 1);
    }

    #[test]
    fn test_unresolved_actions_still_emit_entry() {
        let rows = vec![PermissionMatrixRow::new(1, 1, 2, 42).overriding()];
        let compiled = compile(&rows, &resources(), &actions(), Some(1));
        assert_eq!(compiled.permissions.len(), 1);
        assert!(compiled.permissions[0].actions.is_empty());
        assert!(compiled.permissions[0].is_override);
    }

    #[test]
    fn test_all_rows_expired_emits_nothing() {
        let now = Utc::now();
        let rows = vec![
            PermissionMatrixRow::new(1, 1, 1, 1).valid_between(None, Some(now - Duration::days(1))),
            PermissionMatrixRow::new(2, 1, 1, 2)
                .valid_between(Some(now + Duration::days(1)), None),
        ];
        let compiled = compile_at(&rows, &resources(), &actions(), Some(1), now);
        assert!(compiled.permissions.is_empty());
    }

    #[test]
    fn test_malformed_metadata_drops_only_its_group() {
        let rows = vec![
            PermissionMatrixRow::new(1, 1, 1, 1).with_metadata("{oops"),
            PermissionMatrixRow::new(2, 1, 2, 1),
        ];
        let compiled = compile(&rows, &resources(), &actions(), Some(1));
        assert_eq!(compiled.permissions.len(), 1);
        assert_eq!(compiled.permissions[0].resource_path, "/orders/form");
        assert_eq!(compiled.errors.len(), 1);
        assert_eq!(compiled.errors[0].resource_id(), Some(1));

        let strict = compiled.into_strict();
        assert!(matches!(
            strict,
            Err(AccessError::MalformedMetadata { row_id: 1, .. })
        ));
    }

    #[test]
    fn test_metadata_only_read_from_first_valid_row() {
        let now = Utc::now();
        let rows = vec![
            PermissionMatrixRow::new(1, 1, 1, 1)
                .valid_between(None, Some(now - Duration::days(1)))
                .with_metadata("{broken"),
            PermissionMatrixRow::new(2, 1, 1, 2),
            PermissionMatrixRow::new(3, 1, 1, 3).with_metadata("{also broken"),
        ];
        let compiled = compile_at(&rows, &resources(), &actions(), Some(1), now);
        assert!(compiled.is_clean());
        let entry = &compiled.permissions[0];
        assert!(entry.metadata.is_none());
        assert!(entry.allows("UPDATE") && entry.allows("SUBMIT"));
        assert!(!entry.allows("READ"));
    }

    #[test]
    fn test_action_names_are_normalized() {
        let actions = vec![Action::new(1, " read"), Action::new(2, "Update ")];
        let rows = vec![
            PermissionMatrixRow::new(1, 1, 1, 1),
            PermissionMatrixRow::new(2, 1, 1, 2),
        ];
        let compiled = compile(&rows, &resources(), &actions, Some(1));
        let granted: Vec<&str> = compiled.permissions[0]
            .actions
            .iter()
            .map(String::as_str)
            .collect();
        assert_eq!(granted, vec!["READ", "UPDATE"]);
    }

    #[test]
    fn test_duplicate_resource_ids_keep_first() {
        let mut resources = resources();
        resources.push(Resource::new(1, "/shadow", "Shadow", ResourceKind::Page));
        let rows = vec![PermissionMatrixRow::new(1, 1, 1, 1)];
        let compiled = compile(&rows, &resources, &actions(), Some(1));
        assert_eq!(compiled.permissions[0].resource_path, "/orders");
    }
}
