//! # Permission Store
//!
//! Owns the compiled permission index of the active role as an immutable
//! [`PermissionSnapshot`]. Readers take an `Arc` to the current snapshot and
//! evaluate against it without further locking. Reloading compiles a fresh
//! snapshot off to the side and swaps it in whole, so no reader ever sees a
//! half-built index.

use chrono::{DateTime, Utc};
use std::sync::{Arc, PoisonError, RwLock};
use tracing::{info, trace, warn};

use crate::actions::Action;
use crate::compiler::{compile_at, Compilation};
use crate::config::{AccessConfig, MetadataErrorPolicy};
use crate::error::{AccessError, AccessResult};
use crate::evaluator::{self, Decision};
use crate::matrix::PermissionMatrixRow;
use crate::permissions::UserPermission;
use crate::resources::Resource;
use crate::roles::{Role, RoleId};

/// Immutable compiled permissions for one role.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PermissionSnapshot {
    role_id: Option<RoleId>,
    permissions: Vec<UserPermission>,
    generation: u64,
    compiled_at: DateTime<Utc>,
}

impl PermissionSnapshot {
    /// Snapshot with no active role and no permissions.
    pub fn empty() -> Self {
        Self::from_permissions(None, Vec::new())
    }

    /// Wrap already compiled permissions.
    pub fn from_permissions(role_id: Option<RoleId>, permissions: Vec<UserPermission>) -> Self {
        Self {
            role_id,
            permissions,
            generation: 0,
            compiled_at: Utc::now(),
        }
    }

    /// Active role, if any.
    pub fn role_id(&self) -> Option<RoleId> {
        self.role_id
    }

    /// Compiled entries.
    pub fn permissions(&self) -> &[UserPermission] {
        &self.permissions
    }

    /// Swap counter of the store that published this snapshot.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// When the snapshot was compiled.
    pub fn compiled_at(&self) -> DateTime<Utc> {
        self.compiled_at
    }

    /// Check if the snapshot grants nothing.
    pub fn is_empty(&self) -> bool {
        self.permissions.is_empty()
    }

    /// See [`evaluator::evaluate`].
    pub fn evaluate(&self, resource_path: &str, action: &str, workflow_stage: Option<&str>) -> bool {
        evaluator::evaluate(&self.permissions, resource_path, action, workflow_stage)
    }

    /// See [`evaluator::explain`].
    pub fn explain(
        &self,
        resource_path: &str,
        action: &str,
        workflow_stage: Option<&str>,
    ) -> Decision<'_> {
        evaluator::explain(&self.permissions, resource_path, action, workflow_stage)
    }

    /// Check if any of `actions` is permitted. False for an empty list.
    pub fn can_any(&self, resource_path: &str, actions: &[&str], workflow_stage: Option<&str>) -> bool {
        actions
            .iter()
            .any(|action| self.evaluate(resource_path, action, workflow_stage))
    }

    /// Check if all of `actions` are permitted. True for an empty list.
    pub fn can_all(&self, resource_path: &str, actions: &[&str], workflow_stage: Option<&str>) -> bool {
        actions
            .iter()
            .all(|action| self.evaluate(resource_path, action, workflow_stage))
    }

    /// The subset of `candidates` permitted on `resource_path`, in input order.
    ///
    /// # Example
    ///
    /// ```
    /// use access_matrix::permissions::UserPermission;
    /// use access_matrix::store::PermissionSnapshot;
    ///
    /// let snapshot = PermissionSnapshot::from_permissions(
    ///     Some(1),
    ///     vec![UserPermission::new("/orders", ["READ", "UPDATE"])],
    /// );
    /// assert_eq!(
    ///     snapshot.permitted_actions("/orders/form", &["READ", "DELETE", "UPDATE"], None),
    ///     vec!["READ", "UPDATE"]
    /// );
    /// ```
    pub fn permitted_actions<'c>(
        &self,
        resource_path: &str,
        candidates: &[&'c str],
        workflow_stage: Option<&str>,
    ) -> Vec<&'c str> {
        candidates
            .iter()
            .copied()
            .filter(|action| self.evaluate(resource_path, action, workflow_stage))
            .collect()
    }
}

impl Default for PermissionSnapshot {
    fn default() -> Self {
        Self::empty()
    }
}

/// Outcome of a successful reload.
#[derive(Debug, Clone)]
pub struct Reload {
    /// The snapshot now being served.
    pub snapshot: Arc<PermissionSnapshot>,
    /// Resource groups left out because of malformed metadata.
    pub dropped: Vec<AccessError>,
}

/// Single owner of the active role's permission snapshot.
///
/// # Example
///
/// ```
/// use access_matrix::actions::Action;
/// use access_matrix::config::AccessConfig;
/// use access_matrix::matrix::PermissionMatrixRow;
/// use access_matrix::resources::{Resource, ResourceKind};
/// use access_matrix::store::PermissionStore;
///
/// let store = PermissionStore::new(AccessConfig::default());
/// assert!(!store.check("/orders", "READ", None));
///
/// let resources = vec![Resource::new(1, "/orders", "Orders", ResourceKind::Page)];
/// let actions = vec![Action::new(1, "READ")];
/// let rows = vec![PermissionMatrixRow::new(1, 7, 1, 1)];
/// store.reload(&rows, &resources, &actions, Some(7)).unwrap();
///
/// assert!(store.check("/orders/form", "READ", None));
/// assert_eq!(store.snapshot().generation(), 1);
/// ```
#[derive(Debug)]
pub struct PermissionStore {
    config: AccessConfig,
    current: RwLock<Arc<PermissionSnapshot>>,
}

impl PermissionStore {
    /// Create a store holding an empty snapshot.
    pub fn new(config: AccessConfig) -> Self {
        Self {
            config,
            current: RwLock::new(Arc::new(PermissionSnapshot::empty())),
        }
    }

    /// Create a store configured from the environment.
    pub fn from_env() -> Self {
        Self::new(AccessConfig::from_env())
    }

    /// Store configuration.
    pub fn config(&self) -> &AccessConfig {
        &self.config
    }

    /// The snapshot currently being served.
    pub fn snapshot(&self) -> Arc<PermissionSnapshot> {
        // The guarded value is only ever replaced whole, so a poisoned lock
        // still holds a consistent snapshot.
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Check access against the current snapshot.
    ///
    /// Without an explicit stage the configured default stage applies.
    pub fn check(&self, resource_path: &str, action: &str, workflow_stage: Option<&str>) -> bool {
        let stage = workflow_stage.or(self.config.default_workflow_stage.as_deref());
        let allowed = self.snapshot().evaluate(resource_path, action, stage);
        trace!(path = resource_path, action, stage, allowed, "Access check");
        allowed
    }

    /// Recompile for `role_id` as of now and swap the result in.
    pub fn reload(
        &self,
        rows: &[PermissionMatrixRow],
        resources: &[Resource],
        actions: &[Action],
        role_id: Option<RoleId>,
    ) -> AccessResult<Reload> {
        self.reload_at(rows, resources, actions, role_id, Utc::now())
    }

    /// Recompile for `role_id` as of `now` and swap the result in.
    ///
    /// Under [`MetadataErrorPolicy::Abort`] a compilation with errors is
    /// rejected and the previous snapshot stays in place.
    pub fn reload_at(
        &self,
        rows: &[PermissionMatrixRow],
        resources: &[Resource],
        actions: &[Action],
        role_id: Option<RoleId>,
        now: DateTime<Utc>,
    ) -> AccessResult<Reload> {
        let Compilation {
            role_id,
            permissions,
            errors,
        } = compile_at(rows, resources, actions, role_id, now);

        if let Some(first) = errors.first() {
            match self.config.metadata_error_policy {
                MetadataErrorPolicy::Abort => {
                    warn!(
                        role_id,
                        errors = errors.len(),
                        "Rejecting permission reload with malformed metadata"
                    );
                    return Err(first.clone());
                }
                MetadataErrorPolicy::Drop => {
                    warn!(
                        role_id,
                        dropped = errors.len(),
                        "Dropping resource groups with malformed metadata"
                    );
                }
            }
        }

        let snapshot = self.publish(PermissionSnapshot {
            role_id,
            permissions,
            generation: 0,
            compiled_at: now,
        });

        Ok(Reload {
            snapshot,
            dropped: errors,
        })
    }

    /// Reload for a role that must exist in `roles`.
    pub fn reload_for_role(
        &self,
        roles: &[Role],
        rows: &[PermissionMatrixRow],
        resources: &[Resource],
        actions: &[Action],
        role_id: RoleId,
    ) -> AccessResult<Reload> {
        if Role::find(roles, role_id).is_none() {
            return Err(AccessError::UnknownRole(role_id));
        }
        self.reload(rows, resources, actions, Some(role_id))
    }

    /// Swap in an empty snapshot (no active role).
    pub fn clear(&self) -> Arc<PermissionSnapshot> {
        self.publish(PermissionSnapshot::empty())
    }

    fn publish(&self, mut snapshot: PermissionSnapshot) -> Arc<PermissionSnapshot> {
        let mut current = self.current.write().unwrap_or_else(PoisonError::into_inner);
        snapshot.generation = current.generation + 1;
        let snapshot = Arc::new(snapshot);
        *current = Arc::clone(&snapshot);

        info!(
            role_id = snapshot.role_id,
            entries = snapshot.permissions.len(),
            generation = snapshot.generation,
            compiled_at = %snapshot.compiled_at(),
            "Published permission snapshot"
        );
        snapshot
    }
}

impl Default for PermissionStore {
    fn default() -> Self {
        Self::new(AccessConfig::default())
    }
}
