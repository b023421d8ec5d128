//! # Access Evaluator
//!
//! The single decision point for access checks. Given the compiled
//! permissions of the active role, a resource path, an action, and an
//! optional workflow stage, it decides allow or deny:
//!
//! 1. **Exact match** on the path. An override entry decides by action-set
//!    membership alone. A regular entry is first subject to workflow rules.
//! 2. **Hierarchical fallback** otherwise: walk ancestor paths from the most
//!    specific up to `/`. The first ancestor granting the action allows,
//!    unless an override entry whose path is a string prefix of the requested
//!    path excludes the action, or workflow rules on the ancestor deny it.
//! 3. **Deny** when nothing grants the action.
//!
//! Evaluation is pure and total: no I/O, no mutation, no errors.

use serde::Serialize;

use crate::metadata::StageVerdict;
use crate::permissions::UserPermission;
use crate::resources::ancestor_paths;

/// Why access was granted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Grant<'a> {
    /// Exact-match override entry contains the action.
    Override {
        /// Path of the override entry.
        path: &'a str,
    },
    /// Exact-match entry contains the action.
    Exact {
        /// Path of the entry.
        path: &'a str,
    },
    /// An ancestor path grants the action.
    Inherited {
        /// Path of the granting ancestor.
        path: &'a str,
    },
}

/// Why access was denied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Denial<'a> {
    /// No entry grants the action.
    NotGranted,
    /// An override entry on a prefix of the requested path excludes the action.
    OverrideBlocked {
        /// Path of the blocking override entry.
        path: &'a str,
    },
    /// Workflow-stage rules on the selected entry deny the action.
    Workflow {
        /// Path of the entry carrying the restriction.
        path: &'a str,
        /// Which list denied the action.
        verdict: StageVerdict,
    },
}

/// Outcome of an access check, borrowing from the compiled permissions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "decision", content = "reason", rename_all = "snake_case")]
pub enum Decision<'a> {
    /// Access granted.
    Allow(Grant<'a>),
    /// Access denied.
    Deny(Denial<'a>),
}

impl Decision<'_> {
    /// Check if access is granted.
    pub fn is_allowed(&self) -> bool {
        matches!(self, Decision::Allow(_))
    }
}

/// Decide whether `action` on `resource_path` is permitted.
///
/// # Example
///
/// ```
/// use access_matrix::evaluator::evaluate;
/// use access_matrix::permissions::UserPermission;
///
/// let perms = vec![
///     UserPermission::new("/orders", ["READ"]),
///     UserPermission::new("/orders/form", Vec::<String>::new()).overriding(),
/// ];
///
/// assert!(evaluate(&perms, "/orders/list", "READ", None));
/// assert!(!evaluate(&perms, "/orders/form/amount", "READ", None));
/// assert!(!evaluate(&[], "/orders", "READ", None));
/// ```
pub fn evaluate(
    permissions: &[UserPermission],
    resource_path: &str,
    action: &str,
    workflow_stage: Option<&str>,
) -> bool {
    explain(permissions, resource_path, action, workflow_stage).is_allowed()
}

/// Decide like [`evaluate`], returning the reason along with the outcome.
pub fn explain<'a>(
    permissions: &'a [UserPermission],
    resource_path: &str,
    action: &str,
    workflow_stage: Option<&str>,
) -> Decision<'a> {
    if let Some(entry) = UserPermission::find(permissions, resource_path) {
        if entry.is_override {
            return if entry.allows(action) {
                Decision::Allow(Grant::Override {
                    path: &entry.resource_path,
                })
            } else {
                Decision::Deny(Denial::NotGranted)
            };
        }

        if let Some(denial) = workflow_denial(entry, action, workflow_stage) {
            return Decision::Deny(denial);
        }

        return if entry.allows(action) {
            Decision::Allow(Grant::Exact {
                path: &entry.resource_path,
            })
        } else {
            Decision::Deny(Denial::NotGranted)
        };
    }

    for ancestor in ancestor_paths(resource_path) {
        let Some(entry) = UserPermission::find(permissions, &ancestor) else {
            continue;
        };
        if !entry.allows(action) {
            continue;
        }

        // Prefix of the requested path, not of the granting ancestor.
        let blocker = permissions.iter().find(|perm| {
            perm.is_override
                && !perm.allows(action)
                && resource_path.starts_with(perm.resource_path.as_str())
        });
        if let Some(blocker) = blocker {
            return Decision::Deny(Denial::OverrideBlocked {
                path: &blocker.resource_path,
            });
        }

        if let Some(denial) = workflow_denial(entry, action, workflow_stage) {
            return Decision::Deny(denial);
        }

        return Decision::Allow(Grant::Inherited {
            path: &entry.resource_path,
        });
    }

    Decision::Deny(Denial::NotGranted)
}

fn workflow_denial<'a>(
    entry: &'a UserPermission,
    action: &str,
    workflow_stage: Option<&str>,
) -> Option<Denial<'a>> {
    let stage = workflow_stage?;
    let verdict = entry.metadata.as_ref()?.verdict(stage, action);
    verdict.denies().then_some(Denial::Workflow {
        path: &entry.resource_path,
        verdict,
    })
}
