//! # Access Matrix
//!
//! Hierarchical, path-based permission evaluation for role-scoped UI and
//! API guards.
//!
//! ## Overview
//!
//! The access-matrix crate handles:
//! - **Permission Matrix**: Raw role x resource x action rows with validity windows
//! - **Compilation**: Rows for the active role folded into a per-path index
//! - **Evaluation**: Exact match, overrides, path inheritance, and workflow stages
//! - **Snapshots**: Immutable compiled state swapped atomically on reload
//!
//! ## Architecture
//!
//! ```text
//! PermissionMatrixRow[] ──compile──► UserPermission[] ──evaluate──► bool
//!        + Resource[]                  (one per path)
//!        + Action[]
//!        + active role
//! ```
//!
//! ## Path Hierarchy
//!
//! Resource paths are slash-delimited (`/orders/form/amount`). A grant on
//! `/orders` is inherited by every path below it unless:
//! - the requested path has its own entry (exact match always wins)
//! - an override entry on a prefix of the requested path excludes the action
//! - workflow-stage restrictions on the granting entry deny the action
//!
//! ## Usage
//!
//! ```rust
//! use access_matrix::{compile, evaluate, Action, PermissionMatrixRow, Resource, ResourceKind};
//!
//! let resources = vec![
//!     Resource::new(1, "/orders", "Orders", ResourceKind::Page),
//!     Resource::new(2, "/orders/form", "Order form", ResourceKind::Section).with_parent(1),
//! ];
//! let actions = vec![Action::new(1, "READ"), Action::new(2, "UPDATE")];
//! let rows = vec![
//!     PermissionMatrixRow::new(1, 10, 1, 1),
//!     PermissionMatrixRow::new(2, 10, 2, 2).overriding(),
//! ];
//!
//! let permissions = compile(&rows, &resources, &actions, Some(10)).into_permissions();
//!
//! // Inherited from /orders
//! assert!(evaluate(&permissions, "/orders/list", "READ", None));
//! // The override on /orders/form grants UPDATE only
//! assert!(!evaluate(&permissions, "/orders/form", "READ", None));
//! assert!(evaluate(&permissions, "/orders/form", "UPDATE", None));
//! ```
//!
//! ## Workflow Stages
//!
//! Row metadata may narrow the granted actions per workflow stage:
//!
//! ```json
//! { "workflowRestrictions": { "draft": { "allowedActions": ["READ"], "restrictedActions": ["SUBMIT"] } } }
//! ```
//!
//! `restrictedActions` always wins over `allowedActions`, and a stage can
//! never grant an action the entry does not already hold.

pub mod actions;
pub mod compiler;
pub mod config;
pub mod error;
pub mod evaluator;
pub mod matrix;
pub mod metadata;
pub mod permissions;
pub mod resources;
pub mod roles;
pub mod store;

// Re-export main types for convenience
pub use actions::{Action, ActionId};
pub use compiler::{compile, compile_at, Compilation};
pub use config::{AccessConfig, MetadataErrorPolicy};
pub use error::{AccessError, AccessResult};
pub use evaluator::{evaluate, explain, Decision, Denial, Grant};
pub use matrix::{PermissionMatrixRow, RowId};
pub use metadata::{PermissionMetadata, StageRestriction, StageVerdict};
pub use permissions::UserPermission;
pub use resources::{Resource, ResourceId, ResourceKind, ResourceNode, ResourceTree};
pub use roles::{Role, RoleId};
pub use store::{PermissionSnapshot, PermissionStore, Reload};
