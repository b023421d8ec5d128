//! # Actions
//!
//! Actions are the operations a role may perform on a resource. The set of
//! action names is open-ended: the names below are the canonical ones, but a
//! deployment may add its own. To the evaluator an action is an opaque string
//! compared by exact equality.

use serde::{Deserialize, Serialize};

/// Numeric action identifier.
pub type ActionId = i64;

/// View a resource.
pub const READ: &str = "READ";
/// Create a new resource instance.
pub const CREATE: &str = "CREATE";
/// Modify an existing resource.
pub const UPDATE: &str = "UPDATE";
/// Remove a resource.
pub const DELETE: &str = "DELETE";
/// Trigger a process.
pub const EXECUTE: &str = "EXECUTE";
/// Approve a pending change.
pub const APPROVE: &str = "APPROVE";
/// Submit for review.
pub const SUBMIT: &str = "SUBMIT";

/// An action lookup record, as referenced by permission matrix rows.
///
/// # Example
///
/// ```
/// use access_matrix::actions::{self, Action};
///
/// let action = Action::new(1, " read ");
/// assert_eq!(action.canonical_name(), actions::READ);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "camelCase")]
pub struct Action {
    /// Action identifier.
    pub id: ActionId,
    /// Uppercase action name.
    pub name: String,
}

impl Action {
    /// Create an action record.
    pub fn new(id: ActionId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
        }
    }

    /// The record's name in canonical form. See [`normalize`].
    pub fn canonical_name(&self) -> String {
        normalize(&self.name)
    }
}

/// Bring an action name into canonical form: trimmed and uppercase.
///
/// Lookup tables are normalised at compile time; the evaluator itself still
/// compares names exactly.
///
/// ```
/// use access_matrix::actions::normalize;
///
/// assert_eq!(normalize("  submit\n"), "SUBMIT");
/// assert_eq!(normalize("APPROVE"), "APPROVE");
/// ```
pub fn normalize(name: &str) -> String {
    name.trim().to_uppercase()
}
