//! # Permission Metadata
//!
//! Typed form of the metadata carried by permission rows. The only structure
//! the evaluator understands is a map of workflow stages to allow/deny lists:
//!
//! ```text
//! { "workflowRestrictions": { "<stage>": { "allowedActions": [..], "restrictedActions": [..] } } }
//! ```
//!
//! Other top-level keys are preserved in [`PermissionMetadata::extra`] but
//! never consulted. A workflow stage can only narrow an action set, never widen it.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Parsed row metadata.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PermissionMetadata {
    /// Restrictions keyed by workflow stage name.
    #[serde(default, deserialize_with = "null_as_default")]
    pub workflow_restrictions: BTreeMap<String, StageRestriction>,
    /// Unrecognised metadata keys, kept verbatim.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Allow/deny lists for one workflow stage.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct StageRestriction {
    /// When present, only these actions may pass at this stage.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allowed_actions: Option<Vec<String>>,
    /// Actions always denied at this stage, even if also allowed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub restricted_actions: Option<Vec<String>>,
}

/// Outcome of checking an action against a stage restriction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StageVerdict {
    /// No restriction applies; fall through to the action set.
    Unrestricted,
    /// The action is on the stage's deny list.
    Restricted,
    /// The stage has an allow list and the action is not on it.
    NotAllowed,
}

impl StageVerdict {
    /// Check if the verdict denies the action.
    pub fn denies(&self) -> bool {
        !matches!(self, StageVerdict::Unrestricted)
    }
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

impl PermissionMetadata {
    /// Parse metadata from its serialized text form.
    ///
    /// Blank text and the JSON literal `null` mean "no metadata". Anything
    /// else that is not a JSON object is an error.
    ///
    /// # Example
    ///
    /// ```
    /// use access_matrix::metadata::PermissionMetadata;
    ///
    /// let meta = PermissionMetadata::parse(
    ///     r#"{"workflowRestrictions":{"draft":{"restrictedActions":["SUBMIT"]}}}"#,
    /// )
    /// .unwrap()
    /// .unwrap();
    /// assert!(meta.restriction("draft").is_some());
    ///
    /// assert!(PermissionMetadata::parse("   ").unwrap().is_none());
    /// assert!(PermissionMetadata::parse("{not json").is_err());
    /// ```
    pub fn parse(text: &str) -> Result<Option<Self>, serde_json::Error> {
        if text.trim().is_empty() {
            return Ok(None);
        }
        serde_json::from_str(text)
    }

    /// Restriction object for `stage`, if any.
    pub fn restriction(&self, stage: &str) -> Option<&StageRestriction> {
        self.workflow_restrictions.get(stage)
    }

    /// Check `action` against the restriction for `stage`.
    pub fn verdict(&self, stage: &str, action: &str) -> StageVerdict {
        self.restriction(stage)
            .map_or(StageVerdict::Unrestricted, |r| r.verdict(action))
    }
}

impl StageRestriction {
    /// Check `action` against this stage's lists.
    ///
    /// The deny list wins over the allow list.
    pub fn verdict(&self, action: &str) -> StageVerdict {
        let listed = |list: &Option<Vec<String>>| {
            list.as_ref()
                .map(|names| names.iter().any(|name| name == action))
        };

        if listed(&self.restricted_actions) == Some(true) {
            return StageVerdict::Restricted;
        }
        if listed(&self.allowed_actions) == Some(false) {
            return StageVerdict::NotAllowed;
        }
        StageVerdict::Unrestricted
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn restriction(allowed: Option<&[&str]>, restricted: Option<&[&str]>) -> StageRestriction {
        let owned = |list: &[&str]| list.iter().map(|s| s.to_string()).collect();
        StageRestriction {
            allowed_actions: allowed.map(owned),
            restricted_actions: restricted.map(owned),
        }
    }

    #[test]
    fn test_restricted_wins_over_allowed() {
        let r = restriction(Some(&["READ", "SUBMIT"]), Some(&["SUBMIT"]));
        assert_eq!(r.verdict("SUBMIT"), StageVerdict::Restricted);
        assert_eq!(r.verdict("READ"), StageVerdict::Unrestricted);
    }

    #[test]
    fn test_allowed_list_gates() {
        let r = restriction(Some(&["READ"]), None);
        assert_eq!(r.verdict("UPDATE"), StageVerdict::NotAllowed);
        assert!(r.verdict("UPDATE").denies());
        assert!(!r.verdict("READ").denies());
    }

    #[test]
    fn test_empty_allowed_list_denies_everything() {
        let r = restriction(Some(&[]), None);
        assert_eq!(r.verdict("READ"), StageVerdict::NotAllowed);
    }

    #[test]
    fn test_no_lists_is_unrestricted() {
        assert_eq!(StageRestriction::default().verdict("READ"), StageVerdict::Unrestricted);
    }

    #[test]
    fn test_unknown_stage_is_unrestricted() {
        let meta = PermissionMetadata::parse(
            r#"{"workflowRestrictions":{"draft":{"allowedActions":[]}}}"#,
        )
        .unwrap()
        .unwrap();
        assert_eq!(meta.verdict("approved", "READ"), StageVerdict::Unrestricted);
        assert_eq!(meta.verdict("draft", "READ"), StageVerdict::NotAllowed);
    }

    #[test]
    fn test_parse_null_and_null_restrictions() {
        assert!(PermissionMetadata::parse("null").unwrap().is_none());

        let meta = PermissionMetadata::parse(r#"{"workflowRestrictions":null}"#)
            .unwrap()
            .unwrap();
        assert!(meta.workflow_restrictions.is_empty());
    }

    #[test]
    fn test_parse_keeps_extra_keys() {
        let meta = PermissionMetadata::parse(r#"{"note":"seasonal","workflowRestrictions":{}}"#)
            .unwrap()
            .unwrap();
        assert_eq!(meta.extra.get("note"), Some(&Value::from("seasonal")));
    }

    #[test]
    fn test_parse_rejects_non_objects() {
        assert!(PermissionMetadata::parse("42").is_err());
        assert!(PermissionMetadata::parse(r#"{"workflowRestrictions":{"draft":7}}"#).is_err());
    }
}
