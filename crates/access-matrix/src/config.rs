//! Access-control configuration.
//!
//! Loaded from environment variables with defaults suitable for local
//! development. Loading never fails: unparseable values fall back to the
//! default and are logged.

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{AccessError, AccessResult};

/// Environment variable holding the ambient workflow stage.
pub const ENV_DEFAULT_WORKFLOW_STAGE: &str = "ACCESS_DEFAULT_WORKFLOW_STAGE";

/// Environment variable holding the malformed-metadata policy.
pub const ENV_METADATA_ERROR_POLICY: &str = "ACCESS_METADATA_ERROR_POLICY";

/// What to do with a compilation that reported malformed metadata.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum MetadataErrorPolicy {
    /// Publish the compilation without the affected resource groups.
    #[default]
    Drop,
    /// Reject the compilation and keep the previous snapshot.
    Abort,
}

impl MetadataErrorPolicy {
    /// Get the string representation of the policy.
    pub fn as_str(&self) -> &'static str {
        match self {
            MetadataErrorPolicy::Drop => "drop",
            MetadataErrorPolicy::Abort => "abort",
        }
    }

    /// Parse policy from string representation.
    ///
    /// ```
    /// use access_matrix::config::MetadataErrorPolicy;
    ///
    /// assert_eq!(MetadataErrorPolicy::parse("ABORT"), Some(MetadataErrorPolicy::Abort));
    /// assert_eq!(MetadataErrorPolicy::parse("drop_group"), Some(MetadataErrorPolicy::Drop));
    /// assert_eq!(MetadataErrorPolicy::parse("ignore"), None);
    /// ```
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "drop" | "drop_group" | "skip" => Some(MetadataErrorPolicy::Drop),
            "abort" | "strict" | "fail" => Some(MetadataErrorPolicy::Abort),
            _ => None,
        }
    }
}

/// Access-control configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct AccessConfig {
    /// Workflow stage applied when a check passes none. An explicit stage always wins.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_workflow_stage: Option<String>,

    /// Handling of malformed row metadata on reload.
    #[serde(default)]
    pub metadata_error_policy: MetadataErrorPolicy,
}

impl AccessConfig {
    /// Load configuration from environment variables.
    ///
    /// Environment variables:
    /// - `ACCESS_DEFAULT_WORKFLOW_STAGE`: ambient workflow stage (default: none)
    /// - `ACCESS_METADATA_ERROR_POLICY`: `drop` or `abort` (default: drop)
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let default = Self::default();

        let default_workflow_stage = lookup(ENV_DEFAULT_WORKFLOW_STAGE)
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .or(default.default_workflow_stage);

        let metadata_error_policy = match lookup(ENV_METADATA_ERROR_POLICY) {
            Some(raw) => Self::parse_policy(&raw).unwrap_or_else(|e| {
                warn!(error = %e, "Falling back to default metadata error policy");
                default.metadata_error_policy
            }),
            None => default.metadata_error_policy,
        };

        Self {
            default_workflow_stage,
            metadata_error_policy,
        }
    }

    /// Set the ambient workflow stage.
    pub fn with_default_workflow_stage(mut self, stage: impl Into<String>) -> Self {
        self.default_workflow_stage = Some(stage.into());
        self
    }

    /// Set the malformed-metadata policy.
    pub fn with_metadata_error_policy(mut self, policy: MetadataErrorPolicy) -> Self {
        self.metadata_error_policy = policy;
        self
    }

    fn parse_policy(raw: &str) -> AccessResult<MetadataErrorPolicy> {
        MetadataErrorPolicy::parse(raw).ok_or_else(|| AccessError::Config {
            key: ENV_METADATA_ERROR_POLICY.to_string(),
            message: format!("expected 'drop' or 'abort', got '{}'", raw),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = AccessConfig::from_lookup(lookup(&[]));
        assert_eq!(config, AccessConfig::default());
        assert_eq!(config.metadata_error_policy, MetadataErrorPolicy::Drop);
        assert!(config.default_workflow_stage.is_none());
    }

    #[test]
    fn test_from_lookup() {
        let config = AccessConfig::from_lookup(lookup(&[
            (ENV_DEFAULT_WORKFLOW_STAGE, " draft "),
            (ENV_METADATA_ERROR_POLICY, "abort"),
        ]));
        assert_eq!(config.default_workflow_stage.as_deref(), Some("draft"));
        assert_eq!(config.metadata_error_policy, MetadataErrorPolicy::Abort);
    }

    #[test]
    fn test_invalid_values_fall_back() {
        let config = AccessConfig::from_lookup(lookup(&[
            (ENV_DEFAULT_WORKFLOW_STAGE, "   "),
            (ENV_METADATA_ERROR_POLICY, "sometimes"),
        ]));
        assert_eq!(config, AccessConfig::default());
    }

    #[test]
    fn test_parse_policy_error() {
        let err = AccessConfig::parse_policy("sometimes").unwrap_err();
        assert_eq!(err.error_code(), "CONFIG_ERROR");
        assert!(err.to_string().contains(ENV_METADATA_ERROR_POLICY));
    }
}
