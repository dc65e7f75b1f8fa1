//! Structural validation for a parsed [`Policy`] (spec §4.1).

use crate::schema::{Policy, SUPPORTED_VERSIONS};
use thiserror::Error;

/// A validation failure, always pinned to the offending rule by index and
/// name so the author can find it. Never produced by a panic.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// `version` is not in [`SUPPORTED_VERSIONS`].
    #[error("unsupported policy version '{0}'")]
    UnsupportedVersion(String),
    /// `rules` is empty.
    #[error("policy must have at least one rule")]
    NoRules,
    /// `rules[index].name` is empty.
    #[error("rules[{index}] has an empty name")]
    EmptyRuleName {
        /// Index of the offending rule.
        index: usize,
    },
    /// `rules[index]` has conditions that are entirely wildcard.
    #[error("rules[{index}] ('{name}') has no non-wildcard condition")]
    NoNonWildcardCondition {
        /// Index of the offending rule.
        index: usize,
        /// Name of the offending rule.
        name: String,
    },
    /// `rules[index].conditions.time` is malformed.
    #[error("rules[{index}] ('{name}') has an invalid time window: {source}")]
    InvalidTimeWindow {
        /// Index of the offending rule.
        index: usize,
        /// Name of the offending rule.
        name: String,
        /// Underlying cause.
        source: sentinel_core::TimeWindowError,
    },
}

/// Validate a parsed policy per spec §4.1. Returns the first failure found,
/// identified by rule index and name.
pub fn validate(policy: &Policy) -> Result<(), ValidationError> {
    if !SUPPORTED_VERSIONS.contains(&policy.version.as_str()) {
        return Err(ValidationError::UnsupportedVersion(policy.version.clone()));
    }
    if policy.rules.is_empty() {
        return Err(ValidationError::NoRules);
    }
    for (index, rule) in policy.rules.iter().enumerate() {
        if rule.name.trim().is_empty() {
            return Err(ValidationError::EmptyRuleName { index });
        }
        if rule.conditions.is_entirely_wildcard() {
            return Err(ValidationError::NoNonWildcardCondition {
                index,
                name: rule.name.clone(),
            });
        }
        if let Some(time) = &rule.conditions.time {
            time.validate().map_err(|source| ValidationError::InvalidTimeWindow {
                index,
                name: rule.name.clone(),
                source,
            })?;
        }
        // `Effect` and `DeviceCondition` are validated structurally by
        // their own (de)serialization — an unknown effect string or device
        // field fails to parse in the first place (spec §4.1, §6.1 strict
        // schema), so there is nothing further to check here.
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{Conditions, Effect, Rule};
    use std::collections::HashSet;

    fn rule_with_profile(name: &str) -> Rule {
        let mut profiles = HashSet::new();
        profiles.insert("prod".to_string());
        Rule {
            name: name.into(),
            effect: Effect::Allow,
            conditions: Conditions { profiles, ..Default::default() },
            reason: None,
        }
    }

    #[test]
    fn rejects_unsupported_version() {
        let p = Policy { version: "2".into(), rules: vec![rule_with_profile("r1")] };
        assert_eq!(validate(&p), Err(ValidationError::UnsupportedVersion("2".into())));
    }

    #[test]
    fn rejects_empty_rules() {
        let p = Policy { version: "1".into(), rules: vec![] };
        assert_eq!(validate(&p), Err(ValidationError::NoRules));
    }

    #[test]
    fn rejects_entirely_wildcard_conditions() {
        let rule =
            Rule { name: "catch-all".into(), effect: Effect::Deny, conditions: Conditions::default(), reason: None };
        let p = Policy { version: "1".into(), rules: vec![rule] };
        assert!(matches!(validate(&p), Err(ValidationError::NoNonWildcardCondition { .. })));
    }

    #[test]
    fn accepts_a_well_formed_policy() {
        let p = Policy { version: "1".into(), rules: vec![rule_with_profile("r1")] };
        assert!(validate(&p).is_ok());
    }
}
