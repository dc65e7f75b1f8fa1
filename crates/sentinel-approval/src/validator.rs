//! Structural validation for a parsed [`ApprovalPolicy`].

use crate::schema::{ApprovalPolicy, MAX_DURATION_CEILING_SECS, SUPPORTED_VERSIONS};
use thiserror::Error;

/// A validation failure, pinned to the offending rule by index and name.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// `version` is not in [`SUPPORTED_VERSIONS`].
    #[error("unsupported approval policy version '{0}'")]
    UnsupportedVersion(String),
    /// `rules` is empty.
    #[error("approval policy must have at least one rule")]
    NoRules,
    /// `rules[index].name` is empty.
    #[error("rules[{index}] has an empty name")]
    EmptyRuleName {
        /// Index of the offending rule.
        index: usize,
    },
    /// `rules[index].approvers` is empty.
    #[error("rules[{index}] ('{name}') has no approvers")]
    NoApprovers {
        /// Index of the offending rule.
        index: usize,
        /// Name of the offending rule.
        name: String,
    },
    /// `rules[index].auto_approve` is present but entirely wildcard.
    #[error("rules[{index}] ('{name}') has an auto_approve block with no sub-condition")]
    EmptyAutoApprove {
        /// Index of the offending rule.
        index: usize,
        /// Name of the offending rule.
        name: String,
    },
    /// `rules[index].auto_approve.max_duration_secs` exceeds the ceiling.
    #[error("rules[{index}] ('{name}') max_duration_secs {value} exceeds ceiling of {MAX_DURATION_CEILING_SECS}")]
    MaxDurationExceedsCeiling {
        /// Index of the offending rule.
        index: usize,
        /// Name of the offending rule.
        name: String,
        /// The offending value.
        value: u64,
    },
    /// `rules[index].auto_approve.time` is malformed.
    #[error("rules[{index}] ('{name}') has an invalid auto_approve time window: {source}")]
    InvalidTimeWindow {
        /// Index of the offending rule.
        index: usize,
        /// Name of the offending rule.
        name: String,
        /// Underlying cause.
        source: sentinel_core::TimeWindowError,
    },
}

/// Validate a parsed approval policy per spec §3.5. Returns the first
/// failure found, identified by rule index and name.
pub fn validate(policy: &ApprovalPolicy) -> Result<(), ValidationError> {
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
        if rule.approvers.is_empty() {
            return Err(ValidationError::NoApprovers { index, name: rule.name.clone() });
        }
        if let Some(auto) = &rule.auto_approve {
            if auto.is_entirely_wildcard() {
                return Err(ValidationError::EmptyAutoApprove { index, name: rule.name.clone() });
            }
            if auto.max_duration_secs > MAX_DURATION_CEILING_SECS {
                return Err(ValidationError::MaxDurationExceedsCeiling {
                    index,
                    name: rule.name.clone(),
                    value: auto.max_duration_secs,
                });
            }
            if let Some(time) = &auto.time {
                time.validate().map_err(|source| ValidationError::InvalidTimeWindow {
                    index,
                    name: rule.name.clone(),
                    source,
                })?;
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{ApprovalRule, AutoApprove};

    fn rule(name: &str) -> ApprovalRule {
        ApprovalRule { name: name.into(), profiles: Default::default(), approvers: vec!["alice".into()], auto_approve: None }
    }

    #[test]
    fn rejects_unsupported_version() {
        let p = ApprovalPolicy { version: "2".into(), rules: vec![rule("r1")] };
        assert_eq!(validate(&p), Err(ValidationError::UnsupportedVersion("2".into())));
    }

    #[test]
    fn rejects_empty_approvers() {
        let mut r = rule("r1");
        r.approvers.clear();
        let p = ApprovalPolicy { version: "1".into(), rules: vec![r] };
        assert!(matches!(validate(&p), Err(ValidationError::NoApprovers { .. })));
    }

    #[test]
    fn rejects_entirely_wildcard_auto_approve() {
        let mut r = rule("r1");
        r.auto_approve = Some(AutoApprove::default());
        let p = ApprovalPolicy { version: "1".into(), rules: vec![r] };
        assert!(matches!(validate(&p), Err(ValidationError::EmptyAutoApprove { .. })));
    }

    #[test]
    fn rejects_max_duration_above_ceiling() {
        let mut r = rule("r1");
        r.auto_approve = Some(AutoApprove { max_duration_secs: MAX_DURATION_CEILING_SECS + 1, ..Default::default() });
        let p = ApprovalPolicy { version: "1".into(), rules: vec![r] };
        assert!(matches!(validate(&p), Err(ValidationError::MaxDurationExceedsCeiling { .. })));
    }

    #[test]
    fn accepts_a_well_formed_policy() {
        let p = ApprovalPolicy { version: "1".into(), rules: vec![rule("r1")] };
        assert!(validate(&p).is_ok());
    }
}
