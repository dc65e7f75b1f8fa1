//! `ApprovalPolicy` data model (spec §3.5).

use sentinel_core::TimeWindow;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Schema versions this crate understands.
pub const SUPPORTED_VERSIONS: &[&str] = &["1"];

/// Hard ceiling on `max_duration_secs`: 8 hours.
pub const MAX_DURATION_CEILING_SECS: u64 = 8 * 60 * 60;

/// The auto-approval sub-conditions attached to a rule. Must have at least
/// one field set to a non-default value — an entirely-empty `AutoApprove`
/// is a validation error, since it would silently approve everything.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AutoApprove {
    /// Requesting principals this auto-approval applies to. Empty ⇒ any.
    #[serde(default)]
    pub users: HashSet<String>,
    /// Time window the request must fall within. Absent ⇒ any time.
    #[serde(default)]
    pub time: Option<TimeWindow>,
    /// Maximum grant duration in seconds. `0` ⇒ no cap.
    #[serde(default)]
    pub max_duration_secs: u64,
}

impl AutoApprove {
    /// True if every field is at its wildcard/default value.
    #[must_use]
    pub fn is_entirely_wildcard(&self) -> bool {
        self.users.is_empty() && self.time.is_none() && self.max_duration_secs == 0
    }
}

/// A single approval rule: who may approve requests against `profiles`, and
/// under what conditions a request auto-approves without a human.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ApprovalRule {
    /// Rule identifier.
    pub name: String,
    /// Profiles this rule routes approvals for. Empty ⇒ catch-all.
    #[serde(default)]
    pub profiles: HashSet<String>,
    /// Principals authorized to approve matched requests. Must be non-empty.
    pub approvers: Vec<String>,
    /// Optional auto-approval sub-conditions.
    #[serde(default)]
    pub auto_approve: Option<AutoApprove>,
}

impl ApprovalRule {
    /// Does `profile` satisfy this rule's `profiles` set?
    #[must_use]
    pub fn matches_profile(&self, profile: &str) -> bool {
        self.profiles.is_empty() || self.profiles.contains(profile)
    }
}

/// An ordered list of approval rules; first match wins when routing
/// approvers for a profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ApprovalPolicy {
    /// Schema version. Currently only `"1"` is accepted.
    pub version: String,
    /// Approval rules, evaluated in order.
    #[serde(default)]
    pub rules: Vec<ApprovalRule>,
}

impl ApprovalPolicy {
    /// Parse an approval policy document from YAML bytes. Performs no
    /// semantic validation — call [`crate::validator::validate`] afterwards.
    pub fn from_yaml_bytes(bytes: &[u8]) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_slice(bytes)
    }

    /// First rule whose `profiles` contains `profile`, or whose `profiles`
    /// is empty (catch-all). Spec §4.3 `find_rule`.
    #[must_use]
    pub fn find_rule(&self, profile: &str) -> Option<&ApprovalRule> {
        self.rules.iter().find(|r| r.matches_profile(profile))
    }
}
