//! Policy data model (spec §3.1-§3.2, §6.1).

use sentinel_core::{DeviceCondition, TimeWindow};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Schema versions this crate understands. Currently only `"1"`.
pub const SUPPORTED_VERSIONS: &[&str] = &["1"];

/// What a matched rule does.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Effect {
    /// Permit the request.
    Allow,
    /// Block the request.
    Deny,
    /// Route the request to human approval.
    RequireApproval,
    /// Permit only if the caller is already operating in server mode.
    RequireServer,
    /// Permit only if the caller has both server mode and a tracked
    /// session on the rule's `session_table`.
    RequireServerSession,
}

/// The condition bundle a rule tests a request against. All fields are
/// AND-combined; an empty `profiles`/`users` set is a wildcard.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Conditions {
    /// Profile identifiers this rule applies to. Empty ⇒ any profile.
    #[serde(default)]
    pub profiles: HashSet<String>,
    /// Principal identifiers this rule applies to. Empty ⇒ any user.
    #[serde(default)]
    pub users: HashSet<String>,
    /// Time-of-day/day-of-week window.
    #[serde(default)]
    pub time: Option<TimeWindow>,
    /// Device posture requirement.
    #[serde(default)]
    pub device: Option<DeviceCondition>,
    /// External session table identifier, consulted only when the rule's
    /// effect is `require_server_session` — it is metadata copied onto the
    /// decision, not a match predicate.
    #[serde(default)]
    pub session_table: Option<String>,
}

impl Conditions {
    /// True if every field is at its wildcard/default value. Used by the
    /// validator to reject authoring mistakes (spec §4.1) and by the
    /// linter's overlap predicates.
    #[must_use]
    pub fn is_entirely_wildcard(&self) -> bool {
        self.profiles.is_empty()
            && self.users.is_empty()
            && self.time.is_none()
            && self.device.is_none()
            && self.session_table.is_none()
    }

    /// Does `profile` satisfy this condition's `profiles` set?
    #[must_use]
    pub fn matches_profile(&self, profile: &str) -> bool {
        self.profiles.is_empty() || self.profiles.contains(profile)
    }

    /// Does `user` satisfy this condition's `users` set?
    #[must_use]
    pub fn matches_user(&self, user: &str) -> bool {
        self.users.is_empty() || self.users.contains(user)
    }
}

/// A single rule. Order within `Policy::rules` is semantically significant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Rule {
    /// Rule identifier, surfaced in decisions and logs.
    pub name: String,
    /// The effect to apply when this rule matches.
    pub effect: Effect,
    /// Match conditions, AND-combined.
    #[serde(default)]
    pub conditions: Conditions,
    /// Optional free-text justification surfaced on match.
    #[serde(default)]
    pub reason: Option<String>,
}

/// An access policy: an ordered, first-match rule list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Policy {
    /// Schema version. Currently only `"1"` is accepted.
    pub version: String,
    /// Rules, evaluated in order.
    #[serde(default)]
    pub rules: Vec<Rule>,
}

impl Policy {
    /// Parse a policy document from YAML bytes (spec §6.1). This performs
    /// no semantic validation — call [`crate::validator::validate`]
    /// afterwards.
    pub fn from_yaml_bytes(bytes: &[u8]) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_slice(bytes)
    }
}
