//! Evaluator output (spec §3.7).

use crate::schema::{Conditions, Effect};
use chrono::{DateTime, Utc};
use serde::Serialize;

/// The result of evaluating a policy against a request.
///
/// `matched_rule_index == -1` iff `matched_rule_name == ""` iff this is the
/// default-deny path, whose `reason` is always exactly `"no matching
/// rule"`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Decision {
    /// The effect that was decided.
    pub effect: Effect,
    /// Name of the matched rule, or `""` on default-deny.
    pub matched_rule_name: String,
    /// Index of the matched rule, or `-1` on default-deny.
    pub matched_rule_index: i64,
    /// Human-readable reason, surfaced to audit logs.
    pub reason: String,
    /// Wall-clock time captured before any matching work began.
    pub evaluated_at: DateTime<Utc>,
    /// Deep copy of the matched rule's conditions, if any matched. Never a
    /// reference into the loaded policy, which may be swapped out from
    /// under a cache.
    pub conditions_snapshot: Option<Conditions>,
    /// Set when the caller's operational mode must include server mode to
    /// be authorized.
    pub requires_server_mode: bool,
    /// Set when the caller must have a tracked server session to be
    /// authorized.
    pub requires_session_tracking: bool,
    /// The session table the caller must be tracked against, if
    /// `requires_session_tracking` is set.
    pub session_table_name: Option<String>,
}

impl Decision {
    /// The default-deny decision produced when no policy, no request, an
    /// empty rule list, or no matching rule is found.
    #[must_use]
    pub fn default_deny(evaluated_at: DateTime<Utc>) -> Self {
        Self {
            effect: Effect::Deny,
            matched_rule_name: String::new(),
            matched_rule_index: -1,
            reason: "no matching rule".to_string(),
            evaluated_at,
            conditions_snapshot: None,
            requires_server_mode: false,
            requires_session_tracking: false,
            session_table_name: None,
        }
    }

    /// True for the default-deny shape, regardless of how it was produced.
    #[must_use]
    pub fn is_default_deny(&self) -> bool {
        self.matched_rule_index == -1 && self.matched_rule_name.is_empty()
    }
}
