//! Approver routing and auto-approval predicates (spec §4.3). All four
//! functions are pure and total: no rule or policy input panics.

use crate::schema::{ApprovalPolicy, ApprovalRule};
use chrono::{DateTime, Utc};

/// First rule whose `profiles` contains `profile`, or whose `profiles` is
/// empty (catch-all). A `None` policy yields `None`.
#[must_use]
pub fn find_rule<'a>(policy: Option<&'a ApprovalPolicy>, profile: &str) -> Option<&'a ApprovalRule> {
    policy.and_then(|p| p.find_rule(profile))
}

/// Case-sensitive membership of `approver` in `rule.approvers`. A `None`
/// rule yields `false`.
#[must_use]
pub fn can_approve(rule: Option<&ApprovalRule>, approver: &str) -> bool {
    rule.is_some_and(|r| r.approvers.iter().any(|a| a == approver))
}

/// Does this rule's `auto_approve` block, if any, clear the requester,
/// request time, and requested duration?
///
/// Requires the rule to exist and carry a populated `auto_approve`; every
/// set sub-condition must hold. `duration_secs` is the grant duration being
/// requested, compared against `max_duration_secs` (`0` ⇒ no cap).
#[must_use]
pub fn should_auto_approve(
    rule: Option<&ApprovalRule>,
    requester: &str,
    request_time: DateTime<Utc>,
    duration_secs: u64,
) -> bool {
    let Some(rule) = rule else {
        return false;
    };
    let Some(auto) = &rule.auto_approve else {
        return false;
    };

    if !auto.users.is_empty() && !auto.users.contains(requester) {
        return false;
    }
    if let Some(time) = &auto.time {
        if !time.matches(request_time) {
            return false;
        }
    }
    if auto.max_duration_secs != 0 && duration_secs > auto.max_duration_secs {
        return false;
    }
    true
}

/// The approvers authorized for `profile`, or an empty list if no rule
/// matches (or the policy is absent).
#[must_use]
pub fn approvers_for(policy: Option<&ApprovalPolicy>, profile: &str) -> Vec<String> {
    find_rule(policy, profile).map(|r| r.approvers.clone()).unwrap_or_default()
}
