//! First-match policy evaluator (spec §4.2).

use crate::decision::Decision;
use crate::schema::{Effect, Policy, Rule};
use chrono::Utc;
use sentinel_core::{device, Request};

/// Evaluate `policy` against `request`, returning the first matching
/// rule's effect or a default-deny decision.
///
/// `evaluated_at` is captured before any matching work so it reflects
/// intent time rather than completion time (spec §3.7). A `None` policy or
/// request, an empty rule list, or no matching rule all collapse to the
/// same default-deny shape (spec §8 property 1).
#[must_use]
pub fn evaluate(policy: Option<&Policy>, request: Option<&Request>) -> Decision {
    let evaluated_at = Utc::now();

    let (Some(policy), Some(request)) = (policy, request) else {
        return Decision::default_deny(evaluated_at);
    };

    for (index, rule) in policy.rules.iter().enumerate() {
        if rule_matches(rule, request) {
            return decision_for_match(rule, index, request, evaluated_at);
        }
    }

    Decision::default_deny(evaluated_at)
}

fn rule_matches(rule: &Rule, request: &Request) -> bool {
    let c = &rule.conditions;

    if !c.matches_profile(&request.profile) {
        return false;
    }
    if !c.matches_user(&request.user) {
        return false;
    }
    if let Some(time) = &c.time {
        if !time.matches(request.time) {
            return false;
        }
    }
    if let Some(device_cond) = &c.device {
        if !device::matches(device_cond, request.device_posture.as_ref()) {
            return false;
        }
    }
    true
}

fn decision_for_match(
    rule: &Rule,
    index: usize,
    request: &Request,
    evaluated_at: chrono::DateTime<Utc>,
) -> Decision {
    let base = Decision {
        effect: rule.effect,
        matched_rule_name: rule.name.clone(),
        matched_rule_index: index as i64,
        reason: rule.reason.clone().unwrap_or_default(),
        evaluated_at,
        conditions_snapshot: Some(rule.conditions.clone()),
        requires_server_mode: false,
        requires_session_tracking: false,
        session_table_name: None,
    };

    match rule.effect {
        Effect::Allow | Effect::Deny | Effect::RequireApproval => base,

        Effect::RequireServer => {
            if request.server_mode {
                Decision { effect: Effect::Allow, ..base }
            } else {
                Decision { effect: Effect::Deny, requires_server_mode: true, ..base }
            }
        }

        Effect::RequireServerSession => {
            let needs_server = !request.server_mode;
            let needs_session = !request.session_established;
            if !needs_server && !needs_session {
                Decision { effect: Effect::Allow, ..base }
            } else {
                Decision {
                    effect: Effect::Deny,
                    requires_server_mode: needs_server,
                    requires_session_tracking: needs_session,
                    session_table_name: rule.conditions.session_table.clone(),
                    ..base
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::Conditions;
    use sentinel_core::time_window::{HourRange, TimeWindow};
    use std::collections::HashSet;

    fn utc(y: i32, mo: u32, d: u32, h: u32, mi: u32) -> chrono::DateTime<Utc> {
        use chrono::TimeZone;
        Utc.with_ymd_and_hms(y, mo, d, h, mi, 0).single().unwrap()
    }

    #[test]
    fn nil_policy_or_request_denies() {
        let d = evaluate(None, None);
        assert!(d.is_default_deny());
        assert_eq!(d.reason, "no matching rule");
    }

    #[test]
    fn empty_rules_denies() {
        let p = Policy { version: "1".into(), rules: vec![] };
        let r = Request::new("alice", "prod", utc(2026, 1, 14, 10, 30));
        let d = evaluate(Some(&p), Some(&r));
        assert!(d.is_default_deny());
    }

    #[test]
    fn first_match_wins() {
        let mut prod = HashSet::new();
        prod.insert("prod".to_string());
        let rules = vec![
            Rule {
                name: "deny-all-prod".into(),
                effect: Effect::Deny,
                conditions: Conditions { profiles: prod.clone(), ..Default::default() },
                reason: None,
            },
            Rule {
                name: "allow-all-prod".into(),
                effect: Effect::Allow,
                conditions: Conditions { profiles: prod, ..Default::default() },
                reason: None,
            },
        ];
        let p = Policy { version: "1".into(), rules };
        let r = Request::new("alice", "prod", utc(2026, 1, 14, 10, 30));
        let d = evaluate(Some(&p), Some(&r));
        assert_eq!(d.effect, Effect::Deny);
        assert_eq!(d.matched_rule_index, 0);
        assert_eq!(d.matched_rule_name, "deny-all-prod");
    }

    #[test]
    fn case_sensitive_user_match() {
        let mut users = HashSet::new();
        users.insert("Alice".to_string());
        let rule = Rule {
            name: "alice-only".into(),
            effect: Effect::Allow,
            conditions: Conditions { users, ..Default::default() },
            reason: None,
        };
        let p = Policy { version: "1".into(), rules: vec![rule] };
        let r = Request::new("alice", "prod", utc(2026, 1, 14, 10, 30));
        let d = evaluate(Some(&p), Some(&r));
        assert!(d.is_default_deny());
    }

    #[test]
    fn require_server_collapses_to_allow_when_already_in_server_mode() {
        let rule = Rule {
            name: "server-only".into(),
            effect: Effect::RequireServer,
            conditions: Conditions {
                time: Some(TimeWindow::default()),
                ..Default::default()
            },
            reason: None,
        };
        let p = Policy { version: "1".into(), rules: vec![rule] };
        let mut r = Request::new("alice", "prod", utc(2026, 1, 14, 10, 30));
        r.server_mode = true;
        let d = evaluate(Some(&p), Some(&r));
        assert_eq!(d.effect, Effect::Allow);
        assert!(!d.requires_server_mode);
    }

    #[test]
    fn require_server_denies_with_flag_when_not_in_server_mode() {
        let rule = Rule {
            name: "server-only".into(),
            effect: Effect::RequireServer,
            conditions: Conditions { time: Some(TimeWindow::default()), ..Default::default() },
            reason: None,
        };
        let p = Policy { version: "1".into(), rules: vec![rule] };
        let r = Request::new("alice", "prod", utc(2026, 1, 14, 10, 30));
        let d = evaluate(Some(&p), Some(&r));
        assert_eq!(d.effect, Effect::Deny);
        assert!(d.requires_server_mode);
    }

    #[test]
    fn require_server_session_needs_both_flags() {
        let rule = Rule {
            name: "server-session".into(),
            effect: Effect::RequireServerSession,
            conditions: Conditions {
                session_table: Some("tbl-1".into()),
                time: Some(TimeWindow::default()),
                ..Default::default()
            },
            reason: None,
        };
        let p = Policy { version: "1".into(), rules: vec![rule] };
        let mut r = Request::new("alice", "prod", utc(2026, 1, 14, 10, 30));
        let d = evaluate(Some(&p), Some(&r));
        assert_eq!(d.effect, Effect::Deny);
        assert!(d.requires_server_mode);
        assert!(d.requires_session_tracking);
        assert_eq!(d.session_table_name.as_deref(), Some("tbl-1"));

        r.server_mode = true;
        r.session_established = true;
        let d2 = evaluate(Some(&p), Some(&r));
        assert_eq!(d2.effect, Effect::Allow);
    }

    #[test]
    fn hour_boundary_property() {
        let rule = Rule {
            name: "business-hours-nyc".into(),
            effect: Effect::Allow,
            conditions: Conditions {
                time: Some(TimeWindow {
                    days: HashSet::new(),
                    hours: Some(HourRange { start: "09:00".into(), end: "17:00".into() }),
                    timezone: Some("America/New_York".into()),
                }),
                ..Default::default()
            },
            reason: None,
        };
        let p = Policy { version: "1".into(), rules: vec![rule] };

        let in_window = Request::new("alice", "prod", utc(2026, 1, 14, 15, 30));
        let d = evaluate(Some(&p), Some(&in_window));
        assert_eq!(d.effect, Effect::Allow);
        assert_eq!(d.matched_rule_name, "business-hours-nyc");

        let out_of_window = Request::new("alice", "prod", utc(2026, 1, 14, 22, 30));
        let d2 = evaluate(Some(&p), Some(&out_of_window));
        assert!(d2.is_default_deny());
    }
}
