//! Structural linter: flags authoring mistakes without altering load
//! behavior (spec §4.4). Lint output is advisory only.

use crate::schema::{Conditions, Effect, Policy};
use sentinel_core::TimeWindow;

/// The three diagnostic classes the linter emits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LintIssueKind {
    /// An earlier `allow` rule is shadowed by a later `deny` over
    /// overlapping profiles.
    AllowBeforeDeny,
    /// A rule can never fire because an earlier rule with the same effect
    /// is a strict superset of its conditions.
    UnreachableRule,
    /// Two rules with different effects have overlapping profile, day, and
    /// hour conditions.
    OverlappingTimeWindows,
}

/// A single diagnostic, pinned to the rule that triggered it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LintIssue {
    /// Which diagnostic class this is.
    pub kind: LintIssueKind,
    /// Index of the flagged rule.
    pub rule_index: usize,
    /// Name of the flagged rule.
    pub rule_name: String,
    /// Human-readable explanation.
    pub message: String,
}

/// Run all three lint passes over an already-[`validate`](crate::validator::validate)d
/// policy.
#[must_use]
pub fn lint(policy: &Policy) -> Vec<LintIssue> {
    let mut issues = Vec::new();
    issues.extend(allow_before_deny(policy));
    issues.extend(unreachable_rules(policy));
    issues.extend(overlapping_time_windows(policy));
    issues
}

/// Empty set on either side is a wildcard and overlaps with anything;
/// otherwise overlap requires a common element.
fn profiles_overlap(a: &std::collections::HashSet<String>, b: &std::collections::HashSet<String>) -> bool {
    a.is_empty() || b.is_empty() || a.intersection(b).next().is_some()
}

fn days_overlap(a: &TimeWindow, b: &TimeWindow) -> bool {
    a.days.is_empty() || b.days.is_empty() || a.days.intersection(&b.days).next().is_some()
}

fn parse_minutes(hhmm: &str) -> Option<u32> {
    let (h, m) = hhmm.split_once(':')?;
    Some(h.parse::<u32>().ok()? * 60 + m.parse::<u32>().ok()?)
}

/// Abutting ranges (`[09:00,12:00)` and `[12:00,17:00)`) are disjoint.
fn hours_overlap(a: &TimeWindow, b: &TimeWindow) -> bool {
    let (Some(ah), Some(bh)) = (&a.hours, &b.hours) else {
        return true;
    };
    let (Some(a_start), Some(a_end)) = (parse_minutes(&ah.start), parse_minutes(&ah.end)) else {
        return true;
    };
    let (Some(b_start), Some(b_end)) = (parse_minutes(&bh.start), parse_minutes(&bh.end)) else {
        return true;
    };
    a_start.max(b_start) < a_end.min(b_end)
}

fn allow_before_deny(policy: &Policy) -> Vec<LintIssue> {
    let mut out = Vec::new();
    for (i, rule_i) in policy.rules.iter().enumerate() {
        if rule_i.effect != Effect::Allow {
            continue;
        }
        for (j, rule_j) in policy.rules.iter().enumerate().skip(i + 1) {
            if rule_j.effect != Effect::Deny {
                continue;
            }
            if profiles_overlap(&rule_i.conditions.profiles, &rule_j.conditions.profiles) {
                out.push(LintIssue {
                    kind: LintIssueKind::AllowBeforeDeny,
                    rule_index: i,
                    rule_name: rule_i.name.clone(),
                    message: format!(
                        "rule '{}' allows before later deny rule '{}' ({}) over an overlapping profile set",
                        rule_i.name, rule_j.name, j
                    ),
                });
                break;
            }
        }
    }
    out
}

/// Three-valued outcome of comparing two rules' time windows for the
/// unreachable-rule superset test. `Ambiguous` means both rules carry a
/// time window — the spec calls for taking no stance in that case rather
/// than risk a false positive.
enum TimeCmp {
    NotStricter,
    Stricter,
    Ambiguous,
}

fn time_not_stricter(i: &Conditions, j: &Conditions) -> TimeCmp {
    match (&i.time, &j.time) {
        (None, None) => TimeCmp::NotStricter,
        (Some(_), None) => TimeCmp::NotStricter, // j has no restriction, i does: j is broader.
        (None, Some(_)) => TimeCmp::Stricter,    // j restricts where i didn't: j is narrower.
        (Some(_), Some(_)) => TimeCmp::Ambiguous,
    }
}

fn is_superset(j: &Conditions, i: &Conditions) -> bool {
    let profiles_ok = j.profiles.is_empty() || (!i.profiles.is_empty() && j.profiles.is_superset(&i.profiles));
    let profiles_ok = profiles_ok || (i.profiles.is_empty() && j.profiles.is_empty());
    if !profiles_ok {
        return false;
    }
    let users_ok = j.users.is_empty() || (!i.users.is_empty() && j.users.is_superset(&i.users));
    let users_ok = users_ok || (i.users.is_empty() && j.users.is_empty());
    if !users_ok {
        return false;
    }
    matches!(time_not_stricter(i, j), TimeCmp::NotStricter)
}

fn unreachable_rules(policy: &Policy) -> Vec<LintIssue> {
    let mut out = Vec::new();
    for (i, rule_i) in policy.rules.iter().enumerate() {
        for (j, rule_j) in policy.rules.iter().enumerate().take(i) {
            if rule_i.effect != rule_j.effect {
                continue;
            }
            if is_superset(&rule_j.conditions, &rule_i.conditions) {
                out.push(LintIssue {
                    kind: LintIssueKind::UnreachableRule,
                    rule_index: i,
                    rule_name: rule_i.name.clone(),
                    message: format!(
                        "rule '{}' is unreachable: earlier rule '{}' ({}) already covers its conditions",
                        rule_i.name, rule_j.name, j
                    ),
                });
                break;
            }
        }
    }
    out
}

fn overlapping_time_windows(policy: &Policy) -> Vec<LintIssue> {
    let mut out = Vec::new();
    for (i, rule_i) in policy.rules.iter().enumerate() {
        for (j, rule_j) in policy.rules.iter().enumerate().skip(i + 1) {
            if rule_i.effect == rule_j.effect {
                continue;
            }
            if !profiles_overlap(&rule_i.conditions.profiles, &rule_j.conditions.profiles) {
                continue;
            }
            let (Some(ti), Some(tj)) = (&rule_i.conditions.time, &rule_j.conditions.time) else {
                continue;
            };
            if days_overlap(ti, tj) && hours_overlap(ti, tj) {
                out.push(LintIssue {
                    kind: LintIssueKind::OverlappingTimeWindows,
                    rule_index: i,
                    rule_name: rule_i.name.clone(),
                    message: format!(
                        "rule '{}' and rule '{}' ({}) have different effects but overlapping time windows and profiles",
                        rule_i.name, rule_j.name, j
                    ),
                });
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::Rule;
    use sentinel_core::time_window::HourRange;
    use std::collections::HashSet;

    fn profiles(names: &[&str]) -> HashSet<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn flags_allow_before_deny_on_overlapping_profiles() {
        let rules = vec![
            Rule {
                name: "allow-prod".into(),
                effect: Effect::Allow,
                conditions: Conditions { profiles: profiles(&["prod"]), ..Default::default() },
                reason: None,
            },
            Rule {
                name: "deny-prod".into(),
                effect: Effect::Deny,
                conditions: Conditions { profiles: profiles(&["prod"]), ..Default::default() },
                reason: None,
            },
        ];
        let p = Policy { version: "1".into(), rules };
        let issues = lint(&p);
        assert!(issues.iter().any(|i| i.kind == LintIssueKind::AllowBeforeDeny && i.rule_index == 0));
    }

    #[test]
    fn does_not_flag_disjoint_profiles() {
        let rules = vec![
            Rule {
                name: "allow-dev".into(),
                effect: Effect::Allow,
                conditions: Conditions { profiles: profiles(&["dev"]), ..Default::default() },
                reason: None,
            },
            Rule {
                name: "deny-prod".into(),
                effect: Effect::Deny,
                conditions: Conditions { profiles: profiles(&["prod"]), ..Default::default() },
                reason: None,
            },
        ];
        let p = Policy { version: "1".into(), rules };
        let issues = lint(&p);
        assert!(issues.is_empty());
    }

    #[test]
    fn flags_unreachable_rule_when_earlier_rule_is_a_superset() {
        let rules = vec![
            Rule {
                name: "deny-any".into(),
                effect: Effect::Deny,
                conditions: Conditions { users: profiles(&["mallory"]), ..Default::default() },
                reason: None,
            },
            Rule {
                name: "deny-prod-mallory".into(),
                effect: Effect::Deny,
                conditions: Conditions {
                    profiles: profiles(&["prod"]),
                    users: profiles(&["mallory"]),
                    ..Default::default()
                },
                reason: None,
            },
        ];
        let p = Policy { version: "1".into(), rules };
        let issues = lint(&p);
        assert!(issues.iter().any(|i| i.kind == LintIssueKind::UnreachableRule && i.rule_index == 1));
    }

    #[test]
    fn takes_no_stance_when_both_rules_have_time_windows() {
        let tw = TimeWindow {
            days: HashSet::new(),
            hours: Some(HourRange { start: "09:00".into(), end: "17:00".into() }),
            timezone: None,
        };
        let rules = vec![
            Rule {
                name: "deny-a".into(),
                effect: Effect::Deny,
                conditions: Conditions { time: Some(tw.clone()), ..Default::default() },
                reason: None,
            },
            Rule {
                name: "deny-b".into(),
                effect: Effect::Deny,
                conditions: Conditions { time: Some(tw), ..Default::default() },
                reason: None,
            },
        ];
        let p = Policy { version: "1".into(), rules };
        let issues = lint(&p);
        assert!(!issues.iter().any(|i| i.kind == LintIssueKind::UnreachableRule));
    }

    #[test]
    fn flags_overlapping_time_windows_with_different_effects() {
        let tw = TimeWindow {
            days: HashSet::new(),
            hours: Some(HourRange { start: "09:00".into(), end: "17:00".into() }),
            timezone: None,
        };
        let rules = vec![
            Rule {
                name: "allow-biz-hours".into(),
                effect: Effect::Allow,
                conditions: Conditions {
                    profiles: profiles(&["prod"]),
                    time: Some(tw.clone()),
                    ..Default::default()
                },
                reason: None,
            },
            Rule {
                name: "require-approval-biz-hours".into(),
                effect: Effect::RequireApproval,
                conditions: Conditions {
                    profiles: profiles(&["prod"]),
                    time: Some(tw),
                    ..Default::default()
                },
                reason: None,
            },
        ];
        let p = Policy { version: "1".into(), rules };
        let issues = lint(&p);
        assert!(issues.iter().any(|i| i.kind == LintIssueKind::OverlappingTimeWindows));
    }

    #[test]
    fn abutting_hour_ranges_do_not_overlap() {
        let morning = TimeWindow {
            days: HashSet::new(),
            hours: Some(HourRange { start: "09:00".into(), end: "12:00".into() }),
            timezone: None,
        };
        let afternoon = TimeWindow {
            days: HashSet::new(),
            hours: Some(HourRange { start: "12:00".into(), end: "17:00".into() }),
            timezone: None,
        };
        let rules = vec![
            Rule {
                name: "allow-morning".into(),
                effect: Effect::Allow,
                conditions: Conditions {
                    profiles: profiles(&["prod"]),
                    time: Some(morning),
                    ..Default::default()
                },
                reason: None,
            },
            Rule {
                name: "deny-afternoon".into(),
                effect: Effect::Deny,
                conditions: Conditions {
                    profiles: profiles(&["prod"]),
                    time: Some(afternoon),
                    ..Default::default()
                },
                reason: None,
            },
        ];
        let p = Policy { version: "1".into(), rules };
        let issues = lint(&p);
        assert!(!issues.iter().any(|i| i.kind == LintIssueKind::OverlappingTimeWindows));
    }
}
