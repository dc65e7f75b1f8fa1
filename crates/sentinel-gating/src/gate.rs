//! Gating protocol (C9, spec §4.9): composes a policy decision with
//! approved-request and break-glass overrides to reach a final
//! authorization.

use crate::queries::{find_active_break_glass, find_approved_request};
use crate::store::{BreakGlassEvent, BreakGlassStore, RequestStore, StoreError};
use chrono::{DateTime, Utc};
use sentinel_policy::{evaluate, Decision, Effect, Policy};
use sentinel_core::Request;
use thiserror::Error;

/// Which layer produced the final authorization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateSource {
    /// The policy decision itself authorized (a plain `allow`, or a
    /// `require_server`/`require_server_session` already satisfied by the
    /// caller's actual mode).
    Policy,
    /// A live approved request overrode a non-allow decision.
    ApprovedRequest,
    /// A live break-glass event overrode a non-allow decision.
    BreakGlass,
}

/// The final result of gating a request.
#[derive(Debug, Clone)]
pub struct GateOutcome {
    /// Whether the request is authorized.
    pub authorized: bool,
    /// Human-readable reason, carried through to audit logs.
    pub reason: String,
    /// Which layer decided the outcome.
    pub source: GateSource,
    /// The underlying policy decision, always present for context.
    pub decision: Decision,
}

/// A store-layer failure surfaced during gating.
#[derive(Debug, Error)]
pub enum GateError {
    /// The approved-request store failed.
    #[error("request store error: {0}")]
    RequestStore(#[source] StoreError),
    /// The break-glass store failed.
    #[error("break-glass store error: {0}")]
    BreakGlassStore(#[source] StoreError),
}

/// Fires a `breakglass.invoked` notification for an event gating just
/// authorized via break-glass. Implemented by the notification outflow
/// crate; kept as a narrow interface here so gating has no dependency on
/// the sink machinery.
pub trait BreakGlassNotifier {
    /// Notify that `event` authorized a request. Must not block gating on
    /// notifier latency, and must never propagate a notifier failure.
    fn notify_invoked(&self, event: &BreakGlassEvent);
}

/// Gate a request: evaluate the policy, and if the decision is not a
/// direct `allow`, consult the approved-request store and then the
/// break-glass store before settling on a final deny.
///
/// **Priority invariant**: the approved-request store is always queried
/// before the break-glass store; if a live approved request is found, the
/// break-glass store is never queried at all.
///
/// # Errors
/// Returns [`GateError`] if either store query fails. A store failure is
/// not mapped to an implicit allow or deny — it propagates so the caller
/// can decide fail-closed handling explicitly.
pub fn gate(
    policy: Option<&Policy>,
    request: &Request,
    request_store: &dyn RequestStore,
    break_glass_store: &dyn BreakGlassStore,
    notifier: Option<&dyn BreakGlassNotifier>,
) -> Result<GateOutcome, GateError> {
    let decision = evaluate(policy, Some(request));
    let now = Utc::now();

    if is_direct_allow(&decision) {
        return Ok(GateOutcome {
            authorized: true,
            reason: decision.reason.clone(),
            source: GateSource::Policy,
            decision,
        });
    }

    let approved = find_approved_request(request_store, &request.user, &request.profile, now)
        .map_err(GateError::RequestStore)?;
    if approved.is_some() {
        return Ok(GateOutcome {
            authorized: true,
            reason: "approved request".to_string(),
            source: GateSource::ApprovedRequest,
            decision,
        });
    }

    let break_glass = find_active_break_glass(break_glass_store, &request.user, &request.profile, now)
        .map_err(GateError::BreakGlassStore)?;
    if let Some(mut event) = break_glass {
        if !event.notified {
            if let Some(notifier) = notifier {
                notifier.notify_invoked(&event);
            }
            event.notified = true;
            // Best-effort: a failed persist of the notified flag does not
            // undo the authorization already decided below.
            let _ = break_glass_store.update(event);
        }
        return Ok(GateOutcome {
            authorized: true,
            reason: "break-glass".to_string(),
            source: GateSource::BreakGlass,
            decision,
        });
    }

    let reason = decision.reason.clone();
    Ok(GateOutcome { authorized: false, reason, source: GateSource::Policy, decision })
}

fn is_direct_allow(decision: &Decision) -> bool {
    decision.effect == Effect::Allow
}
