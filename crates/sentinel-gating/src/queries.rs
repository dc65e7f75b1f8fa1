//! Liveness query helpers over the store contracts (spec §3.8, §4.10-§4.11).

use crate::store::{ApprovedRequest, BreakGlassEvent, BreakGlassStore, RequestStore, StoreError};
use chrono::{DateTime, Utc};

/// The first approved request live for `(user, profile)` at `now`, or
/// `None`. Queries [`RequestStore::list_by_requester`] and filters by the
/// liveness contract of §3.8.
///
/// # Errors
/// Returns [`StoreError`] if the underlying query fails.
pub fn find_approved_request(
    store: &dyn RequestStore,
    user: &str,
    profile: &str,
    now: DateTime<Utc>,
) -> Result<Option<ApprovedRequest>, StoreError> {
    let candidates = store.list_by_requester(user, usize::MAX)?;
    Ok(candidates.into_iter().find(|r| r.is_live_for(user, profile, now)))
}

/// The first break-glass event live for `(user, profile)` at `now`, or
/// `None`. Queries [`BreakGlassStore::list_by_invoker`] and filters by the
/// liveness contract of §3.8.
///
/// # Errors
/// Returns [`StoreError`] if the underlying query fails.
pub fn find_active_break_glass(
    store: &dyn BreakGlassStore,
    user: &str,
    profile: &str,
    now: DateTime<Utc>,
) -> Result<Option<BreakGlassEvent>, StoreError> {
    let candidates = store.list_by_invoker(user, usize::MAX)?;
    Ok(candidates.into_iter().find(|e| e.is_live_for(user, profile, now)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{BreakGlassStatus, InMemoryBreakGlassStore, InMemoryRequestStore, RequestStatus};
    use chrono::Duration;

    fn now() -> DateTime<Utc> {
        Utc::now()
    }

    #[test]
    fn approved_request_mismatched_profile_is_not_found() {
        let store = InMemoryRequestStore::new();
        store
            .create(ApprovedRequest {
                id: "r1".into(),
                user: "alice".into(),
                profile: "dev".into(),
                approver: Some("bob".into()),
                status: RequestStatus::Approved,
                created_at: now(),
                duration: Duration::hours(1),
                expires_at: now() + Duration::hours(2),
            })
            .unwrap();
        assert!(find_approved_request(&store, "alice", "prod", now()).unwrap().is_none());
    }

    #[test]
    fn approved_request_outside_duration_window_is_not_found() {
        let store = InMemoryRequestStore::new();
        let created = now() - Duration::hours(2);
        store
            .create(ApprovedRequest {
                id: "r1".into(),
                user: "alice".into(),
                profile: "prod".into(),
                approver: Some("bob".into()),
                status: RequestStatus::Approved,
                created_at: created,
                duration: Duration::hours(1),
                expires_at: created + Duration::hours(24),
            })
            .unwrap();
        assert!(find_approved_request(&store, "alice", "prod", now()).unwrap().is_none());
    }

    #[test]
    fn pending_request_never_counts_as_approved() {
        let store = InMemoryRequestStore::new();
        store
            .create(ApprovedRequest {
                id: "r1".into(),
                user: "alice".into(),
                profile: "prod".into(),
                approver: None,
                status: RequestStatus::Pending,
                created_at: now(),
                duration: Duration::hours(1),
                expires_at: now() + Duration::hours(2),
            })
            .unwrap();
        assert!(find_approved_request(&store, "alice", "prod", now()).unwrap().is_none());
    }

    #[test]
    fn closed_break_glass_disqualifies_even_within_ttl() {
        let store = InMemoryBreakGlassStore::new();
        store
            .create(BreakGlassEvent {
                id: "b1".into(),
                invoker: "alice".into(),
                profile: "prod".into(),
                status: BreakGlassStatus::Closed,
                invoked_at: now(),
                expires_at: now() + Duration::hours(1),
                notified: false,
            })
            .unwrap();
        assert!(find_active_break_glass(&store, "alice", "prod", now()).unwrap().is_none());
    }

    #[test]
    fn active_break_glass_within_ttl_is_found() {
        let store = InMemoryBreakGlassStore::new();
        store
            .create(BreakGlassEvent {
                id: "b1".into(),
                invoker: "alice".into(),
                profile: "prod".into(),
                status: BreakGlassStatus::Active,
                invoked_at: now(),
                expires_at: now() + Duration::hours(1),
                notified: false,
            })
            .unwrap();
        let found = find_active_break_glass(&store, "alice", "prod", now()).unwrap();
        assert_eq!(found.unwrap().id, "b1");
    }
}
