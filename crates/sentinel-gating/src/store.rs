//! Request Store (C10) and Break-Glass Store (C11) interfaces (spec
//! §4.10-§4.11). Implementations are external; this crate ships only the
//! contracts and an in-memory reference implementation for tests.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::RwLock;
use thiserror::Error;

/// Lifecycle status of an approval request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestStatus {
    /// Awaiting an approver decision.
    Pending,
    /// Approved; live for gating while within its duration window.
    Approved,
    /// Explicitly denied by an approver.
    Denied,
    /// Withdrawn by the requester before a decision.
    Cancelled,
    /// Timed out without a decision.
    Expired,
}

/// A human-approved credential request (spec §3.8). Opaque to gating
/// except for the liveness contract: `status == approved` and wall-clock
/// time within `[created_at, created_at + duration]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApprovedRequest {
    /// Store-assigned identifier.
    pub id: String,
    /// Requesting principal.
    pub user: String,
    /// Target profile identifier.
    pub profile: String,
    /// Approving principal, set once `status` leaves `pending`.
    pub approver: Option<String>,
    /// Current lifecycle status.
    pub status: RequestStatus,
    /// When the request was created.
    pub created_at: DateTime<Utc>,
    /// How long an `approved` request stays live for gating, from
    /// `created_at`. Distinct from (and shorter than) the store's own TTL.
    pub duration: Duration,
    /// Store-layer expiry, strictly longer than `created_at + duration`.
    pub expires_at: DateTime<Utc>,
}

impl ApprovedRequest {
    /// Is this record live for gating purposes at `now`, for `(user,
    /// profile)`? Mismatched profile disqualifies even if otherwise live.
    #[must_use]
    pub fn is_live_for(&self, user: &str, profile: &str, now: DateTime<Utc>) -> bool {
        self.user == user
            && self.profile == profile
            && self.status == RequestStatus::Approved
            && now >= self.created_at
            && now <= self.created_at + self.duration
    }
}

/// Lifecycle status of a break-glass event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BreakGlassStatus {
    /// Invoked and not yet closed or expired.
    Active,
    /// Explicitly closed by an operator. Disqualifies regardless of TTL.
    Closed,
    /// Expired without being closed.
    Expired,
}

/// An emergency break-glass override event (spec §3.8). Live for gating
/// iff `status == active` and `now < expires_at`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BreakGlassEvent {
    /// Store-assigned identifier.
    pub id: String,
    /// Invoking principal.
    pub invoker: String,
    /// Target profile identifier.
    pub profile: String,
    /// Current lifecycle status.
    pub status: BreakGlassStatus,
    /// When the event was invoked.
    pub invoked_at: DateTime<Utc>,
    /// Store-layer expiry.
    pub expires_at: DateTime<Utc>,
    /// Set once the `breakglass.invoked` notification has fired for this
    /// event, so gating never fires it twice.
    pub notified: bool,
}

impl BreakGlassEvent {
    /// Is this record live for gating purposes at `now`, for `(user,
    /// profile)`? Mismatched profile disqualifies even if otherwise live.
    #[must_use]
    pub fn is_live_for(&self, user: &str, profile: &str, now: DateTime<Utc>) -> bool {
        self.invoker == user && self.profile == profile && self.status == BreakGlassStatus::Active && now < self.expires_at
    }
}

/// A store-layer failure. Implementations map their own backend errors
/// into this before returning to gating.
#[derive(Debug, Error)]
#[error("store error: {0}")]
pub struct StoreError(pub String);

/// Abstract CRUD and query surface for approval requests (spec §4.10).
pub trait RequestStore: Send + Sync {
    /// Persist a new request.
    ///
    /// # Errors
    /// Returns [`StoreError`] on any backend failure.
    fn create(&self, req: ApprovedRequest) -> Result<(), StoreError>;
    /// Fetch a request by id.
    ///
    /// # Errors
    /// Returns [`StoreError`] on any backend failure.
    fn get(&self, id: &str) -> Result<Option<ApprovedRequest>, StoreError>;
    /// Replace a request's stored state.
    ///
    /// # Errors
    /// Returns [`StoreError`] on any backend failure.
    fn update(&self, req: ApprovedRequest) -> Result<(), StoreError>;
    /// Remove a request.
    ///
    /// # Errors
    /// Returns [`StoreError`] on any backend failure.
    fn delete(&self, id: &str) -> Result<(), StoreError>;
    /// Requests created by `user`, most recent first, capped at `limit`.
    ///
    /// # Errors
    /// Returns [`StoreError`] on any backend failure.
    fn list_by_requester(&self, user: &str, limit: usize) -> Result<Vec<ApprovedRequest>, StoreError>;
    /// Requests currently in `status`, capped at `limit`.
    ///
    /// # Errors
    /// Returns [`StoreError`] on any backend failure.
    fn list_by_status(&self, status: RequestStatus, limit: usize) -> Result<Vec<ApprovedRequest>, StoreError>;
    /// Requests targeting `profile`, capped at `limit`.
    ///
    /// # Errors
    /// Returns [`StoreError`] on any backend failure.
    fn list_by_profile(&self, profile: &str, limit: usize) -> Result<Vec<ApprovedRequest>, StoreError>;
}

/// Abstract CRUD and query surface for break-glass events (spec §4.11),
/// analogous to [`RequestStore`] but keyed by invoker.
pub trait BreakGlassStore: Send + Sync {
    /// Persist a new event.
    ///
    /// # Errors
    /// Returns [`StoreError`] on any backend failure.
    fn create(&self, event: BreakGlassEvent) -> Result<(), StoreError>;
    /// Fetch an event by id.
    ///
    /// # Errors
    /// Returns [`StoreError`] on any backend failure.
    fn get(&self, id: &str) -> Result<Option<BreakGlassEvent>, StoreError>;
    /// Replace an event's stored state.
    ///
    /// # Errors
    /// Returns [`StoreError`] on any backend failure.
    fn update(&self, event: BreakGlassEvent) -> Result<(), StoreError>;
    /// Remove an event.
    ///
    /// # Errors
    /// Returns [`StoreError`] on any backend failure.
    fn delete(&self, id: &str) -> Result<(), StoreError>;
    /// Events invoked by `user`, most recent first, capped at `limit`.
    ///
    /// # Errors
    /// Returns [`StoreError`] on any backend failure.
    fn list_by_invoker(&self, user: &str, limit: usize) -> Result<Vec<BreakGlassEvent>, StoreError>;
    /// Events currently in `status`, capped at `limit`.
    ///
    /// # Errors
    /// Returns [`StoreError`] on any backend failure.
    fn list_by_status(&self, status: BreakGlassStatus, limit: usize) -> Result<Vec<BreakGlassEvent>, StoreError>;
    /// Events targeting `profile`, capped at `limit`.
    ///
    /// # Errors
    /// Returns [`StoreError`] on any backend failure.
    fn list_by_profile(&self, profile: &str, limit: usize) -> Result<Vec<BreakGlassEvent>, StoreError>;
}

/// An in-memory [`RequestStore`], for tests and single-process deployments.
#[derive(Debug, Default)]
pub struct InMemoryRequestStore {
    records: RwLock<HashMap<String, ApprovedRequest>>,
    /// Number of times [`RequestStore::list_by_requester`] has been called,
    /// for tests that assert on the gating priority invariant.
    pub list_by_requester_calls: std::sync::atomic::AtomicUsize,
}

impl InMemoryRequestStore {
    /// An empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl RequestStore for InMemoryRequestStore {
    fn create(&self, req: ApprovedRequest) -> Result<(), StoreError> {
        self.records.write().expect("lock poisoned").insert(req.id.clone(), req);
        Ok(())
    }

    fn get(&self, id: &str) -> Result<Option<ApprovedRequest>, StoreError> {
        Ok(self.records.read().expect("lock poisoned").get(id).cloned())
    }

    fn update(&self, req: ApprovedRequest) -> Result<(), StoreError> {
        self.records.write().expect("lock poisoned").insert(req.id.clone(), req);
        Ok(())
    }

    fn delete(&self, id: &str) -> Result<(), StoreError> {
        self.records.write().expect("lock poisoned").remove(id);
        Ok(())
    }

    fn list_by_requester(&self, user: &str, limit: usize) -> Result<Vec<ApprovedRequest>, StoreError> {
        self.list_by_requester_calls.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        let mut out: Vec<_> =
            self.records.read().expect("lock poisoned").values().filter(|r| r.user == user).cloned().collect();
        out.sort_by_key(|r| std::cmp::Reverse(r.created_at));
        out.truncate(limit);
        Ok(out)
    }

    fn list_by_status(&self, status: RequestStatus, limit: usize) -> Result<Vec<ApprovedRequest>, StoreError> {
        let mut out: Vec<_> =
            self.records.read().expect("lock poisoned").values().filter(|r| r.status == status).cloned().collect();
        out.sort_by_key(|r| std::cmp::Reverse(r.created_at));
        out.truncate(limit);
        Ok(out)
    }

    fn list_by_profile(&self, profile: &str, limit: usize) -> Result<Vec<ApprovedRequest>, StoreError> {
        let mut out: Vec<_> =
            self.records.read().expect("lock poisoned").values().filter(|r| r.profile == profile).cloned().collect();
        out.sort_by_key(|r| std::cmp::Reverse(r.created_at));
        out.truncate(limit);
        Ok(out)
    }
}

/// An in-memory [`BreakGlassStore`], for tests and single-process
/// deployments.
#[derive(Debug, Default)]
pub struct InMemoryBreakGlassStore {
    records: RwLock<HashMap<String, BreakGlassEvent>>,
    /// Number of times [`BreakGlassStore::list_by_invoker`] has been
    /// called, for tests that assert on the gating priority invariant.
    pub list_by_invoker_calls: std::sync::atomic::AtomicUsize,
}

impl InMemoryBreakGlassStore {
    /// An empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl BreakGlassStore for InMemoryBreakGlassStore {
    fn create(&self, event: BreakGlassEvent) -> Result<(), StoreError> {
        self.records.write().expect("lock poisoned").insert(event.id.clone(), event);
        Ok(())
    }

    fn get(&self, id: &str) -> Result<Option<BreakGlassEvent>, StoreError> {
        Ok(self.records.read().expect("lock poisoned").get(id).cloned())
    }

    fn update(&self, event: BreakGlassEvent) -> Result<(), StoreError> {
        self.records.write().expect("lock poisoned").insert(event.id.clone(), event);
        Ok(())
    }

    fn delete(&self, id: &str) -> Result<(), StoreError> {
        self.records.write().expect("lock poisoned").remove(id);
        Ok(())
    }

    fn list_by_invoker(&self, user: &str, limit: usize) -> Result<Vec<BreakGlassEvent>, StoreError> {
        self.list_by_invoker_calls.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        let mut out: Vec<_> =
            self.records.read().expect("lock poisoned").values().filter(|e| e.invoker == user).cloned().collect();
        out.sort_by_key(|e| std::cmp::Reverse(e.invoked_at));
        out.truncate(limit);
        Ok(out)
    }

    fn list_by_status(&self, status: BreakGlassStatus, limit: usize) -> Result<Vec<BreakGlassEvent>, StoreError> {
        let mut out: Vec<_> =
            self.records.read().expect("lock poisoned").values().filter(|e| e.status == status).cloned().collect();
        out.sort_by_key(|e| std::cmp::Reverse(e.invoked_at));
        out.truncate(limit);
        Ok(out)
    }

    fn list_by_profile(&self, profile: &str, limit: usize) -> Result<Vec<BreakGlassEvent>, StoreError> {
        let mut out: Vec<_> =
            self.records.read().expect("lock poisoned").values().filter(|e| e.profile == profile).cloned().collect();
        out.sort_by_key(|e| std::cmp::Reverse(e.invoked_at));
        out.truncate(limit);
        Ok(out)
    }
}
