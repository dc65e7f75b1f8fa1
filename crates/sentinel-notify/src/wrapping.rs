//! Store decorators that fire notifications on lifecycle transitions
//! (spec §4.11), without ever letting sink latency or failure affect the
//! mutating call.

use crate::event::{BreakGlassSubject, Event, EventType, RequestSubject, SYSTEM_ACTOR};
use crate::sink::Sink;
use sentinel_gating::{
    ApprovedRequest, BreakGlassEvent, BreakGlassStatus, BreakGlassStore, RequestStatus, RequestStore, StoreError,
};
use std::sync::Arc;
use tracing::warn;

fn dispatch(sink: Arc<dyn Sink>, event: Event) {
    tokio::spawn(async move {
        if let Err(e) = sink.publish(&event).await {
            warn!(error = %e, event_type = %event.event_type, "notification dispatch failed");
        }
    });
}

fn request_event_for_transition(prior: RequestStatus, req: &ApprovedRequest) -> Option<(EventType, String)> {
    if prior != RequestStatus::Pending {
        return None;
    }
    match req.status {
        RequestStatus::Approved => {
            Some((EventType::RequestApproved, req.approver.clone().unwrap_or_else(|| req.user.clone())))
        }
        RequestStatus::Denied => {
            Some((EventType::RequestDenied, req.approver.clone().unwrap_or_else(|| req.user.clone())))
        }
        RequestStatus::Cancelled => Some((EventType::RequestCancelled, req.user.clone())),
        RequestStatus::Expired => Some((EventType::RequestExpired, SYSTEM_ACTOR.to_string())),
        RequestStatus::Pending => None,
    }
}

fn break_glass_event_for_transition(prior: BreakGlassStatus, event: &BreakGlassEvent) -> Option<(EventType, String)> {
    if prior != BreakGlassStatus::Active {
        return None;
    }
    match event.status {
        BreakGlassStatus::Closed => Some((EventType::BreakGlassClosed, event.invoker.clone())),
        BreakGlassStatus::Expired => Some((EventType::BreakGlassExpired, SYSTEM_ACTOR.to_string())),
        BreakGlassStatus::Active => None,
    }
}

/// Wraps a [`RequestStore`], firing `request.*` events on creation and on
/// pending-to-terminal status transitions.
pub struct NotifyingRequestStore<S> {
    inner: S,
    sink: Arc<dyn Sink>,
}

impl<S: RequestStore> NotifyingRequestStore<S> {
    /// Wrap `inner`, dispatching events to `sink`.
    pub fn new(inner: S, sink: Arc<dyn Sink>) -> Self {
        Self { inner, sink }
    }
}

impl<S: RequestStore> RequestStore for NotifyingRequestStore<S> {
    fn create(&self, req: ApprovedRequest) -> Result<(), StoreError> {
        let subject = RequestSubject { id: req.id.clone(), user: req.user.clone(), profile: req.profile.clone() };
        let actor = req.user.clone();
        self.inner.create(req)?;
        dispatch(self.sink.clone(), Event::for_request(EventType::RequestCreated, subject, actor));
        Ok(())
    }

    fn get(&self, id: &str) -> Result<Option<ApprovedRequest>, StoreError> {
        self.inner.get(id)
    }

    fn update(&self, req: ApprovedRequest) -> Result<(), StoreError> {
        // Best-effort: if the prior record can't be read, the mutation still
        // proceeds; it just cannot fire a transition notification.
        let prior_status = self.inner.get(&req.id).ok().flatten().map(|r| r.status);
        let transition = prior_status.and_then(|prior| request_event_for_transition(prior, &req));
        let subject = RequestSubject { id: req.id.clone(), user: req.user.clone(), profile: req.profile.clone() };
        self.inner.update(req)?;
        if let Some((event_type, actor)) = transition {
            dispatch(self.sink.clone(), Event::for_request(event_type, subject, actor));
        }
        Ok(())
    }

    fn delete(&self, id: &str) -> Result<(), StoreError> {
        self.inner.delete(id)
    }

    fn list_by_requester(&self, user: &str, limit: usize) -> Result<Vec<ApprovedRequest>, StoreError> {
        self.inner.list_by_requester(user, limit)
    }

    fn list_by_status(&self, status: RequestStatus, limit: usize) -> Result<Vec<ApprovedRequest>, StoreError> {
        self.inner.list_by_status(status, limit)
    }

    fn list_by_profile(&self, profile: &str, limit: usize) -> Result<Vec<ApprovedRequest>, StoreError> {
        self.inner.list_by_profile(profile, limit)
    }
}

/// Wraps a [`BreakGlassStore`], firing `breakglass.*` events on invocation
/// and on active-to-terminal status transitions.
pub struct NotifyingBreakGlassStore<S> {
    inner: S,
    sink: Arc<dyn Sink>,
}

impl<S: BreakGlassStore> NotifyingBreakGlassStore<S> {
    /// Wrap `inner`, dispatching events to `sink`.
    pub fn new(inner: S, sink: Arc<dyn Sink>) -> Self {
        Self { inner, sink }
    }
}

impl<S: BreakGlassStore> BreakGlassStore for NotifyingBreakGlassStore<S> {
    fn create(&self, event: BreakGlassEvent) -> Result<(), StoreError> {
        let subject =
            BreakGlassSubject { id: event.id.clone(), invoker: event.invoker.clone(), profile: event.profile.clone() };
        let actor = event.invoker.clone();
        self.inner.create(event)?;
        dispatch(self.sink.clone(), Event::for_break_glass(EventType::BreakGlassInvoked, subject, actor));
        Ok(())
    }

    fn get(&self, id: &str) -> Result<Option<BreakGlassEvent>, StoreError> {
        self.inner.get(id)
    }

    fn update(&self, event: BreakGlassEvent) -> Result<(), StoreError> {
        let prior_status = self.inner.get(&event.id).ok().flatten().map(|e| e.status);
        let transition = prior_status.and_then(|prior| break_glass_event_for_transition(prior, &event));
        let subject =
            BreakGlassSubject { id: event.id.clone(), invoker: event.invoker.clone(), profile: event.profile.clone() };
        self.inner.update(event)?;
        if let Some((event_type, actor)) = transition {
            dispatch(self.sink.clone(), Event::for_break_glass(event_type, subject, actor));
        }
        Ok(())
    }

    fn delete(&self, id: &str) -> Result<(), StoreError> {
        self.inner.delete(id)
    }

    fn list_by_invoker(&self, user: &str, limit: usize) -> Result<Vec<BreakGlassEvent>, StoreError> {
        self.inner.list_by_invoker(user, limit)
    }

    fn list_by_status(&self, status: BreakGlassStatus, limit: usize) -> Result<Vec<BreakGlassEvent>, StoreError> {
        self.inner.list_by_status(status, limit)
    }

    fn list_by_profile(&self, profile: &str, limit: usize) -> Result<Vec<BreakGlassEvent>, StoreError> {
        self.inner.list_by_profile(profile, limit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sink::SinkError;
    use async_trait::async_trait;
    use chrono::{Duration, Utc};
    use sentinel_gating::{InMemoryBreakGlassStore, InMemoryRequestStore};
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct RecordingSink {
        seen: std::sync::Mutex<Vec<String>>,
        done: Arc<tokio::sync::Notify>,
        remaining: AtomicUsize,
    }

    #[async_trait]
    impl Sink for RecordingSink {
        async fn publish(&self, event: &Event) -> Result<(), SinkError> {
            self.seen.lock().unwrap().push(event.event_type.clone());
            if self.remaining.fetch_sub(1, Ordering::SeqCst) == 1 {
                self.done.notify_one();
            }
            Ok(())
        }
    }

    fn expect_events(count: usize) -> (Arc<RecordingSink>, Arc<tokio::sync::Notify>) {
        let done = Arc::new(tokio::sync::Notify::new());
        let sink = Arc::new(RecordingSink {
            seen: std::sync::Mutex::new(Vec::new()),
            done: done.clone(),
            remaining: AtomicUsize::new(count),
        });
        (sink, done)
    }

    #[tokio::test]
    async fn create_fires_request_created() {
        let (sink, done) = expect_events(1);
        let store = NotifyingRequestStore::new(InMemoryRequestStore::new(), sink.clone() as Arc<dyn Sink>);
        store
            .create(ApprovedRequest {
                id: "r1".into(),
                user: "alice".into(),
                profile: "prod".into(),
                approver: None,
                status: RequestStatus::Pending,
                created_at: Utc::now(),
                duration: Duration::hours(1),
                expires_at: Utc::now() + Duration::hours(24),
            })
            .unwrap();
        done.notified().await;
        assert_eq!(sink.seen.lock().unwrap().as_slice(), ["request.created"]);
    }

    #[tokio::test]
    async fn pending_to_approved_fires_request_approved_with_approver_actor() {
        let (sink, done) = expect_events(2);
        let store = NotifyingRequestStore::new(InMemoryRequestStore::new(), sink.clone() as Arc<dyn Sink>);
        let mut req = ApprovedRequest {
            id: "r1".into(),
            user: "alice".into(),
            profile: "prod".into(),
            approver: None,
            status: RequestStatus::Pending,
            created_at: Utc::now(),
            duration: Duration::hours(1),
            expires_at: Utc::now() + Duration::hours(24),
        };
        store.create(req.clone()).unwrap();
        req.status = RequestStatus::Approved;
        req.approver = Some("bob".into());
        store.update(req).unwrap();
        done.notified().await;
        assert_eq!(sink.seen.lock().unwrap().as_slice(), ["request.created", "request.approved"]);
    }

    #[tokio::test]
    async fn approved_to_expired_does_not_refire_since_prior_is_not_pending() {
        let (sink, done) = expect_events(2);
        let store = NotifyingRequestStore::new(InMemoryRequestStore::new(), sink.clone() as Arc<dyn Sink>);
        let mut req = ApprovedRequest {
            id: "r1".into(),
            user: "alice".into(),
            profile: "prod".into(),
            approver: Some("bob".into()),
            status: RequestStatus::Pending,
            created_at: Utc::now(),
            duration: Duration::hours(1),
            expires_at: Utc::now() + Duration::hours(24),
        };
        store.create(req.clone()).unwrap();
        req.status = RequestStatus::Approved;
        store.update(req.clone()).unwrap();
        done.notified().await;

        // A further mutation from a non-pending prior status fires nothing;
        // confirm the sink count never climbs past the two events awaited.
        req.status = RequestStatus::Expired;
        store.update(req).unwrap();
        assert_eq!(sink.seen.lock().unwrap().as_slice(), ["request.created", "request.approved"]);
    }

    #[tokio::test]
    async fn break_glass_create_fires_invoked() {
        let (sink, done) = expect_events(1);
        let store = NotifyingBreakGlassStore::new(InMemoryBreakGlassStore::new(), sink.clone() as Arc<dyn Sink>);
        store
            .create(BreakGlassEvent {
                id: "b1".into(),
                invoker: "alice".into(),
                profile: "prod".into(),
                status: BreakGlassStatus::Active,
                invoked_at: Utc::now(),
                expires_at: Utc::now() + Duration::hours(1),
                notified: false,
            })
            .unwrap();
        done.notified().await;
        assert_eq!(sink.seen.lock().unwrap().as_slice(), ["breakglass.invoked"]);
    }
}
