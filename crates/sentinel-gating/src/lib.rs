//! Final authorization gating, composing a policy decision with
//! approved-request and break-glass overrides (spec §3.8, §4.9-§4.11).
#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod gate;
pub mod queries;
pub mod store;

pub use gate::{gate, BreakGlassNotifier, GateError, GateOutcome, GateSource};
pub use queries::{find_active_break_glass, find_approved_request};
pub use store::{
    ApprovedRequest, BreakGlassEvent, BreakGlassStatus, BreakGlassStore, InMemoryBreakGlassStore, InMemoryRequestStore,
    RequestStatus, RequestStore, StoreError,
};
