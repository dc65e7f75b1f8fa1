//! Notification outflow (C12): event envelopes, pluggable sinks, the
//! store decorators that fire them, and the decision audit log (spec
//! §4.11, §6.5-§6.6).
#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod decision_log;
pub mod event;
pub mod sink;
pub mod wrapping;

pub use decision_log::{DecisionLogError, DecisionLogWriter, DecisionRecord};
pub use event::{BreakGlassSubject, Event, EventType, RequestSubject, SYSTEM_ACTOR};
pub use sink::{FanOutSink, NoopSink, QueuePublisher, QueueSink, Sink, SinkError, WebhookSink};
pub use wrapping::{NotifyingBreakGlassStore, NotifyingRequestStore};
