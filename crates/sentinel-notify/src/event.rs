//! Event envelope fired on request and break-glass lifecycle transitions
//! (spec §4.11, §6.5).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The literal wire string for "system"-attributed events (expirations).
pub const SYSTEM_ACTOR: &str = "system";

/// The lifecycle transitions that fire an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventType {
    /// A new request was created.
    RequestCreated,
    /// A request was approved.
    RequestApproved,
    /// A request was denied.
    RequestDenied,
    /// A request was cancelled by its requester.
    RequestCancelled,
    /// A pending request timed out.
    RequestExpired,
    /// A break-glass event was invoked.
    BreakGlassInvoked,
    /// A break-glass event was closed.
    BreakGlassClosed,
    /// A break-glass event expired.
    BreakGlassExpired,
}

impl EventType {
    /// The dotted wire string (`"request.created"`, `"breakglass.invoked"`, …).
    #[must_use]
    pub fn as_wire_str(self) -> &'static str {
        match self {
            Self::RequestCreated => "request.created",
            Self::RequestApproved => "request.approved",
            Self::RequestDenied => "request.denied",
            Self::RequestCancelled => "request.cancelled",
            Self::RequestExpired => "request.expired",
            Self::BreakGlassInvoked => "breakglass.invoked",
            Self::BreakGlassClosed => "breakglass.closed",
            Self::BreakGlassExpired => "breakglass.expired",
        }
    }
}

/// Minimal, stable-shaped summary of the request that triggered an event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestSubject {
    /// Request id.
    pub id: String,
    /// Requesting principal.
    pub user: String,
    /// Target profile.
    pub profile: String,
}

/// Minimal, stable-shaped summary of the break-glass event that triggered
/// an event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BreakGlassSubject {
    /// Event id.
    pub id: String,
    /// Invoking principal.
    pub invoker: String,
    /// Target profile.
    pub profile: String,
}

/// The serialized event envelope (spec §6.5). Exactly one of `request` /
/// `break_glass` is present, matching which store fired the event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    /// Dotted event type string.
    #[serde(rename = "Type")]
    pub event_type: String,
    /// Present for request-store-originated events.
    #[serde(rename = "Request", skip_serializing_if = "Option::is_none", default)]
    pub request: Option<RequestSubject>,
    /// Present for break-glass-store-originated events.
    #[serde(rename = "BreakGlass", skip_serializing_if = "Option::is_none", default)]
    pub break_glass: Option<BreakGlassSubject>,
    /// RFC-3339 timestamp with nanosecond precision.
    #[serde(rename = "Timestamp")]
    pub timestamp: DateTime<Utc>,
    /// The principal attributed to this transition (`requester`,
    /// `approver`, or the literal `"system"`).
    #[serde(rename = "Actor")]
    pub actor: String,
}

impl Event {
    /// Build a request-store event.
    #[must_use]
    pub fn for_request(event_type: EventType, subject: RequestSubject, actor: impl Into<String>) -> Self {
        Self {
            event_type: event_type.as_wire_str().to_string(),
            request: Some(subject),
            break_glass: None,
            timestamp: Utc::now(),
            actor: actor.into(),
        }
    }

    /// Build a break-glass-store event.
    #[must_use]
    pub fn for_break_glass(event_type: EventType, subject: BreakGlassSubject, actor: impl Into<String>) -> Self {
        Self {
            event_type: event_type.as_wire_str().to_string(),
            request: None,
            break_glass: Some(subject),
            timestamp: Utc::now(),
            actor: actor.into(),
        }
    }
}
