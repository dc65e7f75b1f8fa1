//! The ephemeral input to policy evaluation (spec §3.6).

use crate::device::DevicePosture;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A credential request presented for authorization.
///
/// `server_mode` and `session_established` are the caller's actual
/// operational state; the evaluator consults them when a matched rule's
/// effect is `require_server` / `require_server_session` but never lets
/// them bypass evaluation — they are inputs, not an escape hatch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Request {
    /// Requesting principal.
    pub user: String,
    /// Target profile identifier.
    pub profile: String,
    /// Request timestamp (UTC).
    pub time: DateTime<Utc>,
    /// Session table name the caller is bound to, if operating in
    /// server-session mode already.
    #[serde(default)]
    pub session_table_name: Option<String>,
    /// Device posture presented alongside the request, if any.
    #[serde(default)]
    pub device_posture: Option<DevicePosture>,
    /// Whether the caller is already running in server mode.
    #[serde(default)]
    pub server_mode: bool,
    /// Whether the caller already has a tracked server session.
    #[serde(default)]
    pub session_established: bool,
}

impl Request {
    /// Construct a minimal request at the given instant; server-mode/session
    /// flags default to `false` and posture/session-table default to
    /// unset, matching the common case in tests.
    #[must_use]
    pub fn new(user: impl Into<String>, profile: impl Into<String>, time: DateTime<Utc>) -> Self {
        Self {
            user: user.into(),
            profile: profile.into(),
            time,
            session_table_name: None,
            device_posture: None,
            server_mode: false,
            session_established: false,
        }
    }
}
