//! Shared primitives for the Sentinel policy authority.
//!
//! Every other `sentinel-*` crate depends on this one for the pieces that
//! are common to policy evaluation, approval routing, and gating: time
//! windows, device posture, and the `Request` a caller presents for
//! authorization. None of these types carry business logic beyond matching
//! an input against a condition — the rule-precedence and decision-shape
//! logic lives in `sentinel-policy`.

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod device;
pub mod ids;
pub mod request;
pub mod time_window;
pub mod weekday;

pub use device::{DeviceCondition, DevicePosture, OsType};
pub use request::Request;
pub use time_window::{HourRange, TimeWindow, TimeWindowError};
pub use weekday::Weekday;
