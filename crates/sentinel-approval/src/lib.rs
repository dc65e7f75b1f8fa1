//! Approver routing and auto-approval predicates over an
//! [`ApprovalPolicy`] (spec §3.5, §4.3).
#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod engine;
pub mod schema;
pub mod validator;

pub use engine::{approvers_for, can_approve, find_rule, should_auto_approve};
pub use schema::{ApprovalPolicy, ApprovalRule, AutoApprove, MAX_DURATION_CEILING_SECS, SUPPORTED_VERSIONS};
pub use validator::{validate, ValidationError};
