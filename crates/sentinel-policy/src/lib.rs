//! Policy schema, validation, first-match evaluation, and structural
//! linting for the Sentinel policy authority (spec §3-§4).
#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod decision;
pub mod evaluator;
pub mod linter;
pub mod schema;
pub mod validator;

pub use decision::Decision;
pub use evaluator::evaluate;
pub use linter::{lint, LintIssue, LintIssueKind};
pub use schema::{Conditions, Effect, Policy, Rule, SUPPORTED_VERSIONS};
pub use validator::{validate, ValidationError};
