//! Content integrity checks.
//!
//! Problems in the corpus are never returned as `Err`. Each one becomes a
//! [`ValidationIssue`] in a [`ValidationReport`], so a single broken file
//! does not hide the rest.

pub mod issue;
pub mod report;
pub mod rules;
pub mod validator;

pub use issue::{IssueCategory, Severity, ValidationIssue};
pub use report::ValidationReport;
pub use validator::{ValidationSettings, Validator};
