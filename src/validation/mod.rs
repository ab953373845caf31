//! Validation
//!
//! Diagnostics, the recorder they land in, and the attribute validator that
//! produces them.

pub mod diagnostics;
pub mod validator;

pub use diagnostics::{Diagnostic, DiagnosticRecorder, Severity};
pub use validator::AttributeValidator;
