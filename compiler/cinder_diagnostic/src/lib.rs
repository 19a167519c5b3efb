//! Structured diagnostics.
//!
//! Analysis phases never format prose. They produce a [`Diagnostic`] made of
//! an [`ErrorCode`], a [`Severity`], labelled spans, and typed
//! [`DiagnosticArg`]s; rendering and localization happen downstream.
//!
//! # Error Guarantees
//!
//! [`ErrorGuaranteed`] is only handed out by a [`DiagnosticSink`] after it
//! accepted an error, so a function returning one proves it reported
//! something.
//!
//! ```text
//! let guarantee = sink.emit(Diagnostic::error(ErrorCode::E7008).with_label(span));
//! return Err(guarantee);
//! ```

mod diagnostic;
mod error_code;
mod guarantee;
pub mod queue;

pub use diagnostic::{Diagnostic, DiagnosticArg, Label, Severity};
pub use error_code::ErrorCode;
pub use guarantee::ErrorGuaranteed;
pub use queue::{DiagnosticConfig, DiagnosticQueue};

/// Anything that accepts diagnostics.
pub trait DiagnosticSink {
    /// Record `diag`. Returns a guarantee when `diag` is an error.
    fn emit(&mut self, diag: Diagnostic) -> Option<ErrorGuaranteed>;
}

impl DiagnosticSink for Vec<Diagnostic> {
    fn emit(&mut self, diag: Diagnostic) -> Option<ErrorGuaranteed> {
        let is_error = diag.is_error();
        self.push(diag);
        is_error.then(ErrorGuaranteed::new)
    }
}
