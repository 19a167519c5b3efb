//! Diagnostic queue: limits, deduplication, and position ordering.

use cinder_ir::Span;
use rustc_hash::FxHashSet;

use crate::{Diagnostic, DiagnosticArg, DiagnosticSink, ErrorCode, ErrorGuaranteed};

/// Configuration for diagnostic processing.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct DiagnosticConfig {
    /// Maximum number of errors before the rest are dropped (0 = unlimited).
    pub error_limit: usize,
    /// Drop a diagnostic identical to one already queued.
    pub deduplicate: bool,
}

impl Default for DiagnosticConfig {
    fn default() -> Self {
        DiagnosticConfig {
            error_limit: 100,
            deduplicate: true,
        }
    }
}

impl DiagnosticConfig {
    /// No limit, no deduplication (for testing).
    pub fn unlimited() -> Self {
        DiagnosticConfig {
            error_limit: 0,
            deduplicate: false,
        }
    }
}

/// Collects diagnostics for one bind request.
///
/// ```text
/// let mut queue = DiagnosticQueue::with_config(config);
/// queue.emit(diagnostic);
/// let sorted = queue.flush();
/// ```
#[derive(Clone, Debug, Default)]
pub struct DiagnosticQueue {
    diagnostics: Vec<Diagnostic>,
    seen: FxHashSet<Diagnostic>,
    error_count: usize,
    /// Set once the limit note has been queued.
    truncated: bool,
    config: DiagnosticConfig,
}

impl DiagnosticQueue {
    pub fn new() -> Self {
        Self::with_config(DiagnosticConfig::default())
    }

    pub fn with_config(config: DiagnosticConfig) -> Self {
        DiagnosticQueue {
            config,
            ..DiagnosticQueue::default()
        }
    }

    /// Add a diagnostic. Returns `false` if it was filtered.
    pub fn add(&mut self, diag: Diagnostic) -> bool {
        let is_error = diag.is_error();

        if is_error && self.limit_reached() {
            if !self.truncated {
                self.truncated = true;
                let span = diag.primary_span().unwrap_or(Span::DUMMY);
                self.diagnostics
                    .push(too_many_errors(self.config.error_limit, span));
            }
            return false;
        }

        if self.config.deduplicate && !self.seen.insert(diag.clone()) {
            return false;
        }

        if is_error {
            self.error_count += 1;
        }
        self.diagnostics.push(diag);
        true
    }

    pub fn limit_reached(&self) -> bool {
        self.config.error_limit > 0 && self.error_count >= self.config.error_limit
    }

    pub fn error_count(&self) -> usize {
        self.error_count
    }

    pub fn has_errors(&self) -> Option<ErrorGuaranteed> {
        ErrorGuaranteed::from_error_count(self.error_count)
    }

    /// Diagnostics ordered by primary span start, emission order kept for
    /// ties. Clears the queue.
    pub fn flush(&mut self) -> Vec<Diagnostic> {
        let mut result = std::mem::take(&mut self.diagnostics);
        result.sort_by_key(Diagnostic::position);
        self.seen.clear();
        self.error_count = 0;
        self.truncated = false;
        result
    }

    pub fn peek(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics.iter()
    }
}

impl DiagnosticSink for DiagnosticQueue {
    fn emit(&mut self, diag: Diagnostic) -> Option<ErrorGuaranteed> {
        let is_error = diag.is_error();
        self.add(diag);
        // A filtered duplicate still means the error is on record.
        is_error.then(ErrorGuaranteed::new)
    }
}

#[cold]
fn too_many_errors(limit: usize, span: Span) -> Diagnostic {
    Diagnostic::warning(ErrorCode::E9002)
        .with_label(span)
        .with_arg(DiagnosticArg::Int(i64::try_from(limit).unwrap_or(i64::MAX)))
}
