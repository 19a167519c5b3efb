//! The [`Diagnostic`] value and its parts.

use std::fmt;

use cinder_ir::{Idx, Span, SymbolId};
use smallvec::SmallVec;

use crate::ErrorCode;

#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum Severity {
    Error,
    Warning,
    Note,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => write!(f, "error"),
            Severity::Warning => write!(f, "warning"),
            Severity::Note => write!(f, "note"),
        }
    }
}

/// A typed message argument. The renderer turns these into text.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum DiagnosticArg {
    Type(Idx),
    /// `T*` for a `T` whose pointer type was never interned.
    PointerTo(Idx),
    Symbol(SymbolId),
    Int(i64),
    /// A fixed token such as an operator symbol or a reason keyword.
    Token(&'static str),
}

/// A highlighted source range.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub struct Label {
    pub span: Span,
    pub is_primary: bool,
}

#[derive(Clone, Eq, PartialEq, Hash, Debug)]
pub struct Diagnostic {
    pub code: ErrorCode,
    pub severity: Severity,
    pub labels: SmallVec<[Label; 2]>,
    pub args: SmallVec<[DiagnosticArg; 3]>,
}

impl Diagnostic {
    pub fn error(code: ErrorCode) -> Self {
        Diagnostic {
            code,
            severity: Severity::Error,
            labels: SmallVec::new(),
            args: SmallVec::new(),
        }
    }

    pub fn warning(code: ErrorCode) -> Self {
        Diagnostic {
            severity: Severity::Warning,
            ..Self::error(code)
        }
    }

    /// Add the primary label.
    #[must_use]
    pub fn with_label(mut self, span: Span) -> Self {
        self.labels.push(Label {
            span,
            is_primary: true,
        });
        self
    }

    /// Add a related location, e.g. where a variable was captured.
    #[must_use]
    pub fn with_secondary(mut self, span: Span) -> Self {
        self.labels.push(Label {
            span,
            is_primary: false,
        });
        self
    }

    #[must_use]
    pub fn with_arg(mut self, arg: DiagnosticArg) -> Self {
        self.args.push(arg);
        self
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }

    pub fn primary_span(&self) -> Option<Span> {
        self.labels.iter().find(|l| l.is_primary).map(|l| l.span)
    }

    /// Start of the primary span, used as the sort key.
    pub(crate) fn position(&self) -> u32 {
        self.primary_span().map_or(0, |span| span.start)
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}[{}]", self.severity, self.code)?;
        if let Some(span) = self.primary_span() {
            write!(f, " at {span}")?;
        }
        Ok(())
    }
}
