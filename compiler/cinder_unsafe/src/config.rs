//! Engine configuration.

use cinder_diagnostic::DiagnosticConfig;
use cinder_types::DEFAULT_MAX_TYPE_DEPTH;

/// Options fixed for a whole compilation.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub struct CompilationOptions {
    /// Permit `unsafe` modifiers and blocks. When off, each one is reported
    /// and binding continues as if it were allowed.
    pub allow_unsafe: bool,
}

impl Default for CompilationOptions {
    fn default() -> Self {
        CompilationOptions { allow_unsafe: true }
    }
}

/// Tuning knobs for one [`PointerContext`](crate::PointerContext).
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct EngineConfig {
    /// Type nesting depth at which tracked-kind classification gives up
    /// and answers "tracked".
    pub max_type_depth: u32,
    pub diagnostics: DiagnosticConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            max_type_depth: DEFAULT_MAX_TYPE_DEPTH,
            diagnostics: DiagnosticConfig::default(),
        }
    }
}

impl EngineConfig {
    /// Report everything, no deduplication (for testing).
    pub fn unlimited() -> Self {
        EngineConfig {
            diagnostics: DiagnosticConfig::unlimited(),
            ..EngineConfig::default()
        }
    }
}
