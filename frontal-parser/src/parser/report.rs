use serde::Serialize;

use super::error::SyntaxError;
use crate::grammar::ProductionId;

/// State of the driver at one step, recorded before the step is applied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Snapshot {
    /// 1-based step number.
    pub step: usize,
    /// Stack from bottom to top, starting with the end marker.
    pub stack: Vec<String>,
    /// Tags of the remaining tokens, ending with the end marker.
    pub input: Vec<String>,
    /// Production expanded at this step.
    pub production: Option<ProductionId>,
    pub derivation: String,
    pub error: Option<SyntaxError>,
}

impl Snapshot {
    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }
}

impl std::fmt::Display for Snapshot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{:>4} | {} | {} | {}",
            self.step,
            self.stack.join(" "),
            self.input.join(" "),
            self.derivation
        )
    }
}

/// Outcome of one parse run.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct ParseReport {
    /// Whether the input was derived without any syntax error.
    pub accepted: bool,
    /// Every step in order.
    pub snapshots: Vec<Snapshot>,
}

impl ParseReport {
    /// Steps that produced a syntax error, in order.
    pub fn error_snapshots(&self) -> impl Iterator<Item = &Snapshot> {
        self.snapshots.iter().filter(|s| s.is_error())
    }

    pub fn errors(&self) -> impl Iterator<Item = &SyntaxError> {
        self.snapshots.iter().filter_map(|s| s.error.as_ref())
    }
}
