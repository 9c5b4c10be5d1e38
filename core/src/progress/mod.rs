//! Per-kind progress heuristics.
//!
//! The wrapped tools expose no structured progress channel, so each task kind
//! gets its own line parser behind one trait. A change in one tool's text
//! format stays a local edit.
//!
//! All percentages produced here are best-effort estimates. Live parsing is
//! capped below 100: the value 100 belongs exclusively to the supervisor's
//! confirmed-success path.

mod marker;
mod percent;
mod transcript;

pub use marker::MarkerParser;
pub use percent::PercentParser;
pub use transcript::{extraction_percentage, TranscriptParser};

/// Normalized result of one recognized output line.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProgressUpdate {
    /// New percentage, present only when the heuristic raised it.
    pub percentage: Option<u8>,
    /// Sub-phase label.
    pub stage: Option<String>,
    /// Derived rate estimate, e.g. "12 KB/s" or "1.4%/s".
    pub rate: Option<String>,
    /// Payload text extracted from the line (transcript segments). Emitted
    /// even when the percentage did not move, so no segment is ever lost.
    pub text: Option<String>,
}

/// Stateful, per-task line matcher. One instance per in-flight task;
/// monotonicity guards live inside the parser state.
pub trait ProgressParser: Send {
    /// Returns `None` for lines the heuristic does not recognize.
    fn consume_line(&mut self, line: &str) -> Option<ProgressUpdate>;
}
