//! Non-fatal findings collected while the pipeline runs.
//!
//! Stages recover locally from well-defined degenerate input (a path that
//! collapses to nothing, a coordinate that needed clamping) and record what
//! they did here instead of failing. Every entry is also logged at `warn`.

use std::fmt;

use crate::error::Stage;

#[derive(Debug, Clone, PartialEq)]
pub struct Diagnostic {
    pub stage: Stage,
    /// Offending path index, when the finding concerns one path
    pub index: Option<usize>,
    pub message: String,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.index {
            Some(i) => write!(f, "{} (path {}): {}", self.stage, i, self.message),
            None => write!(f, "{}: {}", self.stage, self.message),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Diagnostics {
    entries: Vec<Diagnostic>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, stage: Stage, index: Option<usize>, message: impl Into<String>) {
        let diagnostic = Diagnostic {
            stage,
            index,
            message: message.into(),
        };
        tracing::warn!("{}", diagnostic);
        self.entries.push(diagnostic);
    }

    pub fn extend(&mut self, other: Diagnostics) {
        self.entries.extend(other.entries);
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Diagnostic> {
        self.entries.iter()
    }

    /// Entries raised by one stage.
    pub fn from_stage(&self, stage: Stage) -> impl Iterator<Item = &Diagnostic> {
        self.entries.iter().filter(move |d| d.stage == stage)
    }
}
