//! Core types for LogSift

use serde::{Deserialize, Serialize};

/// Sentinel label assigned when no permitted strategy produced a confident
/// result. Never absent from output: every input entry resolves to either a
/// real label or this one.
pub const UNCLASSIFIED: &str = "unclassified";

/// A single log line to classify, as received from ingestion.
///
/// Immutable input unit: created by the caller and never mutated by the
/// engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry {
    /// Identifier of the originating system (e.g. "ModernCRM")
    pub source: String,

    /// Raw free-text log message
    pub message: String,
}

impl LogEntry {
    /// Create a new log entry
    pub fn new(source: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            message: message.into(),
        }
    }
}

/// The strategy that produced a label. Recorded per entry for auditing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Strategy {
    /// Deterministic regex rule matched
    Pattern,
    /// Embedding classifier met the confidence threshold
    Embedding,
    /// Generative fallback returned a candidate label
    Generative,
    /// Every permitted strategy failed or abstained
    Unclassified,
}

impl Strategy {
    /// Stable lowercase name, used in logs and provenance columns
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pattern => "pattern",
            Self::Embedding => "embedding",
            Self::Generative => "generative",
            Self::Unclassified => "unclassified",
        }
    }
}

impl std::fmt::Display for Strategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One classification outcome per input entry, order-preserving.
///
/// Labels are open-world strings rather than a closed enum: new categories
/// appear over time and must flow through without a schema change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabeledEntry {
    /// Originating system, copied from the input
    pub source: String,

    /// Raw message, copied from the input
    pub message: String,

    /// Assigned label; [`UNCLASSIFIED`] when all strategies abstained
    pub label: String,

    /// Which strategy produced the label
    pub strategy: Strategy,

    /// Confidence in [0,1], present only for strategies that score
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f32>,
}

impl LabeledEntry {
    /// Create a labeled entry from its input and outcome
    pub fn new(
        entry: &LogEntry,
        label: impl Into<String>,
        strategy: Strategy,
        confidence: Option<f32>,
    ) -> Self {
        Self {
            source: entry.source.clone(),
            message: entry.message.clone(),
            label: label.into(),
            strategy,
            confidence,
        }
    }

    /// The terminal fallback outcome for an entry
    pub fn unclassified(entry: &LogEntry) -> Self {
        Self::new(entry, UNCLASSIFIED, Strategy::Unclassified, None)
    }

    /// Whether this entry ended up with the sentinel label
    pub fn is_unclassified(&self) -> bool {
        self.strategy == Strategy::Unclassified
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strategy_round_trips_through_serde() {
        let json = serde_json::to_string(&Strategy::Generative).unwrap();
        assert_eq!(json, "\"generative\"");
        let back: Strategy = serde_json::from_str(&json).unwrap();
        assert_eq!(back, Strategy::Generative);
    }

    #[test]
    fn unclassified_entry_uses_sentinel() {
        let entry = LogEntry::new("ModernCRM", "something odd");
        let labeled = LabeledEntry::unclassified(&entry);
        assert_eq!(labeled.label, UNCLASSIFIED);
        assert_eq!(labeled.strategy, Strategy::Unclassified);
        assert!(labeled.confidence.is_none());
        assert!(labeled.is_unclassified());
    }
}
