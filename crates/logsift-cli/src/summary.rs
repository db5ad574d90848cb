//! Batch summary rendered after classification
//!
//! The same aggregates the original dashboard showed above its results
//! table: totals, unique sources and labels, the most common label, and a
//! per-strategy breakdown for auditing how much work escalated.

use std::collections::HashMap;
use std::fmt;

use logsift_core::{LabeledEntry, Strategy};

/// Aggregates over a completed batch
pub struct BatchSummary {
    pub total: usize,
    pub unique_sources: usize,
    pub unique_labels: usize,
    pub most_common_label: Option<(String, usize)>,
    pub strategy_counts: Vec<(Strategy, usize)>,
}

impl BatchSummary {
    /// Compute aggregates from the result set
    pub fn from_results(results: &[LabeledEntry]) -> Self {
        let mut sources: HashMap<&str, usize> = HashMap::new();
        let mut labels: HashMap<&str, usize> = HashMap::new();
        let mut strategies: HashMap<Strategy, usize> = HashMap::new();

        for result in results {
            *sources.entry(result.source.as_str()).or_insert(0) += 1;
            *labels.entry(result.label.as_str()).or_insert(0) += 1;
            *strategies.entry(result.strategy).or_insert(0) += 1;
        }

        let most_common_label = labels
            .iter()
            .max_by(|a, b| a.1.cmp(b.1).then_with(|| b.0.cmp(a.0)))
            .map(|(label, count)| (label.to_string(), *count));

        let mut strategy_counts: Vec<(Strategy, usize)> = [
            Strategy::Pattern,
            Strategy::Embedding,
            Strategy::Generative,
            Strategy::Unclassified,
        ]
        .into_iter()
        .filter_map(|s| strategies.get(&s).map(|count| (s, *count)))
        .collect();
        strategy_counts.sort_by(|a, b| b.1.cmp(&a.1));

        Self {
            total: results.len(),
            unique_sources: sources.len(),
            unique_labels: labels.len(),
            most_common_label,
            strategy_counts,
        }
    }
}

impl fmt::Display for BatchSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "classified {} entries", self.total)?;
        writeln!(f, "  unique sources: {}", self.unique_sources)?;
        writeln!(f, "  unique labels:  {}", self.unique_labels)?;
        if let Some((label, count)) = &self.most_common_label {
            writeln!(f, "  most common:    {label} ({count})")?;
        }
        write!(f, "  by strategy:   ")?;
        for (idx, (strategy, count)) in self.strategy_counts.iter().enumerate() {
            if idx > 0 {
                write!(f, ",")?;
            }
            write!(f, " {strategy} {count}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use logsift_core::LogEntry;

    fn labeled(source: &str, label: &str, strategy: Strategy) -> LabeledEntry {
        LabeledEntry::new(&LogEntry::new(source, "msg"), label, strategy, None)
    }

    #[test]
    fn aggregates_counts() {
        let results = vec![
            labeled("ModernCRM", "User Action", Strategy::Pattern),
            labeled("ModernCRM", "User Action", Strategy::Pattern),
            labeled("BillingSystem", "Error", Strategy::Embedding),
            labeled("LegacyCRM", "unclassified", Strategy::Unclassified),
        ];

        let summary = BatchSummary::from_results(&results);
        assert_eq!(summary.total, 4);
        assert_eq!(summary.unique_sources, 3);
        assert_eq!(summary.unique_labels, 3);
        assert_eq!(
            summary.most_common_label,
            Some(("User Action".to_string(), 2))
        );
        assert_eq!(summary.strategy_counts[0], (Strategy::Pattern, 2));
    }

    #[test]
    fn empty_batch_has_no_most_common_label() {
        let summary = BatchSummary::from_results(&[]);
        assert_eq!(summary.total, 0);
        assert!(summary.most_common_label.is_none());
    }

    #[test]
    fn tie_breaks_deterministically() {
        let results = vec![
            labeled("A", "Error", Strategy::Embedding),
            labeled("A", "User Action", Strategy::Pattern),
        ];
        let summary = BatchSummary::from_results(&results);
        // Equal counts resolve by label name so repeated runs agree.
        assert_eq!(summary.most_common_label, Some(("Error".to_string(), 1)));
    }
}
