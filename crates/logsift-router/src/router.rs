//! Classification router
//!
//! Drives each entry through the strategy sequence its source's policy
//! permits: rules first wherever the policy includes them, then the
//! embedding classifier gated by the confidence threshold, then the
//! generative fallback. Every entry terminates with exactly one label;
//! the sentinel label is the terminal state when everything permitted
//! has failed or abstained.

use std::time::Instant;

use logsift_classifiers::{EmbeddingClassifier, GenerativeClassifier, RuleMatcher};
use logsift_core::{LabeledEntry, LogEntry, Result, Strategy, UNCLASSIFIED};
use logsift_policy::{PolicyTable, StrategyChoice};
use tracing::{debug, warn};

use crate::config::RouterConfig;

/// The orchestrator: owns the strategies, the policy table, and the
/// escalation thresholds. Cheap to share behind an `Arc` for batch work.
pub struct Router {
    rules: RuleMatcher,
    embedding: Option<EmbeddingClassifier>,
    generative: Option<GenerativeClassifier>,
    policies: PolicyTable,
    confidence_threshold: f32,
    max_concurrency: usize,
}

impl Router {
    /// Assemble a router from already-built parts (the seam tests and
    /// embedders use to inject mock strategies)
    pub fn new(
        rules: RuleMatcher,
        embedding: Option<EmbeddingClassifier>,
        generative: Option<GenerativeClassifier>,
        policies: PolicyTable,
        confidence_threshold: f32,
        max_concurrency: usize,
    ) -> Self {
        Self {
            rules,
            embedding,
            generative,
            policies,
            confidence_threshold,
            max_concurrency: max_concurrency.max(1),
        }
    }

    /// Build everything from a validated configuration.
    ///
    /// A policy may permit a strategy that has no configuration (e.g. a
    /// generative section with no endpoint). That is not a load error:
    /// the strategy counts as unavailable at runtime and the router falls
    /// through. It is still worth a warning at startup.
    pub fn from_config(config: RouterConfig) -> Result<Self> {
        config.validate()?;

        let rules = RuleMatcher::new(&config.rules)?;

        let embedding = if config.embedding.is_configured() {
            Some(config.embedding.build()?)
        } else {
            None
        };

        let candidates = config.candidate_labels();
        let generative = config.generative.build(&candidates)?;

        let policies = PolicyTable::new(config.policies);

        if embedding.is_none() && policies.permits_anywhere(StrategyChoice::Embedding) {
            warn!("a policy permits the embedding strategy but no classes or artifact are configured");
        }
        if generative.is_none() && policies.permits_anywhere(StrategyChoice::Generative) {
            warn!("a policy permits the generative strategy but no endpoint is configured");
        }

        Ok(Self::new(
            rules,
            embedding,
            generative,
            policies,
            config.confidence_threshold,
            config.max_concurrency,
        ))
    }

    /// Worker-pool width for batch classification
    pub fn max_concurrency(&self) -> usize {
        self.max_concurrency
    }

    /// Classify one entry. Never returns an error: a strategy failure
    /// degrades to the next permitted strategy and finally to the sentinel
    /// label, so no single entry can abort a batch.
    pub async fn classify_entry(&self, entry: &LogEntry) -> LabeledEntry {
        let start = Instant::now();

        // An entry with no message text cannot be classified by anything;
        // mark it and keep the batch moving.
        if entry.message.trim().is_empty() {
            warn!(source = %entry.source, "entry has no message text, marking unclassified");
            return LabeledEntry::unclassified(entry);
        }

        let policy = self.policies.resolve(&entry.source);

        // Rules run first whenever the policy includes them, wherever they
        // appear in the list: a matching rule is authoritative and cheaper
        // than anything it could be reordered behind.
        if policy.contains(&StrategyChoice::Pattern) {
            if let Some(label) = self.rules.first_match(&entry.message) {
                debug!(
                    source = %entry.source,
                    label,
                    elapsed_us = start.elapsed().as_micros() as u64,
                    "rule matched"
                );
                // Rule matches are binary.
                return LabeledEntry::new(entry, label, Strategy::Pattern, Some(1.0));
            }
        }

        for strategy in policy {
            match strategy {
                StrategyChoice::Pattern => {} // attempted above

                StrategyChoice::Embedding => {
                    let Some(classifier) = &self.embedding else {
                        debug!(source = %entry.source, "embedding permitted but not configured");
                        continue;
                    };

                    let scored = classifier.classify(&entry.message);
                    if scored.label != UNCLASSIFIED
                        && scored.meets_threshold(self.confidence_threshold)
                    {
                        debug!(
                            source = %entry.source,
                            label = %scored.label,
                            confidence = scored.confidence,
                            "embedding accepted"
                        );
                        return LabeledEntry::new(
                            entry,
                            scored.label,
                            Strategy::Embedding,
                            Some(scored.confidence),
                        );
                    }
                    debug!(
                        source = %entry.source,
                        confidence = scored.confidence,
                        threshold = self.confidence_threshold,
                        "embedding below threshold, escalating"
                    );
                }

                StrategyChoice::Generative => {
                    let Some(classifier) = &self.generative else {
                        debug!(source = %entry.source, "generative permitted but not configured");
                        continue;
                    };

                    match classifier.classify(&entry.source, &entry.message).await {
                        Ok(Some(label)) => {
                            debug!(
                                source = %entry.source,
                                label,
                                elapsed_us = start.elapsed().as_micros() as u64,
                                "generative labeled"
                            );
                            return LabeledEntry::new(entry, label, Strategy::Generative, None);
                        }
                        Ok(None) => {
                            debug!(source = %entry.source, "generative abstained");
                        }
                        Err(e) => {
                            warn!(source = %entry.source, error = %e, "generative strategy unavailable");
                        }
                    }
                }
            }
        }

        LabeledEntry::unclassified(entry)
    }
}
