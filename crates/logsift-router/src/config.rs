//! Engine configuration
//!
//! One YAML document carries everything the router needs: the rule set,
//! the source policies, the confidence threshold, the generative call
//! budget, and the worker-pool width. All of it is data; none of it is
//! hardcoded.

use std::collections::BTreeSet;

use logsift_classifiers::{EmbeddingSpec, GenerativeSpec, RuleSpec};
use logsift_core::{Error, Result};
use logsift_policy::PolicyConfig;
use serde::{Deserialize, Serialize};

/// Top-level engine configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RouterConfig {
    /// Ordered pattern rules, first match wins
    #[serde(default)]
    pub rules: Vec<RuleSpec>,

    /// Source-to-strategy policies
    #[serde(default)]
    pub policies: PolicyConfig,

    /// Minimum embedding confidence the router accepts before escalating
    /// (default 0.5)
    #[serde(default = "default_confidence_threshold")]
    pub confidence_threshold: f32,

    /// Embedding strategy configuration
    #[serde(default)]
    pub embedding: EmbeddingSpec,

    /// Generative strategy configuration
    #[serde(default)]
    pub generative: GenerativeSpec,

    /// Worker-pool width for batch classification. Bounded to respect the
    /// generative backend's rate limits; defaults to the core count capped
    /// at 8.
    #[serde(default = "default_max_concurrency")]
    pub max_concurrency: usize,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            rules: Vec::new(),
            policies: PolicyConfig::default(),
            confidence_threshold: default_confidence_threshold(),
            embedding: EmbeddingSpec::default(),
            generative: GenerativeSpec::default(),
            max_concurrency: default_max_concurrency(),
        }
    }
}

impl RouterConfig {
    /// Parse from a YAML string
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let config: Self = serde_yaml::from_str(yaml)
            .map_err(|e| Error::config(format!("invalid engine config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Load from a file
    pub fn from_file(path: impl AsRef<std::path::Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(|e| {
            Error::config(format!(
                "cannot read engine config {}: {e}",
                path.as_ref().display()
            ))
        })?;
        Self::from_yaml(&content)
    }

    /// Load-time validation; the router assumes a validated config
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.confidence_threshold) {
            return Err(Error::config(format!(
                "confidence_threshold must be in [0,1], got {}",
                self.confidence_threshold
            )));
        }
        if self.max_concurrency == 0 {
            return Err(Error::config("max_concurrency must be at least 1"));
        }
        self.policies.validate()
    }

    /// Every label this configuration can produce, used as the generative
    /// candidate set when the generative section does not name its own
    pub fn candidate_labels(&self) -> Vec<String> {
        let mut labels = BTreeSet::new();
        for rule in &self.rules {
            labels.insert(rule.label.clone());
        }
        for label in self.embedding.classes.keys() {
            labels.insert(label.clone());
        }
        for label in &self.generative.labels {
            labels.insert(label.clone());
        }
        labels.into_iter().collect()
    }
}

/// Default embedding-confidence gate
fn default_confidence_threshold() -> f32 {
    0.5
}

/// Default worker-pool width: core count, capped so a wide machine does not
/// hammer the generative backend
fn default_max_concurrency() -> usize {
    num_cpus::get().clamp(1, 8)
}
