//! Policy configuration
//!
//! Maps each source system to the ordered list of strategies it may use.
//! Replaces conditional branching keyed on source strings with data the
//! operator can swap without code changes.

use std::collections::HashMap;

use logsift_core::{Error, Result};
use serde::{Deserialize, Serialize};

/// A strategy a policy may permit, in escalation order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StrategyChoice {
    /// Deterministic regex rules
    Pattern,
    /// Learned embedding classifier
    Embedding,
    /// Generative external fallback
    Generative,
}

impl StrategyChoice {
    /// Stable lowercase name matching the config syntax
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pattern => "pattern",
            Self::Embedding => "embedding",
            Self::Generative => "generative",
        }
    }
}

impl std::fmt::Display for StrategyChoice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Source-to-policy mapping as it appears in the config file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PolicyConfig {
    /// Policy applied to sources with no explicit entry. Every source seen
    /// at runtime resolves to exactly one policy, so this must be non-empty.
    #[serde(default = "default_policy")]
    pub default: Vec<StrategyChoice>,

    /// Per-source overrides (e.g. a legacy source pinned to generative-only)
    #[serde(default)]
    pub sources: HashMap<String, Vec<StrategyChoice>>,
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            default: default_policy(),
            sources: HashMap::new(),
        }
    }
}

impl PolicyConfig {
    /// Parse from a YAML string
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let config: Self = serde_yaml::from_str(yaml)
            .map_err(|e| Error::config(format!("invalid policy config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Load from a file
    pub fn from_file(path: impl AsRef<std::path::Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(|e| {
            Error::config(format!(
                "cannot read policy config {}: {e}",
                path.as_ref().display()
            ))
        })?;
        Self::from_yaml(&content)
    }

    /// Reject shapes that would leave a source without a usable policy.
    /// Runs at load time; the router assumes a validated config.
    pub fn validate(&self) -> Result<()> {
        validate_policy("default", &self.default)?;
        for (source, policy) in &self.sources {
            validate_policy(source, policy)?;
        }
        Ok(())
    }
}

fn validate_policy(name: &str, policy: &[StrategyChoice]) -> Result<()> {
    if policy.is_empty() {
        return Err(Error::config(format!(
            "policy for '{name}' permits no strategies"
        )));
    }

    for (idx, strategy) in policy.iter().enumerate() {
        if policy[..idx].contains(strategy) {
            return Err(Error::config(format!(
                "policy for '{name}' lists '{strategy}' more than once"
            )));
        }
    }

    Ok(())
}

/// Default for unknown sources: every strategy, cheapest first
fn default_policy() -> Vec<StrategyChoice> {
    vec![
        StrategyChoice::Pattern,
        StrategyChoice::Embedding,
        StrategyChoice::Generative,
    ]
}
