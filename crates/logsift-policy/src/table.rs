//! Policy lookup table
//!
//! Read-only runtime form of [`PolicyConfig`]: one lookup per entry, the
//! default policy for anything unrecognized, never a failure.

use std::collections::HashMap;

use tracing::debug;

use crate::config::{PolicyConfig, StrategyChoice};

/// Resolves a source identifier to its ordered strategy list
pub struct PolicyTable {
    default: Vec<StrategyChoice>,
    sources: HashMap<String, Vec<StrategyChoice>>,
}

impl PolicyTable {
    /// Build from a validated config
    pub fn new(config: PolicyConfig) -> Self {
        Self {
            default: config.default,
            sources: config.sources,
        }
    }

    /// The policy for `source`. Unknown sources resolve to the default
    /// policy; a batch must never fail because a new producer showed up.
    pub fn resolve(&self, source: &str) -> &[StrategyChoice] {
        match self.sources.get(source) {
            Some(policy) => policy,
            None => {
                debug!(source, "no explicit policy, using default");
                &self.default
            }
        }
    }

    /// Sources with an explicit policy entry
    pub fn known_sources(&self) -> impl Iterator<Item = &str> {
        self.sources.keys().map(String::as_str)
    }

    /// Whether any policy (default included) permits `strategy`
    pub fn permits_anywhere(&self, strategy: StrategyChoice) -> bool {
        self.default.contains(&strategy)
            || self.sources.values().any(|policy| policy.contains(&strategy))
    }
}
