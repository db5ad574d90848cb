//! Pattern rule matcher, the cheapest strategy
//!
//! Evaluates a message against an ordered set of regex rules; the first rule
//! whose pattern matches wins. Source-agnostic and side-effect free.

use logsift_core::{Error, Result};
use regex::RegexBuilder;
use serde::{Deserialize, Serialize};

// The regex crate guarantees linear-time matching (no backtracking), so the
// only pathological-input risk left is compiled-program size. These limits
// turn an oversized pattern into a load-time configuration error.
const REGEX_SIZE_LIMIT: usize = 1 << 20;
const REGEX_DFA_SIZE_LIMIT: usize = 1 << 21;

/// A single pattern/label pair as it appears in configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuleSpec {
    /// Regular expression evaluated against the raw message
    pub pattern: String,

    /// Label assigned when the pattern matches
    pub label: String,
}

/// Ordered first-match-wins rule matcher.
///
/// Rules compile once at load time; a malformed pattern is a configuration
/// error surfaced there, never at match time.
#[derive(Debug)]
pub struct RuleMatcher {
    rules: Vec<CompiledRule>,
}

#[derive(Debug)]
struct CompiledRule {
    regex: regex::Regex,
    label: String,
}

impl RuleMatcher {
    /// Compile an ordered rule set.
    ///
    /// Patterns match case-insensitively: log producers disagree on casing
    /// far more often than rule authors intend to distinguish it.
    pub fn new(specs: &[RuleSpec]) -> Result<Self> {
        let mut rules = Vec::with_capacity(specs.len());

        for spec in specs {
            if spec.label.trim().is_empty() {
                return Err(Error::config(format!(
                    "rule pattern '{}' has an empty label",
                    spec.pattern
                )));
            }

            let regex = RegexBuilder::new(&spec.pattern)
                .case_insensitive(true)
                .size_limit(REGEX_SIZE_LIMIT)
                .dfa_size_limit(REGEX_DFA_SIZE_LIMIT)
                .build()
                .map_err(|e| {
                    Error::config(format!("invalid rule pattern '{}': {e}", spec.pattern))
                })?;

            rules.push(CompiledRule {
                regex,
                label: spec.label.clone(),
            });
        }

        Ok(Self { rules })
    }

    /// Return the label of the first rule matching `message`, if any
    pub fn first_match(&self, message: &str) -> Option<&str> {
        self.rules
            .iter()
            .find(|rule| rule.regex.is_match(message))
            .map(|rule| rule.label.as_str())
    }

    /// Number of compiled rules
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Whether the rule set is empty
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Labels referenced by the rule set, in rule order (may repeat)
    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.rules.iter().map(|rule| rule.label.as_str())
    }
}
