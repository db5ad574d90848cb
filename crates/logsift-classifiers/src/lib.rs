//! LogSift Classifiers
//!
//! The three classification strategies the router selects among:
//! - Pattern rule matcher: ordered regex rules, first match wins, cheapest
//! - Embedding classifier: nearest-centroid over an injected encoder, scored
//! - Generative fallback: external chat-completions call with timeout,
//!   bounded retry, and abstention on malformed replies
//!
//! Strategies never panic on bad input; failures degrade into abstentions
//! or `StrategyUnavailable` errors the router absorbs.

pub mod config;
pub mod embedding;
pub mod generative;
pub mod pattern;

pub use config::{EmbeddingSpec, GenerativeSpec};
pub use embedding::{
    CentroidSpec, EmbeddingArtifact, EmbeddingClassifier, Encoder, HashedEncoder, ScoredLabel,
};
pub use generative::{ChatBackend, ChatMessage, GenerativeClassifier, HttpChatBackend};
pub use pattern::{RuleMatcher, RuleSpec};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::config::{EmbeddingSpec, GenerativeSpec};
    pub use crate::embedding::{EmbeddingClassifier, Encoder, HashedEncoder, ScoredLabel};
    pub use crate::generative::{ChatBackend, ChatMessage, GenerativeClassifier};
    pub use crate::pattern::{RuleMatcher, RuleSpec};
}
