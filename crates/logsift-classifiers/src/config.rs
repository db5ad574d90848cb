//! Configuration specs for the strategies
//!
//! These are the serde-facing shapes that appear inside the engine config
//! file. Each spec validates and builds its runtime classifier; every
//! malformed value is a load-time configuration error.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use logsift_core::Result;
use serde::{Deserialize, Serialize};

use crate::embedding::{EmbeddingClassifier, Encoder, HashedEncoder};
use crate::generative::{ChatBackend, GenerativeClassifier, HttpChatBackend};

/// Embedding strategy configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingSpec {
    /// Pre-built centroid artifact (JSON). Takes precedence over `classes`.
    #[serde(default)]
    pub artifact: Option<PathBuf>,

    /// Prototype phrases per label; centroids are derived by embedding and
    /// averaging them at load time
    #[serde(default)]
    pub classes: BTreeMap<String, Vec<String>>,

    /// Encoder dimensionality for the built-in hashed encoder
    #[serde(default = "default_dim")]
    pub dim: usize,
}

impl Default for EmbeddingSpec {
    fn default() -> Self {
        Self {
            artifact: None,
            classes: BTreeMap::new(),
            dim: default_dim(),
        }
    }
}

impl EmbeddingSpec {
    /// Whether this spec carries enough data to build a classifier
    pub fn is_configured(&self) -> bool {
        self.artifact.is_some() || !self.classes.is_empty()
    }

    /// Build with the default hashed encoder
    pub fn build(&self) -> Result<EmbeddingClassifier> {
        self.build_with_encoder(Arc::new(HashedEncoder::new(self.dim)))
    }

    /// Build with an injected encoder (the pre-trained capability seam)
    pub fn build_with_encoder(&self, encoder: Arc<dyn Encoder>) -> Result<EmbeddingClassifier> {
        match &self.artifact {
            Some(path) => EmbeddingClassifier::from_artifact_path(encoder, path),
            None => EmbeddingClassifier::from_prototypes(encoder, &self.classes),
        }
    }
}

/// Generative strategy configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerativeSpec {
    /// Chat-completions endpoint URL; the strategy is disabled when absent
    #[serde(default)]
    pub endpoint: Option<String>,

    /// Model identifier sent with each request
    #[serde(default = "default_model")]
    pub model: String,

    /// Environment variable holding the API key
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,

    /// Per-call timeout in milliseconds (default 10s)
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// Retry cap per classification (default 3 attempts)
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Exponential backoff base in milliseconds (default 250ms)
    #[serde(default = "default_backoff_ms")]
    pub backoff_ms: u64,

    /// Candidate labels offered to the model. Empty means "use the labels
    /// the rest of the engine knows about", resolved by the caller.
    #[serde(default)]
    pub labels: Vec<String>,
}

impl Default for GenerativeSpec {
    fn default() -> Self {
        Self {
            endpoint: None,
            model: default_model(),
            api_key_env: default_api_key_env(),
            timeout_ms: default_timeout_ms(),
            max_attempts: default_max_attempts(),
            backoff_ms: default_backoff_ms(),
            labels: Vec::new(),
        }
    }
}

impl GenerativeSpec {
    /// Whether an endpoint is configured
    pub fn is_configured(&self) -> bool {
        self.endpoint.is_some()
    }

    /// Build the HTTP-backed classifier, or `None` when no endpoint is
    /// configured. The API key is read from [`GenerativeSpec::api_key_env`].
    pub fn build(&self, fallback_labels: &[String]) -> Result<Option<GenerativeClassifier>> {
        let Some(endpoint) = &self.endpoint else {
            return Ok(None);
        };

        let api_key = std::env::var(&self.api_key_env).ok();
        // Client-level backstop sits above the per-call deadline so a wedged
        // connection cannot outlive the retry loop's own timeout.
        let backend = HttpChatBackend::new(
            endpoint.clone(),
            self.model.clone(),
            api_key,
            Duration::from_millis(self.timeout_ms.saturating_mul(2)),
        )?;

        self.build_with_backend(Arc::new(backend), fallback_labels)
            .map(Some)
    }

    /// Build over an injected backend (used by tests and embedders)
    pub fn build_with_backend(
        &self,
        backend: Arc<dyn ChatBackend>,
        fallback_labels: &[String],
    ) -> Result<GenerativeClassifier> {
        let labels = if self.labels.is_empty() {
            fallback_labels.to_vec()
        } else {
            self.labels.clone()
        };

        GenerativeClassifier::new(
            backend,
            labels,
            Duration::from_millis(self.timeout_ms),
            self.max_attempts,
            Duration::from_millis(self.backoff_ms),
        )
    }
}

fn default_dim() -> usize {
    HashedEncoder::DEFAULT_DIM
}

fn default_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_api_key_env() -> String {
    "LOGSIFT_API_KEY".to_string()
}

fn default_timeout_ms() -> u64 {
    10_000
}

fn default_max_attempts() -> u32 {
    3
}

fn default_backoff_ms() -> u64 {
    250
}
