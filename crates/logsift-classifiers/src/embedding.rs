//! Embedding classifier, the learned strategy
//!
//! Converts a message to a dense vector through an injected [`Encoder`] and
//! assigns the label of the nearest class centroid, with a confidence score
//! gating escalation in the router (default threshold 0.5, configured there).
//!
//! The encoder is an opaque pre-trained capability: this module never looks
//! inside it, it only requires determinism for identical input. A
//! self-contained [`HashedEncoder`] ships as the default so the strategy
//! works without external model artifacts.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use logsift_core::{Error, Result, UNCLASSIFIED};
use serde::{Deserialize, Serialize};
use tracing::warn;

// Softmax sharpening over cosine similarities. Cosine lives in [-1,1], which
// squashes softmax toward uniform without a multiplier.
const SOFTMAX_SHARPNESS: f32 = 4.0;

/// Text-to-vector capability consumed by the embedding classifier.
///
/// Implementations must be deterministic: identical input yields an
/// identical vector across calls and across runs.
pub trait Encoder: Send + Sync {
    /// Embed `text` into a fixed-dimension vector of length [`Encoder::dim`]
    fn embed(&self, text: &str) -> Vec<f32>;

    /// Output dimensionality
    fn dim(&self) -> usize;

    /// Encoder name, used in logs
    fn name(&self) -> &str;
}

/// Deterministic hashed bag-of-tokens encoder.
///
/// Stands in when no external encoder is wired up, the same way a lexicon
/// fallback stands in for a loaded model. Tokens hash into a fixed number of
/// buckets (FNV-1a, stable across runs) and the resulting histogram is
/// L2-normalized.
pub struct HashedEncoder {
    dim: usize,
}

impl HashedEncoder {
    /// Default dimensionality, enough buckets that typical log vocabularies
    /// rarely collide
    pub const DEFAULT_DIM: usize = 256;

    pub fn new(dim: usize) -> Self {
        Self { dim: dim.max(1) }
    }

    fn bucket(&self, token: &str) -> usize {
        // FNV-1a, chosen over the std hasher because RandomState is seeded
        // per process and would break run-to-run determinism.
        let mut hash: u64 = 0xcbf2_9ce4_8422_2325;
        for byte in token.bytes() {
            hash ^= u64::from(byte);
            hash = hash.wrapping_mul(0x0000_0100_0000_01b3);
        }
        (hash % self.dim as u64) as usize
    }
}

impl Default for HashedEncoder {
    fn default() -> Self {
        Self::new(Self::DEFAULT_DIM)
    }
}

impl Encoder for HashedEncoder {
    fn embed(&self, text: &str) -> Vec<f32> {
        let mut vector = vec![0.0f32; self.dim];

        for token in text
            .split(|c: char| !c.is_alphanumeric())
            .filter(|t| !t.is_empty())
        {
            let token = token.to_lowercase();
            vector[self.bucket(&token)] += 1.0;
        }

        normalize(&mut vector);
        vector
    }

    fn dim(&self) -> usize {
        self.dim
    }

    fn name(&self) -> &str {
        "hashed-bow"
    }
}

/// A label with the confidence the classifier assigns it, in [0,1]
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredLabel {
    pub label: String,
    pub confidence: f32,
}

impl ScoredLabel {
    /// The defined low-confidence output for inputs the classifier cannot
    /// score (empty, whitespace-only, or outside the encoder's vocabulary)
    pub fn abstain() -> Self {
        Self {
            label: UNCLASSIFIED.to_string(),
            confidence: 0.0,
        }
    }

    /// Check whether confidence meets the router's acceptance threshold
    pub fn meets_threshold(&self, threshold: f32) -> bool {
        self.confidence >= threshold
    }
}

/// Pre-built centroid artifact, the on-disk form of a trained decision head
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingArtifact {
    /// Dimensionality every centroid must have
    pub dim: usize,

    /// One centroid per class
    pub classes: Vec<CentroidSpec>,
}

/// A single labeled centroid inside an artifact
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CentroidSpec {
    pub label: String,
    pub centroid: Vec<f32>,
}

/// Nearest-centroid classifier over an injected encoder
pub struct EmbeddingClassifier {
    encoder: Arc<dyn Encoder>,
    classes: Vec<Centroid>,
}

impl std::fmt::Debug for EmbeddingClassifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EmbeddingClassifier")
            .field("encoder", &self.encoder.name())
            .field("classes", &self.classes)
            .finish()
    }
}

#[derive(Debug)]
struct Centroid {
    label: String,
    vector: Vec<f32>,
}

impl EmbeddingClassifier {
    /// Build from raw labeled centroids.
    ///
    /// Dimension mismatches and empty class sets are configuration errors.
    pub fn from_centroids(
        encoder: Arc<dyn Encoder>,
        centroids: Vec<(String, Vec<f32>)>,
    ) -> Result<Self> {
        if centroids.is_empty() {
            return Err(Error::config(
                "embedding classifier requires at least one class centroid",
            ));
        }

        let mut classes = Vec::with_capacity(centroids.len());
        for (label, mut vector) in centroids {
            if vector.len() != encoder.dim() {
                return Err(Error::config(format!(
                    "centroid for label '{}' has dimension {}, encoder '{}' produces {}",
                    label,
                    vector.len(),
                    encoder.name(),
                    encoder.dim()
                )));
            }
            if normalize(&mut vector) == 0.0 {
                return Err(Error::config(format!(
                    "centroid for label '{label}' is all zeros"
                )));
            }
            classes.push(Centroid { label, vector });
        }

        Ok(Self { encoder, classes })
    }

    /// Build centroids by embedding prototype phrases per label and
    /// averaging them. Deterministic given a deterministic encoder, so a
    /// config of example phrases behaves like a small pre-trained head.
    pub fn from_prototypes(
        encoder: Arc<dyn Encoder>,
        prototypes: &BTreeMap<String, Vec<String>>,
    ) -> Result<Self> {
        let mut centroids = Vec::with_capacity(prototypes.len());

        for (label, phrases) in prototypes {
            if phrases.is_empty() {
                return Err(Error::config(format!(
                    "label '{label}' has no prototype phrases"
                )));
            }

            let mut centroid = vec![0.0f32; encoder.dim()];
            for phrase in phrases {
                let vector = encoder.embed(phrase);
                for (acc, v) in centroid.iter_mut().zip(vector) {
                    *acc += v;
                }
            }

            if centroid.iter().all(|v| *v == 0.0) {
                return Err(Error::config(format!(
                    "prototype phrases for label '{label}' produce an empty embedding"
                )));
            }

            centroids.push((label.clone(), centroid));
        }

        Self::from_centroids(encoder, centroids)
    }

    /// Load a pre-built centroid artifact from a JSON file
    pub fn from_artifact_path(encoder: Arc<dyn Encoder>, path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(|e| {
            Error::config(format!(
                "cannot read embedding artifact {}: {e}",
                path.as_ref().display()
            ))
        })?;
        let artifact: EmbeddingArtifact = serde_json::from_str(&content).map_err(|e| {
            Error::config(format!(
                "invalid embedding artifact {}: {e}",
                path.as_ref().display()
            ))
        })?;

        if artifact.dim != encoder.dim() {
            return Err(Error::config(format!(
                "embedding artifact dimension {} does not match encoder dimension {}",
                artifact.dim,
                encoder.dim()
            )));
        }

        Self::from_centroids(
            encoder,
            artifact
                .classes
                .into_iter()
                .map(|c| (c.label, c.centroid))
                .collect(),
        )
    }

    /// Classify a message into the nearest class with a [0,1] confidence.
    ///
    /// Never fails: inputs that cannot be scored (empty, whitespace-only,
    /// or embedding to a zero vector) return [`ScoredLabel::abstain`].
    pub fn classify(&self, message: &str) -> ScoredLabel {
        if message.trim().is_empty() {
            return ScoredLabel::abstain();
        }

        let mut vector = self.encoder.embed(message);
        if vector.len() != self.encoder.dim() {
            warn!(
                encoder = self.encoder.name(),
                got = vector.len(),
                expected = self.encoder.dim(),
                "encoder returned unexpected dimension, abstaining"
            );
            return ScoredLabel::abstain();
        }
        if normalize(&mut vector) == 0.0 {
            // Unseen-token regime: nothing in the message hit the encoder's
            // vocabulary.
            return ScoredLabel::abstain();
        }

        // Centroids are unit-normalized at construction, so dot product is
        // cosine similarity.
        let similarities: Vec<f32> = self
            .classes
            .iter()
            .map(|c| dot(&vector, &c.vector))
            .collect();

        let (best_idx, confidence) = softmax_argmax(&similarities);
        ScoredLabel {
            label: self.classes[best_idx].label.clone(),
            confidence,
        }
    }

    /// Labels known to the decision head
    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.classes.iter().map(|c| c.label.as_str())
    }
}

fn dot(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

/// L2-normalize in place, returning the original norm
fn normalize(vector: &mut [f32]) -> f32 {
    let norm = vector.iter().map(|v| v * v).sum::<f32>().sqrt();
    if norm > 0.0 {
        for v in vector.iter_mut() {
            *v /= norm;
        }
    }
    norm
}

/// Softmax over similarity scores, returning the argmax index and its
/// probability mass
fn softmax_argmax(scores: &[f32]) -> (usize, f32) {
    let max_score = scores.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    let exps: Vec<f32> = scores
        .iter()
        .map(|s| ((s - max_score) * SOFTMAX_SHARPNESS).exp())
        .collect();
    let total: f32 = exps.iter().sum();

    let best_idx = scores
        .iter()
        .enumerate()
        .max_by(|a, b| a.1.total_cmp(b.1))
        .map(|(i, _)| i)
        .unwrap_or(0);

    (best_idx, exps[best_idx] / total)
}
