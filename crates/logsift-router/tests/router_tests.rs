//! End-to-end router behavior over mocked strategies
//!
//! The generative backend is the one legitimate source of run-to-run
//! variance, so these tests always inject a scripted mock for it.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use logsift_classifiers::{
    ChatBackend, ChatMessage, EmbeddingClassifier, Encoder, GenerativeClassifier, RuleMatcher,
    RuleSpec,
};
use logsift_core::{LogEntry, Result, Strategy, UNCLASSIFIED};
use logsift_policy::{PolicyConfig, PolicyTable};
use logsift_router::Router;
use tokio_util::sync::CancellationToken;

/// Backend returning one fixed reply, or hanging forever when `reply` is
/// `None`
struct FixedBackend {
    reply: Option<String>,
    calls: AtomicU32,
}

impl FixedBackend {
    fn replying(reply: &str) -> Arc<Self> {
        Arc::new(Self {
            reply: Some(reply.to_string()),
            calls: AtomicU32::new(0),
        })
    }

    fn hanging() -> Arc<Self> {
        Arc::new(Self {
            reply: None,
            calls: AtomicU32::new(0),
        })
    }

    fn calls(&self) -> u32 {
        self.calls.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl ChatBackend for FixedBackend {
    async fn complete(&self, _messages: &[ChatMessage]) -> Result<String> {
        self.calls.fetch_add(1, Ordering::Relaxed);
        match &self.reply {
            Some(reply) => Ok(reply.clone()),
            None => std::future::pending().await,
        }
    }

    fn name(&self) -> &str {
        "fixed"
    }
}

/// Two-bucket encoder counting the marker tokens "alpha" and "beta",
/// giving tests exact control over similarity and confidence
struct MarkerEncoder;

impl Encoder for MarkerEncoder {
    fn embed(&self, text: &str) -> Vec<f32> {
        let mut v = vec![0.0f32; 2];
        for token in text.split_whitespace() {
            match token {
                "alpha" => v[0] += 1.0,
                "beta" => v[1] += 1.0,
                _ => {}
            }
        }
        v
    }

    fn dim(&self) -> usize {
        2
    }

    fn name(&self) -> &str {
        "marker"
    }
}

fn rules() -> RuleMatcher {
    RuleMatcher::new(&[
        RuleSpec {
            pattern: r"logged (in|out)".to_string(),
            label: "User Action".to_string(),
        },
        RuleSpec {
            pattern: r"backup (started|ended|completed)".to_string(),
            label: "System Notification".to_string(),
        },
    ])
    .unwrap()
}

fn embedding() -> EmbeddingClassifier {
    EmbeddingClassifier::from_centroids(
        Arc::new(MarkerEncoder),
        vec![
            ("Alpha Event".to_string(), vec![1.0, 0.0]),
            ("Beta Event".to_string(), vec![0.0, 1.0]),
        ],
    )
    .unwrap()
}

fn generative(backend: Arc<FixedBackend>) -> GenerativeClassifier {
    generative_with_timeout(backend, Duration::from_secs(5))
}

fn generative_with_timeout(
    backend: Arc<FixedBackend>,
    timeout: Duration,
) -> GenerativeClassifier {
    GenerativeClassifier::new(
        backend,
        vec![
            "User Action".to_string(),
            "Critical Error".to_string(),
            "Workflow Error".to_string(),
        ],
        timeout,
        3,
        Duration::from_millis(250),
    )
    .unwrap()
}

fn policies(yaml: &str) -> PolicyTable {
    PolicyTable::new(PolicyConfig::from_yaml(yaml).unwrap())
}

#[tokio::test]
async fn matching_rule_always_yields_pattern_provenance() {
    // Policy lists embedding before pattern; the rule must still win.
    let backend = FixedBackend::replying("Critical Error");
    let router = Router::new(
        rules(),
        Some(embedding()),
        Some(generative(backend.clone())),
        policies("default: [embedding, pattern, generative]\n"),
        0.5,
        4,
    );

    let result = router
        .classify_entry(&LogEntry::new("ModernCRM", "User 42 logged in"))
        .await;

    assert_eq!(result.label, "User Action");
    assert_eq!(result.strategy, Strategy::Pattern);
    assert_eq!(backend.calls(), 0);
}

#[tokio::test]
async fn legacy_source_skips_rules_and_goes_generative() {
    let backend = FixedBackend::replying("Critical Error");
    let router = Router::new(
        rules(),
        Some(embedding()),
        Some(generative(backend.clone())),
        policies(
            r#"
default: [pattern, embedding, generative]
sources:
  LegacyCRM: [generative]
"#,
        ),
        0.5,
        4,
    );

    // The message matches a rule, but LegacyCRM's policy does not permit
    // the pattern strategy.
    let result = router
        .classify_entry(&LogEntry::new("LegacyCRM", "User 7 logged in"))
        .await;

    assert_eq!(result.label, "Critical Error");
    assert_eq!(result.strategy, Strategy::Generative);
    assert_eq!(backend.calls(), 1);
}

#[tokio::test]
async fn confident_embedding_stops_escalation() {
    let backend = FixedBackend::replying("Workflow Error");
    let router = Router::new(
        rules(),
        Some(embedding()),
        Some(generative(backend.clone())),
        policies("default: [pattern, embedding, generative]\n"),
        0.6,
        4,
    );

    let result = router
        .classify_entry(&LogEntry::new("AnalyticsEngine", "alpha alpha spike"))
        .await;

    assert_eq!(result.label, "Alpha Event");
    assert_eq!(result.strategy, Strategy::Embedding);
    assert!(result.confidence.unwrap() >= 0.6);
    assert_eq!(backend.calls(), 0);
}

#[tokio::test]
async fn low_confidence_escalates_to_generative() {
    let backend = FixedBackend::replying("Workflow Error");
    let router = Router::new(
        rules(),
        Some(embedding()),
        Some(generative(backend.clone())),
        policies("default: [pattern, embedding, generative]\n"),
        0.6,
        4,
    );

    // "alpha beta" sits exactly between the two centroids: confidence 0.5,
    // below the 0.6 gate.
    let result = router
        .classify_entry(&LogEntry::new("AnalyticsEngine", "alpha beta drift"))
        .await;

    assert_eq!(result.label, "Workflow Error");
    assert_eq!(result.strategy, Strategy::Generative);
    assert_eq!(backend.calls(), 1);
}

#[tokio::test(start_paused = true)]
async fn generative_timeout_degrades_to_unclassified() {
    let backend = FixedBackend::hanging();
    let router = Arc::new(Router::new(
        rules(),
        None,
        Some(generative(backend.clone())),
        policies(
            r#"
default: [pattern]
sources:
  LegacyCRM: [generative]
"#,
        ),
        0.5,
        4,
    ));

    let entries = vec![
        LogEntry::new("ModernCRM", "backup started at 02:00"),
        LogEntry::new("LegacyCRM", "ERR_CODE 99 unspecified failure"),
        LogEntry::new("ModernCRM", "User 3 logged out"),
    ];

    let results = router
        .classify_batch(entries, CancellationToken::new())
        .await;

    // All three attempts timed out; the batch still completes with one
    // result per input.
    assert_eq!(results.len(), 3);
    assert_eq!(results[0].strategy, Strategy::Pattern);
    assert_eq!(results[1].label, UNCLASSIFIED);
    assert_eq!(results[1].strategy, Strategy::Unclassified);
    assert_eq!(results[2].strategy, Strategy::Pattern);
    assert_eq!(backend.calls(), 3);
}

#[tokio::test]
async fn exhausted_policy_yields_sentinel() {
    let router = Router::new(
        rules(),
        Some(embedding()),
        None,
        policies("default: [pattern, embedding, generative]\n"),
        0.9,
        4,
    );

    let result = router
        .classify_entry(&LogEntry::new("ModernHR", "gamma delta epsilon"))
        .await;

    assert_eq!(result.label, UNCLASSIFIED);
    assert_eq!(result.strategy, Strategy::Unclassified);
}

#[tokio::test]
async fn empty_message_is_marked_unclassified() {
    let router = Router::new(
        rules(),
        Some(embedding()),
        None,
        policies("default: [pattern, embedding]\n"),
        0.5,
        4,
    );

    let result = router.classify_entry(&LogEntry::new("ModernCRM", "   ")).await;
    assert!(result.is_unclassified());
}

#[tokio::test]
async fn identical_batches_yield_identical_outputs() {
    let make_router = || {
        Arc::new(Router::new(
            rules(),
            Some(embedding()),
            Some(generative(FixedBackend::replying("Critical Error"))),
            policies(
                r#"
default: [pattern, embedding, generative]
sources:
  LegacyCRM: [generative]
"#,
            ),
            0.6,
            4,
        ))
    };

    let entries = vec![
        LogEntry::new("ModernCRM", "User 42 logged in"),
        LogEntry::new("AnalyticsEngine", "alpha alpha spike"),
        LogEntry::new("LegacyCRM", "ERR_CODE 99 unspecified failure"),
        LogEntry::new("ModernHR", "nothing matches this"),
    ];

    let first = make_router()
        .classify_batch(entries.clone(), CancellationToken::new())
        .await;
    let second = make_router()
        .classify_batch(entries, CancellationToken::new())
        .await;

    assert_eq!(first, second);
}

#[tokio::test(start_paused = true)]
async fn cancellation_aborts_in_flight_generative_calls() {
    let backend = FixedBackend::hanging();
    // Timeout far beyond the cancellation point: only the token can end
    // these calls.
    let router = Arc::new(Router::new(
        rules(),
        None,
        Some(generative_with_timeout(backend, Duration::from_secs(3600))),
        policies("default: [generative]\n"),
        0.5,
        4,
    ));

    let cancel = CancellationToken::new();
    let entries = vec![
        LogEntry::new("LegacyCRM", "stuck message one"),
        LogEntry::new("LegacyCRM", "stuck message two"),
    ];

    let batch = tokio::spawn(router.classify_batch(entries, cancel.clone()));

    tokio::time::sleep(Duration::from_millis(50)).await;
    cancel.cancel();

    let results = batch.await.unwrap();
    assert_eq!(results.len(), 2);
    for result in &results {
        assert!(result.is_unclassified());
    }
}
