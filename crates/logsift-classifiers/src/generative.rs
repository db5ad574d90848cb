//! Generative fallback classifier, the strategy of last resort
//!
//! Sends a structured prompt with the candidate label set to an external
//! chat-completions service and parses the reply back into a single label.
//! This is the one strategy with an external dependency, so every call is
//! wrapped in a timeout and a capped retry with exponential backoff; a
//! malformed reply is an abstention, never an error that could take the
//! batch down.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use logsift_core::{Error, Result, UNCLASSIFIED};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// A chat message in the request payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Role of the message sender (system, user, assistant)
    pub role: String,

    /// Content of the message
    pub content: String,
}

impl ChatMessage {
    /// Create a new chat message
    pub fn new(role: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            role: role.into(),
            content: content.into(),
        }
    }

    /// Create a system message
    pub fn system(content: impl Into<String>) -> Self {
        Self::new("system", content)
    }

    /// Create a user message
    pub fn user(content: impl Into<String>) -> Self {
        Self::new("user", content)
    }
}

/// External generative capability consumed by the fallback classifier.
///
/// The classifier owns prompting, timeouts, retries, and response parsing;
/// implementations only move messages to a model and its reply back.
#[async_trait]
pub trait ChatBackend: Send + Sync {
    /// Request a completion for the given conversation
    async fn complete(&self, messages: &[ChatMessage]) -> Result<String>;

    /// Backend name, used in logs
    fn name(&self) -> &str;
}

/// Chat backend speaking the OpenAI-compatible chat-completions protocol
pub struct HttpChatBackend {
    client: reqwest::Client,
    endpoint: String,
    model: String,
    api_key: Option<String>,
}

#[derive(Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    temperature: f32,
    max_tokens: u32,
}

#[derive(Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatCompletionChoice>,
}

#[derive(Deserialize)]
struct ChatCompletionChoice {
    message: ChatMessage,
}

impl HttpChatBackend {
    /// Create a backend for a chat-completions endpoint.
    ///
    /// `endpoint` is the full URL (e.g. `https://api.example.com/v1/chat/completions`).
    /// The per-call deadline is enforced by the caller; the client timeout
    /// here is a hard backstop so a wedged connection cannot outlive it.
    pub fn new(
        endpoint: impl Into<String>,
        model: impl Into<String>,
        api_key: Option<String>,
        backstop_timeout: Duration,
    ) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(backstop_timeout)
            .build()
            .map_err(|e| Error::config(format!("cannot build http client: {e}")))?;

        Ok(Self {
            client,
            endpoint: endpoint.into(),
            model: model.into(),
            api_key,
        })
    }
}

#[async_trait]
impl ChatBackend for HttpChatBackend {
    async fn complete(&self, messages: &[ChatMessage]) -> Result<String> {
        let payload = ChatCompletionRequest {
            model: &self.model,
            messages,
            // Labeling wants the mode of the distribution, not variety.
            temperature: 0.0,
            max_tokens: 16,
        };

        let mut request = self.client.post(&self.endpoint).json(&payload);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                Error::Timeout
            } else {
                Error::external_service(format!("request to {} failed: {e}", self.endpoint))
            }
        })?;

        let status = response.status();
        if status.as_u16() == 429 || status.is_server_error() {
            // Transient: the retry loop may recover.
            return Err(Error::external_service(format!(
                "backend returned {status}"
            )));
        }
        if !status.is_success() {
            // Auth or routing problem; retrying the same request cannot help.
            return Err(Error::strategy_unavailable(format!(
                "backend returned {status}"
            )));
        }

        let completion: ChatCompletionResponse = response
            .json()
            .await
            .map_err(|e| Error::external_service(format!("unreadable completion body: {e}")))?;

        completion
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .ok_or_else(|| Error::external_service("completion contained no choices"))
    }

    fn name(&self) -> &str {
        "http-chat"
    }
}

/// Generative fallback classifier with bounded retry
pub struct GenerativeClassifier {
    backend: Arc<dyn ChatBackend>,
    candidate_labels: Vec<String>,
    call_timeout: Duration,
    max_attempts: u32,
    backoff_base: Duration,
}

impl std::fmt::Debug for GenerativeClassifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GenerativeClassifier")
            .field("backend", &self.backend.name())
            .field("candidate_labels", &self.candidate_labels)
            .field("call_timeout", &self.call_timeout)
            .field("max_attempts", &self.max_attempts)
            .field("backoff_base", &self.backoff_base)
            .finish()
    }
}

impl GenerativeClassifier {
    /// Create a classifier over a backend and a candidate label set.
    ///
    /// An empty candidate set or a zero attempt cap is a configuration
    /// error: the strategy would be unable to ever produce a label.
    pub fn new(
        backend: Arc<dyn ChatBackend>,
        candidate_labels: Vec<String>,
        call_timeout: Duration,
        max_attempts: u32,
        backoff_base: Duration,
    ) -> Result<Self> {
        if candidate_labels.is_empty() {
            return Err(Error::config(
                "generative classifier requires at least one candidate label",
            ));
        }
        if max_attempts == 0 {
            return Err(Error::config(
                "generative classifier requires max_attempts >= 1",
            ));
        }

        Ok(Self {
            backend,
            candidate_labels,
            call_timeout,
            max_attempts,
            backoff_base,
        })
    }

    /// Classify a message, returning `None` when the model abstains or its
    /// reply does not name a candidate label.
    ///
    /// Transient backend failures are retried up to the attempt cap with
    /// exponential backoff; exhaustion and non-transient failures surface as
    /// [`Error::StrategyUnavailable`] for the router to absorb.
    pub async fn classify(&self, source: &str, message: &str) -> Result<Option<String>> {
        let messages = [
            ChatMessage::system(self.system_prompt()),
            ChatMessage::user(format!("Source: {source}\nLog message: {message}")),
        ];

        let mut attempt = 1;
        loop {
            let outcome =
                tokio::time::timeout(self.call_timeout, self.backend.complete(&messages)).await;

            let err = match outcome {
                Ok(Ok(reply)) => return Ok(self.parse_label(&reply)),
                Ok(Err(e)) => e,
                Err(_) => Error::Timeout,
            };

            if attempt >= self.max_attempts || !err.is_retryable() {
                return Err(Error::strategy_unavailable(format!(
                    "generative backend '{}' failed after {attempt} attempt(s): {err}",
                    self.backend.name()
                )));
            }

            let backoff = self.backoff_base * 2u32.saturating_pow(attempt - 1);
            warn!(
                backend = self.backend.name(),
                attempt,
                backoff_ms = backoff.as_millis() as u64,
                error = %err,
                "generative call failed, backing off"
            );
            tokio::time::sleep(backoff).await;
            attempt += 1;
        }
    }

    /// Candidate labels offered to the model
    pub fn labels(&self) -> &[String] {
        &self.candidate_labels
    }

    fn system_prompt(&self) -> String {
        let mut prompt = String::from(
            "You are a log classification engine. Assign the log message to \
             exactly one of the following categories:\n",
        );
        for label in &self.candidate_labels {
            prompt.push_str("- ");
            prompt.push_str(label);
            prompt.push('\n');
        }
        prompt.push_str(
            "\nReply with the category name only, on a single line, with no \
             explanation. If none of the categories fit, reply with \
             \"unclassified\".\n\
             \n\
             Example:\n\
             Source: LegacyCRM\n\
             Log message: Case escalation for ticket T7012 failed\n\
             Reply: Workflow Error",
        );
        prompt
    }

    /// Normalize a model reply into a candidate label.
    ///
    /// Tolerates surrounding quotes, trailing punctuation, and casing
    /// drift; anything that still does not name a candidate is treated as
    /// an abstention rather than an error.
    fn parse_label(&self, reply: &str) -> Option<String> {
        let cleaned = reply
            .lines()
            .map(str::trim)
            .find(|line| !line.is_empty())?
            .trim_start_matches("Reply:")
            .trim_matches(|c: char| c.is_whitespace() || matches!(c, '"' | '\'' | '`' | '.' | '*'));

        if cleaned.eq_ignore_ascii_case(UNCLASSIFIED) {
            return None;
        }

        let matched = self
            .candidate_labels
            .iter()
            .find(|label| label.eq_ignore_ascii_case(cleaned));

        if matched.is_none() {
            debug!(reply = cleaned, "generative reply named no candidate label");
        }
        matched.cloned()
    }
}
