//! Error types for LogSift

/// Result type alias using LogSift's Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for LogSift operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Malformed rule, policy, or engine configuration. Fatal at load time.
    #[error("configuration error: {0}")]
    Config(String),

    /// A single entry or an input batch that does not satisfy the ingestion
    /// contract. Never aborts a running batch.
    #[error("malformed input: {0}")]
    MalformedInput(String),

    /// A strategy's dependency is unreachable or exhausted its retries.
    /// Recovered locally by falling through to the next strategy.
    #[error("strategy unavailable: {0}")]
    StrategyUnavailable(String),

    /// Timeout, rate limit, or bad response from the generative service
    #[error("external service error: {0}")]
    ExternalService(String),

    /// Network/IO errors
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization errors
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Tabular read/write errors
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    /// Timeout errors
    #[error("operation timed out")]
    Timeout,

    /// Generic internal errors
    #[error("internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Create a new configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a new malformed-input error
    pub fn malformed_input(msg: impl Into<String>) -> Self {
        Self::MalformedInput(msg.into())
    }

    /// Create a new strategy-unavailable error
    pub fn strategy_unavailable(msg: impl Into<String>) -> Self {
        Self::StrategyUnavailable(msg.into())
    }

    /// Create a new external-service error
    pub fn external_service(msg: impl Into<String>) -> Self {
        Self::ExternalService(msg.into())
    }

    /// Create a new internal error
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Whether a bounded retry may recover from this error.
    ///
    /// Only transient external-service failures qualify; configuration and
    /// input errors never do.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::ExternalService(_) | Self::Timeout | Self::Io(_))
    }
}
