//! Typed errors for the enrichment library.
//!
//! Uses `thiserror` for library errors (not `anyhow`). Errors are split by
//! blast radius: an [`ItemError`] only ever fails one item of a batch, while
//! [`ConfigError`] and [`BatchError`] stop a batch before any item runs.

use thiserror::Error;

use crate::types::input::SourceType;

/// Errors that fail a single item. Never propagated out of a batch call;
/// the orchestrator turns them into `ItemOutcome::Failure`.
///
/// The `Display` text is shown to end users as-is, so it stays plain
/// language and never includes backtraces or raw response bodies.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ItemError {
    /// Source page or AI service could not be reached.
    #[error("could not reach {service}: {reason}")]
    Transport { service: String, reason: String },

    /// Source was reachable but yielded no usable product attributes.
    #[error("no product data found: {0}")]
    ExtractionEmpty(String),

    /// A dependent service answered with something we could not read.
    #[error("{service} returned an unreadable response: {reason}")]
    MalformedResponse { service: String, reason: String },

    /// The AI reply did not have the expected structure.
    #[error("description could not be generated: {0}")]
    GenerationFormat(String),

    /// The AI provider's safety system refused to answer.
    #[error("the AI service declined to describe this product")]
    Refused,

    /// The item did not finish within the per-item time limit.
    #[error("processing timed out after {seconds}s")]
    Timeout { seconds: u64 },

    /// An uploaded image could not be used.
    #[error("invalid image {filename}: {reason}")]
    Image { filename: String, reason: String },
}

impl ItemError {
    /// Shorthand for a transport failure.
    pub fn transport(service: impl Into<String>, reason: impl ToString) -> Self {
        Self::Transport {
            service: service.into(),
            reason: reason.to_string(),
        }
    }

    /// Shorthand for an unreadable dependent-service response.
    pub fn malformed(service: impl Into<String>, reason: impl ToString) -> Self {
        Self::MalformedResponse {
            service: service.into(),
            reason: reason.to_string(),
        }
    }

    /// Message stored on the failed item.
    pub fn user_message(&self) -> String {
        let text = self.to_string();
        let mut chars = text.chars();
        match chars.next() {
            Some(first) => first.to_uppercase().chain(chars).collect(),
            None => text,
        }
    }
}

/// Configuration problems. Fatal at batch start: the batch does not begin
/// rather than silently pricing at zero or calling an unconfigured service.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// No pricing entry for the integration.
    #[error("no pricing configured for integration '{integration}'")]
    MissingPricing { integration: String },

    /// Integration key is not registered.
    #[error("unknown integration '{0}'")]
    UnknownIntegration(String),

    /// Required credential is absent.
    #[error("missing credential: {0}")]
    MissingCredential(String),

    /// A setting has an unusable value.
    #[error("invalid setting {key}: {reason}")]
    Invalid { key: String, reason: String },

    /// Config file could not be read.
    #[error("config I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Config file is not valid JSON.
    #[error("config parse error: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Errors returned by a batch call itself.
#[derive(Debug, Error)]
pub enum BatchError {
    /// Configuration problem detected before any item ran.
    #[error("batch not started: {0}")]
    Config(#[from] ConfigError),

    /// An input of the wrong source type was submitted to an integration.
    #[error("input #{index} has source type {found} but this integration expects {expected}")]
    SourceMismatch {
        index: usize,
        expected: SourceType,
        found: SourceType,
    },

    /// The caller cancelled the batch; partial work was discarded.
    #[error("batch cancelled")]
    Cancelled,
}

/// Errors from report writers.
#[derive(Debug, Error)]
pub enum ReportError {
    /// Report file could not be written.
    #[error("report I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Writer-specific failure (upload rejected, etc.)
    #[error("report writer error: {0}")]
    Writer(String),
}

/// Result type alias for per-item operations.
pub type ItemResult<T> = std::result::Result<T, ItemError>;

/// Result type alias for batch operations.
pub type BatchResult<T> = std::result::Result<T, BatchError>;

/// Result type alias for configuration operations.
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;
