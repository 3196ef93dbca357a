//! AI credentials kept out of logs.
//!
//! Uses the `secrecy` crate so API keys never show up in debug output,
//! tracing fields or error messages.

use secrecy::{ExposeSecret, SecretBox};
use std::fmt;
use std::time::Duration;

use crate::error::{ConfigError, ConfigResult};

/// A string that prints as `[REDACTED]`.
pub struct SecretString(SecretBox<str>);

impl SecretString {
    pub fn new(value: impl Into<String>) -> Self {
        Self(SecretBox::new(Box::from(value.into().as_str())))
    }

    /// The secret value. Only call this where the value is sent.
    pub fn expose(&self) -> &str {
        self.0.expose_secret()
    }

    pub fn is_empty(&self) -> bool {
        self.expose().trim().is_empty()
    }
}

impl Clone for SecretString {
    fn clone(&self) -> Self {
        Self::new(self.expose())
    }
}

impl fmt::Debug for SecretString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[REDACTED]")
    }
}

impl fmt::Display for SecretString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[REDACTED]")
    }
}

impl From<String> for SecretString {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

impl From<&str> for SecretString {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// Per-request timeout for AI calls unless configured otherwise.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// Credentials and model choice for the AI service.
#[derive(Clone)]
pub struct AiCredentials {
    pub api_key: SecretString,

    /// Model for descriptions.
    pub text_model: String,

    /// Model for reading product photos.
    pub vision_model: String,

    /// OpenAI-compatible base URL, when not the public API.
    pub base_url: Option<String>,

    /// Upper bound on one HTTP request to the service.
    pub request_timeout: Duration,
}

impl AiCredentials {
    /// Credentials using the default model for both calls.
    ///
    /// An empty key is a configuration error: batches must not start
    /// against an unconfigured service.
    pub fn new(api_key: impl Into<SecretString>) -> ConfigResult<Self> {
        let api_key = api_key.into();
        if api_key.is_empty() {
            return Err(ConfigError::MissingCredential("OPENAI_API_KEY".into()));
        }
        Ok(Self {
            api_key,
            text_model: "gpt-4o-mini".to_string(),
            vision_model: "gpt-4o-mini".to_string(),
            base_url: None,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        })
    }

    pub fn with_text_model(mut self, model: impl Into<String>) -> Self {
        self.text_model = model.into();
        self
    }

    pub fn with_vision_model(mut self, model: impl Into<String>) -> Self {
        self.vision_model = model.into();
        self
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// HTTP client for these credentials.
    #[cfg(feature = "openai")]
    pub fn client(&self) -> ConfigResult<openai_client::OpenAIClient> {
        let client = openai_client::OpenAIClient::new(self.api_key.expose())
            .with_timeout(self.request_timeout)
            .map_err(|e| ConfigError::Invalid {
                key: "ai.request_timeout".into(),
                reason: e.to_string(),
            })?;
        Ok(match &self.base_url {
            Some(url) => client.with_base_url(url),
            None => client,
        })
    }
}

impl fmt::Debug for AiCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AiCredentials")
            .field("api_key", &"[REDACTED]")
            .field("text_model", &self.text_model)
            .field("vision_model", &self.vision_model)
            .field("base_url", &self.base_url)
            .field("request_timeout", &self.request_timeout)
            .finish()
    }
}
