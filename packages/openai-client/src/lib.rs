//! Pure OpenAI REST API client
//!
//! A minimal client for OpenAI-compatible chat completions with no
//! domain-specific logic. Supports text and image input, JSON-object
//! replies, and reports token usage and refusals.
//!
//! # Example
//!
//! ```rust,ignore
//! use openai_client::{ChatRequest, ContentPart, Message, OpenAIClient};
//!
//! let client = OpenAIClient::from_env()?;
//!
//! let response = client.chat_completion(
//!     ChatRequest::new("gpt-4o-mini")
//!         .message(Message::system("Describe products."))
//!         .message(Message::user_parts(vec![
//!             ContentPart::text("What is this?"),
//!             ContentPart::image_bytes("image/jpeg", &bytes),
//!         ]))
//!         .json_object(),
//! ).await?;
//!
//! println!("{:?} {:?}", response.content, response.usage);
//! ```

pub mod error;
pub mod types;

pub use error::{OpenAIError, Result};
pub use types::*;

use reqwest::Client;
use std::time::Duration;
use tracing::{debug, warn};

const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// Pure OpenAI API client.
#[derive(Clone)]
pub struct OpenAIClient {
    http_client: Client,
    api_key: String,
    base_url: String,
}

impl OpenAIClient {
    /// Create a new OpenAI client with the given API key.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            http_client: Client::new(),
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }

    /// Create from environment variable `OPENAI_API_KEY`.
    pub fn from_env() -> Result<Self> {
        let api_key = std::env::var("OPENAI_API_KEY")
            .map_err(|_| OpenAIError::Config("OPENAI_API_KEY not set".into()))?;
        Ok(Self::new(api_key))
    }

    /// Set a custom base URL (for Azure, proxies, compatible gateways).
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    /// Set a request timeout on the underlying HTTP client.
    pub fn with_timeout(mut self, timeout: Duration) -> Result<Self> {
        self.http_client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| OpenAIError::Config(format!("failed to build HTTP client: {}", e)))?;
        Ok(self)
    }

    /// Get the base URL.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Chat completion.
    ///
    /// Returns the first choice with its refusal and finish reason, so
    /// callers can tell a safety block apart from an empty answer.
    pub async fn chat_completion(&self, request: ChatRequest) -> Result<ChatResponse> {
        let start = std::time::Instant::now();

        let response = self
            .http_client
            .post(format!("{}/chat/completions", self.base_url))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                warn!(error = %e, "OpenAI request failed");
                OpenAIError::Network(e.to_string())
            })?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            warn!(status = %status, error = %error_text, "OpenAI API error");
            return Err(OpenAIError::Api(format!(
                "OpenAI API error ({}): {}",
                status, error_text
            )));
        }

        let raw: types::ChatResponseRaw = response
            .json()
            .await
            .map_err(|e| OpenAIError::Parse(e.to_string()))?;

        let choice = raw
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| OpenAIError::Api("No response from OpenAI".into()))?;

        debug!(
            model = %request.model,
            duration_ms = start.elapsed().as_millis(),
            prompt_tokens = raw.usage.map(|u| u.prompt_tokens).unwrap_or(0),
            completion_tokens = raw.usage.map(|u| u.completion_tokens).unwrap_or(0),
            "OpenAI chat completion"
        );

        Ok(ChatResponse {
            content: choice.message.content,
            refusal: choice.message.refusal,
            finish_reason: choice.finish_reason,
            usage: raw.usage,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_builder() {
        let client = OpenAIClient::new("sk-test").with_base_url("https://custom.api.com/v1/");

        assert_eq!(client.api_key, "sk-test");
        assert_eq!(client.base_url(), "https://custom.api.com/v1");
    }

    #[test]
    fn test_raw_response_parses_usage_and_refusal() {
        let body = r#"{
            "choices": [{
                "message": {"role": "assistant", "content": null, "refusal": "no"},
                "finish_reason": "stop"
            }],
            "usage": {"prompt_tokens": 12, "completion_tokens": 3, "total_tokens": 15}
        }"#;

        let raw: types::ChatResponseRaw = serde_json::from_str(body).unwrap();
        assert_eq!(raw.usage.unwrap().prompt_tokens, 12);
        assert_eq!(raw.choices[0].message.refusal.as_deref(), Some("no"));
        assert!(raw.choices[0].message.content.is_none());
    }
}
