//! OpenAI implementations of the generator and vision traits.
//!
//! # Example
//!
//! ```rust,ignore
//! use enrichment::ai::OpenAiDescriptionGenerator;
//! use openai_client::OpenAIClient;
//!
//! let client = OpenAIClient::from_env()?;
//! let generator = OpenAiDescriptionGenerator::new(client).with_model("gpt-4o-mini");
//! ```

use async_trait::async_trait;
use openai_client::{ChatRequest, ChatResponse, ContentPart, Message, OpenAIClient, OpenAIError};

use super::{parse, prompts};
use crate::error::{ItemError, ItemResult};
use crate::traits::adapter::Extracted;
use crate::traits::generator::{DescriptionGenerator, Generated, GenerationContext};
use crate::traits::vision::VisionService;
use crate::types::input::ImageBlob;
use crate::types::outcome::TokenUsage;
use crate::types::product::ExtractionResult;

const SERVICE: &str = "the AI service";

/// Default model for descriptions and vision.
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";

/// Map a client error to an item error without leaking response bodies.
fn item_error(err: OpenAIError) -> ItemError {
    match err {
        OpenAIError::Network(_) => ItemError::transport(SERVICE, "connection failed"),
        OpenAIError::Api(_) => ItemError::transport(SERVICE, "the request was rejected"),
        OpenAIError::Parse(_) => ItemError::malformed(SERVICE, "the reply could not be decoded"),
        OpenAIError::Config(reason) => ItemError::transport(SERVICE, reason),
    }
}

/// One call's usage. A reply without counts still counts as a call.
fn usage_of(response: &ChatResponse) -> TokenUsage {
    response
        .usage
        .map(|u| TokenUsage::new(u.prompt_tokens.into(), u.completion_tokens.into()))
        .unwrap_or_else(|| TokenUsage::new(0, 0))
}

/// Reply text, or `Refused` when the provider blocked the answer.
fn content_of(response: &ChatResponse) -> ItemResult<&str> {
    if response.is_refusal() {
        return Err(ItemError::Refused);
    }
    match response.content.as_deref() {
        Some(text) if !text.trim().is_empty() => Ok(text),
        _ => Err(ItemError::GenerationFormat(
            "the AI service returned an empty reply".into(),
        )),
    }
}

fn image_parts(images: &[ImageBlob]) -> Vec<ContentPart> {
    images
        .iter()
        .map(|image| ContentPart::image_bytes(&image.mime_type, &image.bytes))
        .collect()
}

/// Description generator backed by an OpenAI chat model.
#[derive(Clone)]
pub struct OpenAiDescriptionGenerator {
    client: OpenAIClient,
    model: String,
    temperature: f32,
}

impl OpenAiDescriptionGenerator {
    pub fn new(client: OpenAIClient) -> Self {
        Self {
            client,
            model: DEFAULT_MODEL.to_string(),
            temperature: 0.7,
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }
}

#[async_trait]
impl DescriptionGenerator for OpenAiDescriptionGenerator {
    async fn generate(
        &self,
        product: &ExtractionResult,
        context: &GenerationContext<'_>,
    ) -> ItemResult<Generated> {
        let prompt = prompts::description_prompt(product, context);

        // photos help the copy for image-set products
        let user = if context.images.is_empty() {
            Message::user(prompt)
        } else {
            let mut parts = vec![ContentPart::text(prompt)];
            parts.extend(image_parts(context.images));
            Message::user_parts(parts)
        };

        let request = ChatRequest::new(&self.model)
            .message(Message::system(prompts::DESCRIPTION_SYSTEM))
            .message(user)
            .temperature(self.temperature)
            .json_object();

        let response = self.client.chat_completion(request).await.map_err(item_error)?;
        let text = parse::description(content_of(&response)?)?;

        Ok(Generated {
            text,
            usage: usage_of(&response),
        })
    }
}

/// Vision reader backed by an OpenAI multimodal model.
#[derive(Clone)]
pub struct OpenAiVision {
    client: OpenAIClient,
    model: String,
}

impl OpenAiVision {
    pub fn new(client: OpenAIClient) -> Self {
        Self {
            client,
            model: DEFAULT_MODEL.to_string(),
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }
}

#[async_trait]
impl VisionService for OpenAiVision {
    async fn read_product(&self, images: &[ImageBlob]) -> ItemResult<Extracted> {
        let mut parts = vec![ContentPart::text(prompts::vision_prompt(images.len()))];
        parts.extend(image_parts(images));

        let request = ChatRequest::new(&self.model)
            .message(Message::system(prompts::VISION_SYSTEM))
            .message(Message::user_parts(parts))
            .temperature(0.0)
            .json_object();

        let response = self.client.chat_completion(request).await.map_err(item_error)?;
        let product = parse::vision_product(content_of(&response)?)?;

        Ok(Extracted::with_usage(product, usage_of(&response)))
    }
}
