//! Description generator trait.

use async_trait::async_trait;

use crate::adapters::Integration;
use crate::error::ItemResult;
use crate::types::input::ImageBlob;
use crate::types::outcome::TokenUsage;
use crate::types::product::ExtractionResult;

/// Per-item context passed alongside the extracted attributes.
#[derive(Debug, Clone, Copy)]
pub struct GenerationContext<'a> {
    /// Integration the batch runs for. Its display name is never
    /// mentioned in the copy.
    pub integration: &'a Integration,

    /// Original photos for image-set inputs; empty for URLs.
    pub images: &'a [ImageBlob],

    /// Free-text instructions the operator attached to this input.
    pub instructions: Option<&'a str>,
}

/// Generated marketing copy and the tokens it cost.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Generated {
    pub text: String,
    pub usage: TokenUsage,
}

/// Writes marketplace-ready product descriptions.
///
/// Implementations wrap a generative model and report token usage exactly
/// as the model returned it. A reply without usable text must be an error,
/// never an empty `Generated`.
#[async_trait]
pub trait DescriptionGenerator: Send + Sync {
    async fn generate(
        &self,
        product: &ExtractionResult,
        context: &GenerationContext<'_>,
    ) -> ItemResult<Generated>;
}
