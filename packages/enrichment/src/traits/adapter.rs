//! Extraction adapter trait.
//!
//! One implementation per retailer or source kind. An adapter turns one
//! [`InputUnit`] into raw product attributes.
//!
//! # Usage
//!
//! ```rust,ignore
//! use enrichment::traits::adapter::ExtractionAdapter;
//!
//! let extracted = adapter.extract(&InputUnit::url("https://example.com/p/1")).await?;
//! println!("{}", extracted.product.title);
//! ```

use async_trait::async_trait;

use crate::error::ItemResult;
use crate::types::input::{InputUnit, SourceType};
use crate::types::outcome::TokenUsage;
use crate::types::product::ExtractionResult;

/// What an adapter hands back for one input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Extracted {
    pub product: ExtractionResult,

    /// Tokens spent during extraction. Zero for plain scraping; a vision
    /// adapter reports the tokens of its model call here.
    pub usage: TokenUsage,
}

impl Extracted {
    pub fn scraped(product: ExtractionResult) -> Self {
        Self {
            product,
            usage: TokenUsage::default(),
        }
    }

    pub fn with_usage(product: ExtractionResult, usage: TokenUsage) -> Self {
        Self { product, usage }
    }
}

/// Extracts product attributes from one input.
///
/// Implementations must not cache or de-duplicate: two identical inputs are
/// fetched twice. Errors are item-level and their messages reach end users.
#[async_trait]
pub trait ExtractionAdapter: Send + Sync {
    /// The only source type this adapter accepts.
    fn source_type(&self) -> SourceType;

    /// Extract attributes from `input`.
    ///
    /// Passing an input of another source type is a programming error; the
    /// orchestrator checks tags before dispatching.
    async fn extract(&self, input: &InputUnit) -> ItemResult<Extracted>;
}
