//! Image-set extraction through a vision model.

use async_trait::async_trait;
use std::sync::Arc;
use tracing::debug;

use crate::error::{ItemError, ItemResult};
use crate::traits::adapter::{Extracted, ExtractionAdapter};
use crate::traits::vision::VisionService;
use crate::types::input::{InputUnit, SourceType};

/// Reads product attributes from photos of one product.
///
/// Validates the uploads before spending a model call, then delegates to a
/// [`VisionService`]. The vision call's tokens travel with the result so
/// they are billed with the item.
pub struct ImageSetAdapter {
    vision: Arc<dyn VisionService>,
}

impl ImageSetAdapter {
    pub fn new(vision: Arc<dyn VisionService>) -> Self {
        Self { vision }
    }
}

#[async_trait]
impl ExtractionAdapter for ImageSetAdapter {
    fn source_type(&self) -> SourceType {
        SourceType::ImageSet
    }

    async fn extract(&self, input: &InputUnit) -> ItemResult<Extracted> {
        if input.source_type() != SourceType::ImageSet {
            panic!("image-set adapter received a {} input", input.source_type());
        }

        let images = input.images();
        if images.is_empty() {
            return Err(ItemError::ExtractionEmpty(format!(
                "{} has no images",
                input.id()
            )));
        }

        if let Some(bad) = images.iter().find(|i| !i.is_image()) {
            return Err(ItemError::Image {
                filename: bad.filename.clone(),
                reason: format!("{} is not a supported image type", bad.mime_type),
            });
        }

        if let Some(empty) = images.iter().find(|i| i.bytes.is_empty()) {
            return Err(ItemError::Image {
                filename: empty.filename.clone(),
                reason: "file is empty".to_string(),
            });
        }

        let extracted = self.vision.read_product(images).await?;

        debug!(
            input = %input.id(),
            images = images.len(),
            title = %extracted.product.title,
            input_tokens = extracted.usage.input_tokens,
            output_tokens = extracted.usage.output_tokens,
            "Read product from images"
        );

        if extracted.product.is_empty() {
            return Err(ItemError::ExtractionEmpty(format!(
                "no product details could be read from the photos of {}",
                input.id()
            )));
        }

        Ok(extracted)
    }
}
