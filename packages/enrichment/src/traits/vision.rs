//! Vision service trait used by image-set extraction.

use async_trait::async_trait;

use crate::error::ItemResult;
use crate::traits::adapter::Extracted;
use crate::types::input::ImageBlob;

/// Reads product attributes from photos of one product.
///
/// Returns the attributes together with the tokens of the model call.
#[async_trait]
pub trait VisionService: Send + Sync {
    async fn read_product(&self, images: &[ImageBlob]) -> ItemResult<Extracted>;
}
