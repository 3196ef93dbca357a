//! Batch inputs: product URLs and labeled image sets.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, LazyLock};

static PRODUCT_PREFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(product[_ ]?\d+)").expect("static regex"));

/// Which kind of payload an input carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SourceType {
    /// A product page URL, scraped by a retailer adapter.
    Url,
    /// A set of photos of one product, read by a vision model.
    ImageSet,
}

impl fmt::Display for SourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Url => f.write_str("url"),
            Self::ImageSet => f.write_str("image-set"),
        }
    }
}

/// One uploaded image.
///
/// Bytes are reference-counted so an image set can be handed to the
/// extraction and generation steps without copying.
#[derive(Debug, Clone)]
pub struct ImageBlob {
    pub filename: String,
    pub mime_type: String,
    pub bytes: Arc<[u8]>,
}

impl ImageBlob {
    /// Create a blob, guessing the MIME type from the file extension.
    pub fn new(filename: impl Into<String>, bytes: impl Into<Arc<[u8]>>) -> Self {
        let filename = filename.into();
        let mime_type = mime_guess::from_path(&filename)
            .first_or_octet_stream()
            .essence_str()
            .to_string();
        Self {
            filename,
            mime_type,
            bytes: bytes.into(),
        }
    }

    /// Whether the MIME type is an image type a vision model accepts.
    pub fn is_image(&self) -> bool {
        self.mime_type.starts_with("image/")
    }
}

/// Payload of an input.
#[derive(Debug, Clone)]
pub enum InputPayload {
    Url(String),
    ImageSet(Vec<ImageBlob>),
}

/// A unit of work submitted in a batch.
///
/// Fields are private: a unit is immutable once built.
#[derive(Debug, Clone)]
pub struct InputUnit {
    id: String,
    payload: InputPayload,
    instructions: Option<String>,
}

impl InputUnit {
    /// A product URL input. The URL doubles as the identifier.
    pub fn url(url: impl Into<String>) -> Self {
        let url = url.into().trim().to_string();
        Self {
            id: url.clone(),
            payload: InputPayload::Url(url),
            instructions: None,
        }
    }

    /// An image-set input with an explicit identifier.
    pub fn image_set(id: impl Into<String>, images: Vec<ImageBlob>) -> Self {
        Self {
            id: id.into(),
            payload: InputPayload::ImageSet(images),
            instructions: None,
        }
    }

    /// Override the identifier (e.g. when the caller numbers its URLs).
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    /// Attach free-text instructions for the description writer.
    /// Blank text clears them.
    pub fn with_instructions(mut self, instructions: impl Into<String>) -> Self {
        let instructions = instructions.into().trim().to_string();
        self.instructions = (!instructions.is_empty()).then_some(instructions);
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn payload(&self) -> &InputPayload {
        &self.payload
    }

    pub fn instructions(&self) -> Option<&str> {
        self.instructions.as_deref()
    }

    pub fn source_type(&self) -> SourceType {
        match self.payload {
            InputPayload::Url(_) => SourceType::Url,
            InputPayload::ImageSet(_) => SourceType::ImageSet,
        }
    }

    /// The URL, for URL inputs.
    pub fn as_url(&self) -> Option<&str> {
        match &self.payload {
            InputPayload::Url(url) => Some(url),
            InputPayload::ImageSet(_) => None,
        }
    }

    /// The images, for image-set inputs; empty for URLs.
    pub fn images(&self) -> &[ImageBlob] {
        match &self.payload {
            InputPayload::Url(_) => &[],
            InputPayload::ImageSet(images) => images,
        }
    }

    /// Lightweight reference kept on outcomes (no image bytes).
    pub fn to_ref(&self) -> InputRef {
        let label = match &self.payload {
            InputPayload::Url(url) => url.clone(),
            InputPayload::ImageSet(images) => images
                .iter()
                .map(|i| i.filename.as_str())
                .collect::<Vec<_>>()
                .join(", "),
        };
        InputRef {
            id: self.id.clone(),
            source_type: self.source_type(),
            label,
        }
    }
}

/// Serializable reference to the input an outcome belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputRef {
    pub id: String,
    pub source_type: SourceType,
    /// URL, or comma-separated filenames for image sets.
    pub label: String,
}

/// Number of unmatched uploads folded into one product.
pub const IMAGES_PER_UNLABELED_PRODUCT: usize = 3;

/// Group uploaded photos into one image-set input per product.
///
/// Files named `product1_a.jpg`, `Product 1 b.jpg` ... are grouped by their
/// `productN` prefix, in order of first appearance. Files without the
/// prefix are grouped [`IMAGES_PER_UNLABELED_PRODUCT`] at a time in upload
/// order and appended after the labeled groups.
pub fn group_images(files: Vec<ImageBlob>) -> Vec<InputUnit> {
    let mut order: Vec<String> = Vec::new();
    let mut groups: HashMap<String, Vec<ImageBlob>> = HashMap::new();
    let mut unmatched: Vec<ImageBlob> = Vec::new();

    for file in files {
        let lowered = file.filename.to_lowercase();
        match PRODUCT_PREFIX.captures(&lowered).and_then(|c| c.get(1)) {
            Some(m) => {
                let key = m.as_str().replace(' ', "_");
                if !groups.contains_key(&key) {
                    order.push(key.clone());
                }
                groups.entry(key).or_default().push(file);
            }
            None => unmatched.push(file),
        }
    }

    for chunk in unmatched.chunks(IMAGES_PER_UNLABELED_PRODUCT) {
        let mut n = order.len() + 1;
        let mut key = format!("product_{}", n);
        while groups.contains_key(&key) {
            n += 1;
            key = format!("product_{}", n);
        }
        order.push(key.clone());
        groups.insert(key, chunk.to_vec());
    }

    order
        .into_iter()
        .filter_map(|key| {
            let images = groups.remove(&key)?;
            Some(InputUnit::image_set(key, images))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn blob(name: &str) -> ImageBlob {
        ImageBlob::new(name, vec![0u8; 4])
    }

    #[test]
    fn test_url_input_uses_url_as_id() {
        let unit = InputUnit::url("  https://example.com/p/1 ");
        assert_eq!(unit.id(), "https://example.com/p/1");
        assert_eq!(unit.source_type(), SourceType::Url);
        assert_eq!(unit.as_url(), Some("https://example.com/p/1"));
        assert!(unit.images().is_empty());
    }

    #[test]
    fn test_blank_instructions_are_dropped() {
        let unit = InputUnit::url("https://example.com/p/1").with_instructions("  Foco em uso externo ");
        assert_eq!(unit.instructions(), Some("Foco em uso externo"));

        let cleared = unit.with_instructions("   ");
        assert_eq!(cleared.instructions(), None);
    }

    #[test]
    fn test_mime_type_guess() {
        assert_eq!(blob("a.JPG").mime_type, "image/jpeg");
        assert_eq!(blob("a.png").mime_type, "image/png");
        assert!(!blob("notes.bin").is_image());
    }

    #[test]
    fn test_image_ref_lists_filenames() {
        let unit = InputUnit::image_set("product1", vec![blob("a.jpg"), blob("b.jpg")]);
        let r = unit.to_ref();
        assert_eq!(r.source_type, SourceType::ImageSet);
        assert_eq!(r.label, "a.jpg, b.jpg");
    }

    #[test]
    fn test_group_images_by_prefix() {
        let units = group_images(vec![
            blob("product1_tag.jpg"),
            blob("product2_box.jpg"),
            blob("Product1_front.jpg"),
            blob("product 3 x.jpg"),
        ]);

        let ids: Vec<_> = units.iter().map(|u| u.id().to_string()).collect();
        assert_eq!(ids, vec!["product1", "product2", "product_3"]);
        assert_eq!(units[0].images().len(), 2);
        assert_eq!(units[1].images().len(), 1);
    }

    #[test]
    fn test_group_unmatched_in_threes() {
        let units = group_images(vec![
            blob("IMG_001.jpg"),
            blob("IMG_002.jpg"),
            blob("IMG_003.jpg"),
            blob("IMG_004.jpg"),
        ]);

        assert_eq!(units.len(), 2);
        assert_eq!(units[0].id(), "product_1");
        assert_eq!(units[0].images().len(), 3);
        assert_eq!(units[1].id(), "product_2");
        assert_eq!(units[1].images().len(), 1);
    }

    #[test]
    fn test_unmatched_ids_skip_taken_names() {
        let units = group_images(vec![blob("product_2_a.jpg"), blob("IMG_9.jpg")]);
        let ids: Vec<_> = units.iter().map(|u| u.id()).collect();
        assert_eq!(ids, vec!["product_2", "product_3"]);
    }
}
