//! Extracted product attributes.

use serde::{Deserialize, Serialize};

/// Attributes extracted from one source.
///
/// Every field is optional in practice: a missing field is an empty string
/// or empty list, never an error. `description` stays `None` until the
/// generator fills it in.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractionResult {
    #[serde(default)]
    pub title: String,

    /// Price as displayed by the retailer, e.g. `"R$ 1.190,43"`.
    #[serde(default)]
    pub price: String,

    #[serde(default)]
    pub brand: String,

    /// EAN / GTIN barcode.
    #[serde(default)]
    pub ean: String,

    #[serde(default)]
    pub image_urls: Vec<String>,

    /// Free-form `"key: value"` technical specifications.
    #[serde(default)]
    pub specifications: Vec<String>,

    #[serde(default)]
    pub description: Option<String>,

    /// Page the attributes came from, for URL sources.
    #[serde(default)]
    pub source_url: Option<String>,
}

impl ExtractionResult {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn with_price(mut self, price: impl Into<String>) -> Self {
        self.price = price.into();
        self
    }

    pub fn with_brand(mut self, brand: impl Into<String>) -> Self {
        self.brand = brand.into();
        self
    }

    pub fn with_ean(mut self, ean: impl Into<String>) -> Self {
        self.ean = ean.into();
        self
    }

    pub fn with_image(mut self, url: impl Into<String>) -> Self {
        self.image_urls.push(url.into());
        self
    }

    pub fn with_specification(mut self, spec: impl Into<String>) -> Self {
        self.specifications.push(spec.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_source_url(mut self, url: impl Into<String>) -> Self {
        self.source_url = Some(url.into());
        self
    }

    /// True when nothing at all was extracted.
    pub fn is_empty(&self) -> bool {
        self.title.trim().is_empty()
            && self.price.trim().is_empty()
            && self.brand.trim().is_empty()
            && self.ean.trim().is_empty()
            && self.image_urls.is_empty()
            && self.specifications.is_empty()
    }

    /// Brand, falling back to a `marca:` / `brand:` specification line.
    pub fn effective_brand(&self) -> String {
        if !self.brand.trim().is_empty() {
            return self.brand.trim().to_string();
        }

        self.specifications
            .iter()
            .find(|spec| {
                let lower = spec.to_lowercase();
                lower.contains("marca") || lower.contains("brand")
            })
            .map(|spec| match spec.split_once(':') {
                Some((_, value)) => value.trim().to_string(),
                None => spec.trim().to_string(),
            })
            .unwrap_or_default()
    }

    /// Best name for prompts and reports.
    pub fn display_name(&self) -> &str {
        if self.title.trim().is_empty() {
            "Unnamed product"
        } else {
            self.title.trim()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_detection() {
        assert!(ExtractionResult::new().is_empty());
        assert!(ExtractionResult::new().with_title("   ").is_empty());
        assert!(!ExtractionResult::new().with_ean("7898152416549").is_empty());
    }

    #[test]
    fn test_description_does_not_count_as_content() {
        let r = ExtractionResult::new().with_description("copy");
        assert!(r.is_empty());
    }

    #[test]
    fn test_effective_brand_prefers_field() {
        let r = ExtractionResult::new()
            .with_brand("WAP")
            .with_specification("Marca: Tramontina");
        assert_eq!(r.effective_brand(), "WAP");
    }

    #[test]
    fn test_effective_brand_from_specifications() {
        let r = ExtractionResult::new()
            .with_specification("Cor: Branco")
            .with_specification("Marca: Tramontina");
        assert_eq!(r.effective_brand(), "Tramontina");

        let none = ExtractionResult::new().with_specification("Cor: Branco");
        assert_eq!(none.effective_brand(), "");
    }
}
