//! Extraction adapters and the registry that maps integrations to them.

pub mod html;
pub mod image_set;
pub mod retailer;

use std::collections::HashMap;
use std::sync::Arc;

use crate::error::{ConfigError, ConfigResult};
use crate::traits::adapter::ExtractionAdapter;
use crate::traits::vision::VisionService;
use crate::types::input::SourceType;

pub use html::HtmlProductAdapter;
pub use image_set::ImageSetAdapter;
pub use retailer::Retailer;

/// Static description of an integration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Integration {
    /// Key used for pricing lookups and report file names.
    pub key: String,
    pub display_name: String,
    pub source_type: SourceType,
}

impl Integration {
    pub fn new(key: impl Into<String>, source_type: SourceType) -> Self {
        let key = key.into();
        Self {
            display_name: key.clone(),
            key,
            source_type,
        }
    }

    pub fn with_display_name(mut self, name: impl Into<String>) -> Self {
        self.display_name = name.into();
        self
    }
}

impl From<Retailer> for Integration {
    fn from(retailer: Retailer) -> Self {
        Integration::new(retailer.key(), retailer.source_type())
            .with_display_name(retailer.display_name())
    }
}

#[derive(Clone)]
struct Registered {
    integration: Integration,
    adapter: Arc<dyn ExtractionAdapter>,
}

/// Integration key -> adapter.
///
/// The adapter set is closed per process: a new retailer is one more
/// `register` call.
#[derive(Clone, Default)]
pub struct AdapterRegistry {
    entries: HashMap<String, Registered>,
}

impl AdapterRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an adapter. Its source type must match the integration's.
    pub fn register(
        mut self,
        integration: impl Into<Integration>,
        adapter: Arc<dyn ExtractionAdapter>,
    ) -> ConfigResult<Self> {
        let integration = integration.into();
        if adapter.source_type() != integration.source_type {
            return Err(ConfigError::Invalid {
                key: format!("adapter.{}", integration.key),
                reason: format!(
                    "adapter reads {} inputs but the integration takes {}",
                    adapter.source_type(),
                    integration.source_type
                ),
            });
        }

        self.entries.insert(
            integration.key.clone(),
            Registered {
                integration,
                adapter,
            },
        );
        Ok(self)
    }

    /// Every built-in retailer: scrapers for URL retailers and a vision
    /// adapter for Sam's Club. One HTTP client is shared by all scrapers.
    pub fn builtin(vision: Arc<dyn VisionService>) -> ConfigResult<Self> {
        let client = html::default_client()?;

        Retailer::ALL
            .into_iter()
            .try_fold(Self::new(), |registry, retailer| {
                let adapter: Arc<dyn ExtractionAdapter> = match retailer.source_type() {
                    SourceType::Url => {
                        Arc::new(HtmlProductAdapter::with_client(retailer, client.clone()))
                    }
                    SourceType::ImageSet => Arc::new(ImageSetAdapter::new(vision.clone())),
                };
                registry.register(retailer, adapter)
            })
    }

    pub fn resolve(
        &self,
        key: &str,
    ) -> ConfigResult<(&Integration, &Arc<dyn ExtractionAdapter>)> {
        self.entries
            .get(key)
            .map(|r| (&r.integration, &r.adapter))
            .ok_or_else(|| ConfigError::UnknownIntegration(key.to_string()))
    }

    pub fn integrations(&self) -> impl Iterator<Item = &Integration> {
        self.entries.values().map(|r| &r.integration)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{MockAdapter, MockVision};

    #[test]
    fn test_builtin_registry_covers_retailers() {
        let registry = AdapterRegistry::builtin(Arc::new(MockVision::new())).unwrap();
        for retailer in Retailer::ALL {
            let (integration, adapter) = registry.resolve(retailer.key()).unwrap();
            assert_eq!(integration.display_name, retailer.display_name());
            assert_eq!(adapter.source_type(), retailer.source_type());
        }
    }

    #[test]
    fn test_unknown_integration() {
        let err = AdapterRegistry::new().resolve("magalu").err().unwrap();
        assert!(matches!(err, ConfigError::UnknownIntegration(ref k) if k == "magalu"));
    }

    #[test]
    fn test_source_type_mismatch_rejected() {
        let result = AdapterRegistry::new().register(
            Retailer::SamsClub,
            Arc::new(MockAdapter::new(SourceType::Url)),
        );
        assert!(matches!(result, Err(ConfigError::Invalid { .. })));
    }
}
