//! Testing utilities including mock implementations.
//!
//! These are useful for testing applications that use the enrichment
//! library without making real network or AI calls.

use async_trait::async_trait;
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, RwLock};
use std::time::Duration;

use crate::cost::{price_usage, PricingEntry};
use crate::error::{ItemError, ItemResult, ReportError};
use crate::report::ReportTable;
use crate::traits::adapter::{Extracted, ExtractionAdapter};
use crate::traits::generator::{DescriptionGenerator, Generated, GenerationContext};
use crate::traits::report::ReportWriter;
use crate::traits::vision::VisionService;
use crate::types::input::{ImageBlob, InputRef, InputUnit, SourceType};
use crate::types::outcome::{EnrichedProduct, ItemFailure, ItemOutcome, TokenUsage};
use crate::types::product::ExtractionResult;
use crate::types::summary::ReportRef;

/// A mock extraction adapter.
///
/// Returns configured products or errors per input id. Unknown ids get a
/// product titled `"Product <id>"`. Tracks calls and peak concurrency.
pub struct MockAdapter {
    source_type: SourceType,

    /// Predefined products by input id
    products: Arc<RwLock<HashMap<String, Extracted>>>,

    /// Predefined errors by input id
    errors: Arc<RwLock<HashMap<String, ItemError>>>,

    /// Artificial latency by input id
    delays: Arc<RwLock<HashMap<String, Duration>>>,

    /// Input ids in call order
    calls: Arc<RwLock<Vec<String>>>,

    in_flight: Arc<AtomicUsize>,
    peak: Arc<AtomicUsize>,
}

impl MockAdapter {
    pub fn new(source_type: SourceType) -> Self {
        Self {
            source_type,
            products: Default::default(),
            errors: Default::default(),
            delays: Default::default(),
            calls: Default::default(),
            in_flight: Default::default(),
            peak: Default::default(),
        }
    }

    /// Mock for URL integrations.
    pub fn urls() -> Self {
        Self::new(SourceType::Url)
    }

    /// Return `product` for input `id`.
    pub fn with_product(self, id: impl Into<String>, product: ExtractionResult) -> Self {
        self.products
            .write()
            .unwrap()
            .insert(id.into(), Extracted::scraped(product));
        self
    }

    /// Return `product` and report extraction tokens for input `id`.
    pub fn with_extraction(self, id: impl Into<String>, extracted: Extracted) -> Self {
        self.products.write().unwrap().insert(id.into(), extracted);
        self
    }

    /// Fail input `id` with `error`.
    pub fn with_error(self, id: impl Into<String>, error: ItemError) -> Self {
        self.errors.write().unwrap().insert(id.into(), error);
        self
    }

    /// Sleep before answering for input `id`.
    pub fn with_delay(self, id: impl Into<String>, delay: Duration) -> Self {
        self.delays.write().unwrap().insert(id.into(), delay);
        self
    }

    /// Input ids in call order.
    pub fn calls(&self) -> Vec<String> {
        self.calls.read().unwrap().clone()
    }

    /// Highest number of calls that were in flight at once.
    pub fn peak_concurrency(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ExtractionAdapter for MockAdapter {
    fn source_type(&self) -> SourceType {
        self.source_type
    }

    async fn extract(&self, input: &InputUnit) -> ItemResult<Extracted> {
        let id = input.id().to_string();
        self.calls.write().unwrap().push(id.clone());

        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);

        let delay = self.delays.read().unwrap().get(&id).copied();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        } else {
            tokio::task::yield_now().await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        if let Some(error) = self.errors.read().unwrap().get(&id) {
            return Err(error.clone());
        }

        let product = self.products.read().unwrap().get(&id).cloned();
        Ok(product.unwrap_or_else(|| {
            Extracted::scraped(ExtractionResult::new().with_title(format!("Product {}", id)))
        }))
    }
}

/// A mock description generator.
///
/// Keyed by product title. Unknown titles get `"Description of <title>"`
/// and the default usage.
pub struct MockGenerator {
    texts: Arc<RwLock<HashMap<String, String>>>,
    usages: Arc<RwLock<HashMap<String, TokenUsage>>>,
    errors: Arc<RwLock<HashMap<String, ItemError>>>,
    default_usage: TokenUsage,

    /// Titles in call order
    calls: Arc<RwLock<Vec<String>>>,

    /// Image counts seen per call
    image_counts: Arc<RwLock<Vec<usize>>>,

    /// Per-item instructions seen per call
    instructions: Arc<RwLock<Vec<Option<String>>>>,

    /// Integration keys seen per call
    integrations: Arc<RwLock<Vec<String>>>,
}

impl Default for MockGenerator {
    fn default() -> Self {
        Self {
            texts: Default::default(),
            usages: Default::default(),
            errors: Default::default(),
            default_usage: TokenUsage::new(100, 50),
            calls: Default::default(),
            image_counts: Default::default(),
            instructions: Default::default(),
            integrations: Default::default(),
        }
    }
}

impl MockGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_default_usage(mut self, usage: TokenUsage) -> Self {
        self.default_usage = usage;
        self
    }

    pub fn with_text(self, title: impl Into<String>, text: impl Into<String>) -> Self {
        self.texts.write().unwrap().insert(title.into(), text.into());
        self
    }

    pub fn with_usage(self, title: impl Into<String>, usage: TokenUsage) -> Self {
        self.usages.write().unwrap().insert(title.into(), usage);
        self
    }

    pub fn with_error(self, title: impl Into<String>, error: ItemError) -> Self {
        self.errors.write().unwrap().insert(title.into(), error);
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.read().unwrap().clone()
    }

    pub fn image_counts(&self) -> Vec<usize> {
        self.image_counts.read().unwrap().clone()
    }

    pub fn instructions(&self) -> Vec<Option<String>> {
        self.instructions.read().unwrap().clone()
    }

    pub fn integrations(&self) -> Vec<String> {
        self.integrations.read().unwrap().clone()
    }
}

#[async_trait]
impl DescriptionGenerator for MockGenerator {
    async fn generate(
        &self,
        product: &ExtractionResult,
        context: &GenerationContext<'_>,
    ) -> ItemResult<Generated> {
        let title = product.title.clone();
        self.calls.write().unwrap().push(title.clone());
        self.image_counts.write().unwrap().push(context.images.len());
        self.instructions
            .write()
            .unwrap()
            .push(context.instructions.map(str::to_string));
        self.integrations
            .write()
            .unwrap()
            .push(context.integration.key.clone());

        if let Some(error) = self.errors.read().unwrap().get(&title) {
            return Err(error.clone());
        }

        let text = self
            .texts
            .read()
            .unwrap()
            .get(&title)
            .cloned()
            .unwrap_or_else(|| format!("Description of {}", title));
        let usage = self
            .usages
            .read()
            .unwrap()
            .get(&title)
            .copied()
            .unwrap_or(self.default_usage);

        Ok(Generated { text, usage })
    }
}

/// A mock vision service returning one configured reply.
#[derive(Default)]
pub struct MockVision {
    reply: Arc<RwLock<Option<ItemResult<Extracted>>>>,

    /// Image counts per call
    calls: Arc<RwLock<Vec<usize>>>,
}

impl MockVision {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_reply(self, product: ExtractionResult, usage: TokenUsage) -> Self {
        *self.reply.write().unwrap() = Some(Ok(Extracted::with_usage(product, usage)));
        self
    }

    pub fn with_error(self, error: ItemError) -> Self {
        *self.reply.write().unwrap() = Some(Err(error));
        self
    }

    pub fn calls(&self) -> Vec<usize> {
        self.calls.read().unwrap().clone()
    }
}

#[async_trait]
impl VisionService for MockVision {
    async fn read_product(&self, images: &[ImageBlob]) -> ItemResult<Extracted> {
        self.calls.write().unwrap().push(images.len());
        self.reply
            .read()
            .unwrap()
            .clone()
            .unwrap_or_else(|| Err(ItemError::malformed("mock vision", "no reply configured")))
    }
}

/// A report writer that keeps tables in memory.
#[derive(Default)]
pub struct MemoryReportWriter {
    tables: Arc<RwLock<Vec<ReportTable>>>,
    fail: bool,
}

impl MemoryReportWriter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every write fails.
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Default::default()
        }
    }

    /// Tables written so far.
    pub fn tables(&self) -> Vec<ReportTable> {
        self.tables.read().unwrap().clone()
    }
}

#[async_trait]
impl ReportWriter for MemoryReportWriter {
    async fn write_report(&self, table: &ReportTable) -> Result<ReportRef, ReportError> {
        if self.fail {
            return Err(ReportError::Writer("storage unavailable".into()));
        }

        let mut tables = self.tables.write().unwrap();
        tables.push(table.clone());
        Ok(ReportRef {
            path: format!("memory://{}/{}", table.integration, tables.len()),
            download_url: format!("/exports/{}_{}.csv", table.integration, tables.len()),
            rows: table.rows.len(),
        })
    }
}

/// Pricing used by [`success`]: 0.075 / 0.30 per million, no conversion.
pub fn test_pricing() -> PricingEntry {
    PricingEntry::new(Decimal::new(75, 3), Decimal::new(30, 2))
}

fn url_ref(id: &str) -> InputRef {
    InputUnit::url(id).to_ref()
}

/// A success outcome priced with [`test_pricing`].
pub fn success(
    id: &str,
    title: &str,
    price: &str,
    input_tokens: u64,
    output_tokens: u64,
) -> ItemOutcome {
    ItemOutcome::Success(EnrichedProduct {
        input: url_ref(id),
        product: ExtractionResult::new()
            .with_title(title)
            .with_price(price)
            .with_description(format!("Description of {}", title)),
        usage: price_usage(&test_pricing(), TokenUsage::new(input_tokens, output_tokens)),
    })
}

/// A failure outcome.
pub fn failure(id: &str, error: &str) -> ItemOutcome {
    ItemOutcome::Failure(ItemFailure {
        input: url_ref(id),
        error: error.to_string(),
    })
}
