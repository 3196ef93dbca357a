//! Report assembly.
//!
//! [`ReportAssembler`] turns an outcome list into a [`ReportTable`]: one
//! row per successful item, in input order. Failures are left out of the
//! rows; the batch summary still counts them. Persisting the table is the
//! job of a [`ReportWriter`].
//!
//! Each row carries the extracted attributes, the suggested marketplace
//! listing price (see [`listing`]) and the item's token cost.

pub mod csv;
pub mod listing;

use std::collections::HashSet;
use std::sync::Arc;
use tracing::debug;

use crate::adapters::Integration;
use crate::error::ReportError;
use crate::price::parse_price;
use crate::traits::report::ReportWriter;
use crate::types::outcome::{EnrichedProduct, ItemOutcome};
use crate::types::summary::ReportRef;

pub use self::csv::CsvReportWriter;
pub use self::listing::{ListingPricing, ListingQuote};

/// Column headers, in order.
pub const HEADERS: [&str; 24] = [
    "PRODUCT NAME",
    "PRODUCT TITLE",
    "BRAND",
    "IMAGE URLS",
    "EAN",
    "DESCRIPTION",
    "STORE PRICE",
    "DISCOUNT",
    "FREIGHT",
    "FEE",
    "STORE COST PRICE",
    "LISTING PRICE",
    "ROUNDED LISTING PRICE",
    "PROFIT %",
    "ROUNDED PROFIT %",
    "PROFIT",
    "ROUNDED PROFIT",
    "DESIRED PROFIT %",
    "INPUT TOKENS",
    "OUTPUT TOKENS",
    "INPUT COST",
    "OUTPUT COST",
    "TOTAL COST",
    "SOURCE",
];

/// Column index of `STORE PRICE`; the listing columns follow it.
pub const STORE_PRICE_COLUMN: usize = 6;

/// Column index of `TOTAL COST`.
pub const TOTAL_COST_COLUMN: usize = 22;

/// A tabular report ready to be written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportTable {
    /// Integration key, used in file names.
    pub integration: String,
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl ReportTable {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Brand applied to products sold under the store's own label.
#[derive(Debug, Clone, Default)]
struct HouseBrand {
    brand: String,
    input_ids: HashSet<String>,
}

/// Builds report tables and hands them to a writer.
#[derive(Clone)]
pub struct ReportAssembler {
    writer: Arc<dyn ReportWriter>,
    house_brand: Option<HouseBrand>,
    listing: ListingPricing,
}

impl ReportAssembler {
    pub fn new(writer: Arc<dyn ReportWriter>) -> Self {
        Self {
            writer,
            house_brand: None,
            listing: ListingPricing::default(),
        }
    }

    /// Margin, tax, discount, freight and fee used for the listing columns.
    pub fn with_listing_pricing(mut self, listing: ListingPricing) -> Self {
        self.listing = listing;
        self
    }

    /// Replace the brand of the listed inputs with `brand`.
    pub fn with_house_brand<I, S>(mut self, brand: impl Into<String>, input_ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.house_brand = Some(HouseBrand {
            brand: brand.into(),
            input_ids: input_ids.into_iter().map(Into::into).collect(),
        });
        self
    }

    /// Build the table for an outcome list. Pure; nothing is written.
    pub fn assemble(&self, integration: &Integration, outcomes: &[ItemOutcome]) -> ReportTable {
        let rows = outcomes
            .iter()
            .filter_map(ItemOutcome::as_success)
            .map(|product| self.row(product))
            .collect();

        ReportTable {
            integration: integration.key.clone(),
            headers: HEADERS.iter().map(|h| h.to_string()).collect(),
            rows,
        }
    }

    /// Assemble and write. Returns `None` when there is nothing to write.
    pub async fn write(
        &self,
        integration: &Integration,
        outcomes: &[ItemOutcome],
    ) -> Result<Option<ReportRef>, ReportError> {
        let table = self.assemble(integration, outcomes);
        if table.is_empty() {
            debug!(integration = %integration.key, "No successful items; report skipped");
            return Ok(None);
        }
        self.writer.write_report(&table).await.map(Some)
    }

    fn brand_for(&self, product: &EnrichedProduct) -> String {
        match &self.house_brand {
            Some(house) if house.input_ids.contains(&product.input.id) => house.brand.clone(),
            _ => product.product.effective_brand(),
        }
    }

    fn row(&self, item: &EnrichedProduct) -> Vec<String> {
        let product = &item.product;
        let usage = &item.usage;
        let store_price = parse_price(&product.price);

        let mut row = vec![
            product.display_name().to_string(),
            String::new(),
            self.brand_for(item),
            product.image_urls.join(", "),
            product.ean.clone(),
            product.description.clone().unwrap_or_default(),
            format!("{:.2}", store_price),
        ];
        row.extend(self.listing.columns(store_price));
        row.extend([
            usage.input_tokens.to_string(),
            usage.output_tokens.to_string(),
            usage.input_cost.normalize().to_string(),
            usage.output_cost.normalize().to_string(),
            usage.total_cost.normalize().to_string(),
            item.input.label.clone(),
        ]);
        row
    }
}
