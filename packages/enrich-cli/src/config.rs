use anyhow::{Context, Result};
use dotenvy::dotenv;
use enrichment::{AiCredentials, BatchConfig, ListingPricing, PricingTable};
use rust_decimal::Decimal;
use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

/// Runner configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct EnrichConfig {
    pub credentials: AiCredentials,
    pub exports_dir: PathBuf,
    pub pricing: PricingTable,
    pub batch: BatchConfig,
    pub listing: ListingPricing,
}

impl EnrichConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        // Load .env file if present (development)
        let _ = dotenv();

        let api_key = env::var("OPENAI_API_KEY").context("OPENAI_API_KEY must be set")?;
        let mut credentials = AiCredentials::new(api_key)?;
        if let Ok(model) = env::var("ENRICH_TEXT_MODEL") {
            credentials = credentials.with_text_model(model);
        }
        if let Ok(model) = env::var("ENRICH_VISION_MODEL") {
            credentials = credentials.with_vision_model(model);
        }
        if let Ok(url) = env::var("OPENAI_BASE_URL") {
            credentials = credentials.with_base_url(url);
        }
        if let Ok(secs) = env::var("ENRICH_AI_TIMEOUT_SECS") {
            let secs: u64 = secs
                .parse()
                .context("ENRICH_AI_TIMEOUT_SECS must be a valid number")?;
            credentials = credentials.with_request_timeout(Duration::from_secs(secs));
        }

        let batch = BatchConfig::new()
            .with_concurrency(
                env::var("ENRICH_CONCURRENCY")
                    .unwrap_or_else(|_| "5".to_string())
                    .parse()
                    .context("ENRICH_CONCURRENCY must be a valid number")?,
            )
            .with_item_timeout_secs(
                env::var("ENRICH_ITEM_TIMEOUT_SECS")
                    .unwrap_or_else(|_| "120".to_string())
                    .parse()
                    .context("ENRICH_ITEM_TIMEOUT_SECS must be a valid number")?,
            );
        batch.validate()?;

        Ok(Self {
            credentials,
            exports_dir: env::var("ENRICH_EXPORTS_DIR")
                .unwrap_or_else(|_| "exports".to_string())
                .into(),
            pricing: load_pricing()?,
            batch,
            listing: load_listing()?,
        })
    }
}

/// Listing price settings; unset variables keep the defaults.
pub fn load_listing() -> Result<ListingPricing> {
    let mut listing = ListingPricing::default();
    if let Some(rate) = decimal_var("ENRICH_TAX_RATE")? {
        listing = listing.with_tax_rate(rate);
    }
    if let Some(margin) = decimal_var("ENRICH_DESIRED_MARGIN")? {
        listing = listing.with_desired_margin(margin);
    }
    if let Some(percent) = decimal_var("ENRICH_DISCOUNT_PERCENT")? {
        listing = listing.with_discount_percent(percent);
    }
    if let Some(freight) = decimal_var("ENRICH_FREIGHT")? {
        listing = listing.with_freight(freight);
    }
    if let Some(percent) = decimal_var("ENRICH_FEE_PERCENT")? {
        listing = listing.with_fee_percent(percent);
    }
    listing.validate()?;
    Ok(listing)
}

fn decimal_var(name: &str) -> Result<Option<Decimal>> {
    match env::var(name) {
        Ok(value) => Decimal::from_str(value.trim())
            .map(Some)
            .with_context(|| format!("{} must be a decimal number", name)),
        Err(_) => Ok(None),
    }
}

/// Built-in pricing, overridden per integration by `ENRICH_PRICING_FILE`.
pub fn load_pricing() -> Result<PricingTable> {
    let _ = dotenv();

    let defaults = PricingTable::reference_defaults();
    match env::var("ENRICH_PRICING_FILE") {
        Ok(path) => {
            let overrides = PricingTable::from_file(&path)
                .with_context(|| format!("Failed to load pricing from {}", path))?;
            Ok(defaults.merge(overrides))
        }
        Err(_) => Ok(defaults),
    }
}
