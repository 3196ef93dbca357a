//! Token cost accounting.
//!
//! Pure arithmetic over a per-integration pricing table. Prices are quoted
//! per million tokens in the provider's currency and converted to the
//! billing currency with one fixed exchange rate per integration.
//!
//! ```text
//! cost = tokens / 1_000_000 * price_per_million * exchange_rate
//! ```
//!
//! All amounts are [`Decimal`], so sums over a batch are exact.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

use crate::adapters::retailer::Retailer;
use crate::error::{ConfigError, ConfigResult};
use crate::types::outcome::{GenerationUsage, TokenUsage};

const TOKENS_PER_UNIT: u64 = 1_000_000;

/// Which side of a model call a token was on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Input,
    Output,
}

/// Pricing for one integration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PricingEntry {
    /// Provider price per million input tokens.
    pub input_per_million: Decimal,

    /// Provider price per million output tokens.
    pub output_per_million: Decimal,

    /// Multiplier from the provider currency to `currency`.
    #[serde(default = "default_exchange_rate")]
    pub exchange_rate: Decimal,

    /// Billing currency code.
    #[serde(default = "default_currency")]
    pub currency: String,

    /// Tokens of fixed prompt overhead billed once per model call but
    /// not included in the reported input count.
    #[serde(default)]
    pub system_prompt_tokens: u64,
}

fn default_exchange_rate() -> Decimal {
    Decimal::ONE
}

fn default_currency() -> String {
    "USD".to_string()
}

impl PricingEntry {
    /// Entry with no conversion (exchange rate 1, USD).
    pub fn new(input_per_million: Decimal, output_per_million: Decimal) -> Self {
        Self {
            input_per_million,
            output_per_million,
            exchange_rate: default_exchange_rate(),
            currency: default_currency(),
            system_prompt_tokens: 0,
        }
    }

    /// USD 0.10 / 0.40 per million tokens, billed in BRL at 5.10.
    pub fn reference() -> Self {
        Self {
            input_per_million: Decimal::new(10, 2),
            output_per_million: Decimal::new(40, 2),
            exchange_rate: Decimal::new(510, 2),
            currency: "BRL".to_string(),
            system_prompt_tokens: 0,
        }
    }

    pub fn with_exchange_rate(mut self, rate: Decimal, currency: impl Into<String>) -> Self {
        self.exchange_rate = rate;
        self.currency = currency.into();
        self
    }

    pub fn with_system_prompt_tokens(mut self, tokens: u64) -> Self {
        self.system_prompt_tokens = tokens;
        self
    }

    /// Price per million tokens in the billing currency.
    pub fn price_per_million(&self, direction: Direction) -> Decimal {
        let base = match direction {
            Direction::Input => self.input_per_million,
            Direction::Output => self.output_per_million,
        };
        base * self.exchange_rate
    }

    fn validate(&self, integration: &str) -> ConfigResult<()> {
        let negative = self.input_per_million.is_sign_negative()
            || self.output_per_million.is_sign_negative()
            || self.exchange_rate.is_sign_negative();
        if negative {
            return Err(ConfigError::Invalid {
                key: format!("pricing.{}", integration),
                reason: "prices and exchange rate must not be negative".into(),
            });
        }
        Ok(())
    }
}

/// Pricing entries keyed by integration.
///
/// Loaded once from configuration. A batch copies the entry it needs at
/// start, so replacing the table later never changes past costs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PricingTable {
    entries: BTreeMap<String, PricingEntry>,
}

impl PricingTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reference pricing for every built-in integration.
    pub fn reference_defaults() -> Self {
        Retailer::ALL
            .iter()
            .fold(Self::new(), |table, retailer| {
                table.with_entry(retailer.key(), PricingEntry::reference())
            })
    }

    /// Parse a JSON object of `integration -> entry`.
    pub fn from_json(json: &str) -> ConfigResult<Self> {
        let table: Self = serde_json::from_str(json)?;
        for (integration, entry) in &table.entries {
            entry.validate(integration)?;
        }
        Ok(table)
    }

    /// Read a JSON pricing file.
    pub fn from_file(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    pub fn with_entry(mut self, integration: impl Into<String>, entry: PricingEntry) -> Self {
        self.entries.insert(integration.into(), entry);
        self
    }

    /// Entries from `other` replace entries with the same key.
    pub fn merge(mut self, other: PricingTable) -> Self {
        self.entries.extend(other.entries);
        self
    }

    pub fn get(&self, integration: &str) -> ConfigResult<&PricingEntry> {
        self.entries
            .get(integration)
            .ok_or_else(|| ConfigError::MissingPricing {
                integration: integration.to_string(),
            })
    }

    pub fn price_per_million_tokens(
        &self,
        integration: &str,
        direction: Direction,
    ) -> ConfigResult<Decimal> {
        Ok(self.get(integration)?.price_per_million(direction))
    }

    pub fn integrations(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }
}

/// Cost of `tokens` at `price_per_million`.
pub fn token_cost(tokens: u64, price_per_million: Decimal) -> Decimal {
    Decimal::from(tokens) / Decimal::from(TOKENS_PER_UNIT) * price_per_million
}

/// Price one item's token usage.
///
/// The system prompt overhead is added for each model call in `usage`.
pub fn price_usage(entry: &PricingEntry, usage: TokenUsage) -> GenerationUsage {
    let overhead = entry.system_prompt_tokens * u64::from(usage.model_calls);
    let billed_input = usage.input_tokens + overhead;
    let input_cost = token_cost(billed_input, entry.price_per_million(Direction::Input));
    let output_cost = token_cost(
        usage.output_tokens,
        entry.price_per_million(Direction::Output),
    );

    GenerationUsage {
        input_tokens: usage.input_tokens,
        output_tokens: usage.output_tokens,
        input_cost,
        output_cost,
        total_cost: input_cost + output_cost,
        currency: entry.currency.clone(),
    }
}
