//! Marketplace listing price suggestions.
//!
//! For each store price the report suggests a listing price that leaves
//! the desired margin after marketplace fee and tax:
//!
//! ```text
//! base    = store_price * (100 - discount%) / 100 + freight
//! listing = base / (1 - fee% / 100 - tax_rate - desired_margin)
//! rounded = MROUND(listing, 10) - 0.10
//! cost    = base + (fee% / 100) * listing + tax_rate * listing
//! profit  = listing - cost
//! ```
//!
//! Everything is computed in [`Decimal`] and rounded half away from zero
//! only when formatted.

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, ConfigResult};

/// Headers of the listing columns, in order.
pub const LISTING_HEADERS: [&str; 11] = [
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
];

const ROUNDING_STEP: Decimal = Decimal::TEN;
const HUNDRED: Decimal = Decimal::ONE_HUNDRED;

/// Inputs of the listing price formula.
///
/// Rates (`tax_rate`, `desired_margin`) are fractions; `discount_percent`
/// and `fee_percent` are percentages, as operators type them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListingPricing {
    pub tax_rate: Decimal,
    pub desired_margin: Decimal,
    pub discount_percent: Decimal,
    /// Added to every product's cost, in the store currency.
    pub freight: Decimal,
    pub fee_percent: Decimal,
}

impl Default for ListingPricing {
    /// 6% tax, 15% margin, no discount, freight or fee.
    fn default() -> Self {
        Self {
            tax_rate: Decimal::new(6, 2),
            desired_margin: Decimal::new(15, 2),
            discount_percent: Decimal::ZERO,
            freight: Decimal::ZERO,
            fee_percent: Decimal::ZERO,
        }
    }
}

/// Computed listing figures for one product.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingQuote {
    pub store_cost: Decimal,
    pub listing_price: Decimal,
    pub rounded_listing_price: Decimal,
    pub profit: Decimal,
    pub rounded_profit: Decimal,
    /// Fraction of the listing price.
    pub profit_ratio: Decimal,
    pub rounded_profit_ratio: Decimal,
}

impl ListingPricing {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_tax_rate(mut self, rate: Decimal) -> Self {
        self.tax_rate = rate;
        self
    }

    pub fn with_desired_margin(mut self, margin: Decimal) -> Self {
        self.desired_margin = margin;
        self
    }

    pub fn with_discount_percent(mut self, percent: Decimal) -> Self {
        self.discount_percent = percent;
        self
    }

    pub fn with_freight(mut self, freight: Decimal) -> Self {
        self.freight = freight;
        self
    }

    pub fn with_fee_percent(mut self, percent: Decimal) -> Self {
        self.fee_percent = percent;
        self
    }

    /// Reject settings under which no listing price exists.
    pub fn validate(&self) -> ConfigResult<()> {
        let negative = [
            self.tax_rate,
            self.desired_margin,
            self.discount_percent,
            self.freight,
            self.fee_percent,
        ]
        .iter()
        .any(Decimal::is_sign_negative);
        if negative {
            return Err(ConfigError::Invalid {
                key: "listing".into(),
                reason: "rates, percentages and freight must not be negative".into(),
            });
        }
        if self.denominator() <= Decimal::ZERO {
            return Err(ConfigError::Invalid {
                key: "listing".into(),
                reason: "fee, tax and margin must add up to less than 100%".into(),
            });
        }
        Ok(())
    }

    fn denominator(&self) -> Decimal {
        Decimal::ONE - self.fee_percent / HUNDRED - self.tax_rate - self.desired_margin
    }

    /// Figures for `store_price`, or `None` when the price is unknown or
    /// the settings leave no room for a listing price.
    pub fn quote(&self, store_price: Decimal) -> Option<ListingQuote> {
        let denominator = self.denominator();
        if store_price <= Decimal::ZERO || denominator <= Decimal::ZERO {
            return None;
        }

        let base = store_price * (HUNDRED - self.discount_percent) / HUNDRED + self.freight;
        let listing_price = base.checked_div(denominator)?;
        let rounded_listing_price = listing_price
            .checked_div(ROUNDING_STEP)?
            .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
            * ROUNDING_STEP
            - Decimal::new(10, 2);

        let store_cost =
            base + self.fee_percent / HUNDRED * listing_price + self.tax_rate * listing_price;
        let profit = listing_price - store_cost;
        let rounded_profit = rounded_listing_price - store_cost;

        Some(ListingQuote {
            store_cost,
            listing_price,
            rounded_listing_price,
            profit,
            rounded_profit,
            profit_ratio: profit.checked_div(listing_price)?,
            rounded_profit_ratio: rounded_profit.checked_div(rounded_listing_price)?,
        })
    }

    /// Cells for [`LISTING_HEADERS`]. Computed cells are blank when no
    /// quote exists.
    pub fn columns(&self, store_price: Decimal) -> Vec<String> {
        let mut cells = vec![
            self.discount_percent.normalize().to_string(),
            money(self.freight),
            self.fee_percent.normalize().to_string(),
        ];

        match self.quote(store_price) {
            Some(quote) => cells.extend([
                money(quote.store_cost),
                money(quote.listing_price),
                money(quote.rounded_listing_price),
                percent(quote.profit_ratio),
                percent(quote.rounded_profit_ratio),
                money(quote.profit),
                money(quote.rounded_profit),
            ]),
            None => cells.extend(std::iter::repeat(String::new()).take(7)),
        }

        cells.push(percent(self.desired_margin));
        cells
    }
}

fn money(amount: Decimal) -> String {
    format!(
        "{:.2}",
        amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
    )
}

fn percent(ratio: Decimal) -> String {
    format!(
        "{:.2}%",
        (ratio * HUNDRED).round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn test_default_margin_and_tax() {
        let cells = ListingPricing::default().columns(dec("100"));

        assert_eq!(cells.len(), LISTING_HEADERS.len());
        assert_eq!(
            cells,
            vec![
                "0", "0.00", "0", "107.59", "126.58", "129.90", "15.00%", "17.17%", "18.99",
                "22.31", "15.00%",
            ]
        );
    }

    #[test]
    fn test_discount_freight_and_fee() {
        let pricing = ListingPricing::new()
            .with_discount_percent(dec("10"))
            .with_freight(dec("20"))
            .with_fee_percent(dec("12"));
        let quote = pricing.quote(dec("200")).unwrap();

        assert_eq!(money(quote.store_cost), "253.73");
        assert_eq!(money(quote.listing_price), "298.51");
        assert_eq!(quote.rounded_listing_price, dec("299.90"));
        assert_eq!(money(quote.profit), "44.78");
        assert_eq!(money(quote.rounded_profit), "46.17");
        assert_eq!(percent(quote.profit_ratio), "15.00%");
        assert_eq!(percent(quote.rounded_profit_ratio), "15.39%");
    }

    #[test]
    fn test_profit_ratio_matches_desired_margin() {
        let pricing = ListingPricing::new().with_desired_margin(dec("0.20"));
        let quote = pricing.quote(dec("1190.43")).unwrap();
        assert_eq!(percent(quote.profit_ratio), "20.00%");
    }

    #[test]
    fn test_rounding_midpoint_goes_up() {
        // base 79 -> listing exactly 100 -> 100; base 82.95 -> 105 -> 110
        let pricing = ListingPricing::default();
        assert_eq!(pricing.quote(dec("79")).unwrap().rounded_listing_price, dec("99.90"));
        assert_eq!(
            pricing.quote(dec("82.95")).unwrap().rounded_listing_price,
            dec("109.90")
        );
    }

    #[test]
    fn test_unknown_price_leaves_cells_blank() {
        let cells = ListingPricing::default().columns(Decimal::ZERO);
        assert_eq!(cells.len(), LISTING_HEADERS.len());
        assert!(cells[3..10].iter().all(String::is_empty));
        assert_eq!(cells[10], "15.00%");
    }

    #[test]
    fn test_impossible_settings() {
        let pricing = ListingPricing::new().with_fee_percent(dec("80"));
        assert!(pricing.quote(dec("100")).is_none());
        assert!(matches!(pricing.validate(), Err(ConfigError::Invalid { .. })));

        let negative = ListingPricing::new().with_freight(dec("-1"));
        assert!(negative.validate().is_err());
        assert!(ListingPricing::default().validate().is_ok());
    }
}
