//! Batch summary and the value returned by a batch run.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::outcome::{ItemOutcome, TokenUsage};

/// Where a written report can be found.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportRef {
    /// Local path of the file.
    pub path: String,
    /// Reference handed to clients, e.g. `/exports/<file>`.
    pub download_url: String,
    /// Number of data rows written.
    pub rows: usize,
}

/// JSON summary of a batch.
///
/// Always derived from the full outcome list; never updated in place.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchSummary {
    pub integration: String,
    pub total_count: usize,
    pub success_count: usize,
    pub failure_count: usize,
    pub input_tokens: u64,
    pub output_tokens: u64,
    pub total_cost: Decimal,
    pub currency: String,
    pub report: Option<ReportRef>,
}

impl BatchSummary {
    /// Fold an outcome list into a summary.
    pub fn from_outcomes(
        integration: impl Into<String>,
        currency: impl Into<String>,
        outcomes: &[ItemOutcome],
    ) -> Self {
        let mut tokens = TokenUsage::default();
        let mut total_cost = Decimal::ZERO;
        let mut success_count = 0;

        for product in outcomes.iter().filter_map(ItemOutcome::as_success) {
            success_count += 1;
            tokens = tokens + product.usage.tokens();
            total_cost += product.usage.total_cost;
        }

        Self {
            integration: integration.into(),
            total_count: outcomes.len(),
            success_count,
            failure_count: outcomes.len() - success_count,
            input_tokens: tokens.input_tokens,
            output_tokens: tokens.output_tokens,
            total_cost,
            currency: currency.into(),
            report: None,
        }
    }

    pub fn with_report(mut self, report: ReportRef) -> Self {
        self.report = Some(report);
        self
    }
}

/// Everything a batch run produces.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchReport {
    /// One outcome per input, in submission order.
    pub outcomes: Vec<ItemOutcome>,
    pub summary: BatchSummary,
}
