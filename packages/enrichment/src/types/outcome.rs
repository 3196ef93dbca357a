//! Per-item outcomes and token usage.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::ops::Add;

use super::input::InputRef;
use super::product::ExtractionResult;

/// Raw token counts reported by model calls.
///
/// The default value stands for no call at all; [`TokenUsage::new`] is
/// the usage of exactly one call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    pub input_tokens: u64,
    pub output_tokens: u64,
    /// Number of model calls these counts add up.
    #[serde(default)]
    pub model_calls: u32,
}

impl TokenUsage {
    /// Usage of a single model call.
    pub fn new(input_tokens: u64, output_tokens: u64) -> Self {
        Self {
            input_tokens,
            output_tokens,
            model_calls: 1,
        }
    }

    pub fn total(&self) -> u64 {
        self.input_tokens + self.output_tokens
    }
}

impl Add for TokenUsage {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self {
            input_tokens: self.input_tokens + rhs.input_tokens,
            output_tokens: self.output_tokens + rhs.output_tokens,
            model_calls: self.model_calls + rhs.model_calls,
        }
    }
}

/// Token counts plus their cost, computed once right after generation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationUsage {
    pub input_tokens: u64,
    pub output_tokens: u64,
    pub input_cost: Decimal,
    pub output_cost: Decimal,
    pub total_cost: Decimal,
    pub currency: String,
}

impl GenerationUsage {
    pub fn tokens(&self) -> TokenUsage {
        TokenUsage::new(self.input_tokens, self.output_tokens)
    }
}

/// A successfully enriched product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnrichedProduct {
    pub input: InputRef,
    /// Extracted attributes with `description` filled in.
    pub product: ExtractionResult,
    pub usage: GenerationUsage,
}

/// A failed item with a message fit for end users.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemFailure {
    pub input: InputRef,
    pub error: String,
}

/// Result of processing one input. Exactly one per input, in input order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ItemOutcome {
    Success(EnrichedProduct),
    Failure(ItemFailure),
}

impl ItemOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    pub fn input(&self) -> &InputRef {
        match self {
            Self::Success(p) => &p.input,
            Self::Failure(f) => &f.input,
        }
    }

    /// Cost of this item; zero for failures.
    pub fn cost(&self) -> Decimal {
        match self {
            Self::Success(p) => p.usage.total_cost,
            Self::Failure(_) => Decimal::ZERO,
        }
    }

    pub fn as_success(&self) -> Option<&EnrichedProduct> {
        match self {
            Self::Success(p) => Some(p),
            Self::Failure(_) => None,
        }
    }
}
