//! Batch orchestrator.
//!
//! Runs every input of a batch through its integration's adapter, the
//! description generator and the cost accountant, with bounded concurrency.
//!
//! # Flow
//!
//! ```text
//! resolve integration + snapshot pricing      (config errors stop here)
//! check every input's source type             (mismatch stops here)
//! for each input, at most N at once:
//!     extract -> generate -> price            (errors become Failure)
//! collect outcomes into input-order slots
//! summarize, then write the report if anything succeeded
//! ```
//!
//! Item errors never escape [`BatchOrchestrator::run`]; only configuration
//! problems, source-type mismatches and cancellation do.

use futures::stream::{self, StreamExt};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::adapters::{AdapterRegistry, Integration};
use crate::cost::{price_usage, PricingEntry, PricingTable};
use crate::error::{BatchError, BatchResult, ItemError, ItemResult};
use crate::report::ReportAssembler;
use crate::traits::adapter::ExtractionAdapter;
use crate::traits::generator::{DescriptionGenerator, GenerationContext};
use crate::types::config::BatchConfig;
use crate::types::input::InputUnit;
use crate::types::outcome::{EnrichedProduct, ItemFailure, ItemOutcome};
use crate::types::summary::{BatchReport, BatchSummary};

/// Everything one item's chain needs, borrowed for the batch's lifetime.
struct Chain<'a> {
    integration: &'a Integration,
    adapter: &'a dyn ExtractionAdapter,
    generator: &'a dyn DescriptionGenerator,
    pricing: &'a PricingEntry,
}

impl Chain<'_> {
    async fn enrich(&self, input: &InputUnit) -> ItemResult<EnrichedProduct> {
        let extracted = self.adapter.extract(input).await?;

        let context = GenerationContext {
            integration: self.integration,
            images: input.images(),
            instructions: input.instructions(),
        };
        let generated = self.generator.generate(&extracted.product, &context).await?;

        if generated.text.trim().is_empty() {
            return Err(ItemError::GenerationFormat(
                "the AI service returned an empty description".into(),
            ));
        }

        let usage = price_usage(self.pricing, extracted.usage + generated.usage);

        Ok(EnrichedProduct {
            input: input.to_ref(),
            product: extracted.product.with_description(generated.text.trim()),
            usage,
        })
    }

    async fn process(&self, input: &InputUnit, config: &BatchConfig) -> ItemOutcome {
        let result = match tokio::time::timeout(config.item_timeout(), self.enrich(input)).await {
            Ok(result) => result,
            Err(_) => Err(ItemError::Timeout {
                seconds: config.item_timeout_secs,
            }),
        };

        match result {
            Ok(product) => {
                debug!(
                    input = %input.id(),
                    input_tokens = product.usage.input_tokens,
                    output_tokens = product.usage.output_tokens,
                    cost = %product.usage.total_cost,
                    "Item enriched"
                );
                ItemOutcome::Success(product)
            }
            Err(e) => {
                warn!(input = %input.id(), error = %e, "Item failed");
                ItemOutcome::Failure(ItemFailure {
                    input: input.to_ref(),
                    error: e.user_message(),
                })
            }
        }
    }
}

/// Runs enrichment batches.
///
/// Holds no per-batch state; one orchestrator can run any number of
/// batches, concurrently or not.
#[derive(Clone)]
pub struct BatchOrchestrator {
    adapters: AdapterRegistry,
    generator: Arc<dyn DescriptionGenerator>,
    pricing: PricingTable,
    config: BatchConfig,
    reporter: Option<ReportAssembler>,
}

impl BatchOrchestrator {
    pub fn new(
        adapters: AdapterRegistry,
        generator: Arc<dyn DescriptionGenerator>,
        pricing: PricingTable,
    ) -> Self {
        Self {
            adapters,
            generator,
            pricing,
            config: BatchConfig::default(),
            reporter: None,
        }
    }

    pub fn with_config(mut self, config: BatchConfig) -> Self {
        self.config = config;
        self
    }

    /// Write a report after each batch that has successes.
    pub fn with_reporter(mut self, reporter: ReportAssembler) -> Self {
        self.reporter = Some(reporter);
        self
    }

    /// Replace the pricing table. Batches already running keep the entry
    /// they started with.
    pub fn set_pricing(&mut self, pricing: PricingTable) {
        self.pricing = pricing;
    }

    pub fn config(&self) -> &BatchConfig {
        &self.config
    }

    /// Run one batch for `integration`.
    ///
    /// Returns one outcome per input in input order, and a summary derived
    /// from them. Cancelling `cancel` abandons in-flight items and returns
    /// [`BatchError::Cancelled`] without writing a report.
    pub async fn run(
        &self,
        integration: &str,
        inputs: &[InputUnit],
        cancel: &CancellationToken,
    ) -> BatchResult<BatchReport> {
        self.config.validate()?;
        let (integration, adapter) = self.adapters.resolve(integration)?;
        // copied so later table changes never touch this batch
        let pricing = self.pricing.get(&integration.key)?.clone();

        if let Some((index, input)) = inputs
            .iter()
            .enumerate()
            .find(|(_, input)| input.source_type() != integration.source_type)
        {
            return Err(BatchError::SourceMismatch {
                index,
                expected: integration.source_type,
                found: input.source_type(),
            });
        }

        info!(
            integration = %integration.key,
            items = inputs.len(),
            concurrency = self.config.concurrency,
            "Starting enrichment batch"
        );

        let chain = Chain {
            integration,
            adapter: adapter.as_ref(),
            generator: self.generator.as_ref(),
            pricing: &pricing,
        };

        let mut slots: Vec<Option<ItemOutcome>> = vec![None; inputs.len()];
        let chains = inputs.iter().enumerate().map(|(index, input)| {
            let chain = &chain;
            let config = &self.config;
            async move { (index, chain.process(input, config).await) }
        });
        let mut pending = stream::iter(chains).buffer_unordered(self.config.concurrency);

        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    warn!(
                        integration = %integration.key,
                        "Batch cancelled; discarding in-flight items"
                    );
                    return Err(BatchError::Cancelled);
                }
                next = pending.next() => match next {
                    Some((index, outcome)) => slots[index] = Some(outcome),
                    None => break,
                },
            }
        }
        drop(pending);

        // every chain yields exactly once, so every slot is filled
        let outcomes: Vec<ItemOutcome> = slots.into_iter().flatten().collect();
        let mut summary =
            BatchSummary::from_outcomes(&integration.key, &pricing.currency, &outcomes);

        if let Some(reporter) = self.reporter.as_ref().filter(|_| self.config.report_enabled) {
            if cancel.is_cancelled() {
                return Err(BatchError::Cancelled);
            }
            match reporter.write(integration, &outcomes).await {
                Ok(Some(report)) => summary = summary.with_report(report),
                Ok(None) => {}
                Err(e) => warn!(
                    integration = %integration.key,
                    error = %e,
                    "Report could not be written"
                ),
            }
        }

        info!(
            integration = %summary.integration,
            total = summary.total_count,
            succeeded = summary.success_count,
            failed = summary.failure_count,
            input_tokens = summary.input_tokens,
            output_tokens = summary.output_tokens,
            total_cost = %summary.total_cost,
            currency = %summary.currency,
            "Enrichment batch usage"
        );

        Ok(BatchReport { outcomes, summary })
    }
}
