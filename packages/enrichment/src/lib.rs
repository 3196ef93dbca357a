//! Product Enrichment Library
//!
//! Turns batches of product URLs or product photos into marketplace-ready
//! product records: extracted attributes, an AI-written description, and
//! the token cost of producing it, summarized into a report.
//!
//! # Usage
//!
//! ```rust,ignore
//! use enrichment::{AdapterRegistry, BatchOrchestrator, InputUnit, PricingTable};
//! use enrichment::testing::{MockAdapter, MockGenerator};
//! use std::sync::Arc;
//! use tokio_util::sync::CancellationToken;
//!
//! let adapters = AdapterRegistry::new()
//!     .register(Retailer::Generic, Arc::new(MockAdapter::urls()))?;
//! let orchestrator = BatchOrchestrator::new(
//!     adapters,
//!     Arc::new(MockGenerator::new()),
//!     PricingTable::reference_defaults(),
//! );
//!
//! let inputs = vec![InputUnit::url("https://example.com/p/1")];
//! let report = orchestrator.run("generic", &inputs, &CancellationToken::new()).await?;
//! println!("{}", serde_json::to_string_pretty(&report.summary)?);
//! ```
//!
//! # Modules
//!
//! - [`traits`] - Seams for adapters, generators, vision and report writers
//! - [`types`] - Inputs, extracted products, outcomes and summaries
//! - [`adapters`] - Retailer scrapers, the image-set adapter and the registry
//! - [`ai`] - Prompts, reply parsing and the OpenAI implementations
//! - [`cost`] - Token cost accounting
//! - [`pipeline`] - The batch orchestrator
//! - [`report`] - Report tables and the CSV writer
//! - [`security`] - Credential handling
//! - [`testing`] - Mock implementations for testing

pub mod adapters;
pub mod ai;
pub mod cost;
pub mod error;
pub mod pipeline;
pub mod price;
pub mod report;
pub mod security;
pub mod testing;
pub mod traits;
pub mod types;

pub use adapters::{AdapterRegistry, HtmlProductAdapter, ImageSetAdapter, Integration, Retailer};
pub use cost::{price_usage, token_cost, Direction, PricingEntry, PricingTable};
pub use error::{BatchError, ConfigError, ItemError, ReportError};
pub use pipeline::BatchOrchestrator;
pub use report::{CsvReportWriter, ListingPricing, ReportAssembler, ReportTable};
pub use security::{AiCredentials, SecretString};
pub use traits::{
    adapter::{Extracted, ExtractionAdapter},
    generator::{DescriptionGenerator, Generated, GenerationContext},
    report::ReportWriter,
    vision::VisionService,
};
pub use types::{
    config::BatchConfig,
    input::{group_images, ImageBlob, InputPayload, InputRef, InputUnit, SourceType},
    outcome::{EnrichedProduct, GenerationUsage, ItemFailure, ItemOutcome, TokenUsage},
    product::ExtractionResult,
    summary::{BatchReport, BatchSummary, ReportRef},
};

#[cfg(feature = "openai")]
pub use ai::{OpenAiDescriptionGenerator, OpenAiVision};

// Re-export testing utilities
pub use testing::{MemoryReportWriter, MockAdapter, MockGenerator, MockVision};
