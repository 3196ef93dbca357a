//! Batch pipeline.

pub mod orchestrator;

pub use orchestrator::BatchOrchestrator;
