//! Data types for the enrichment pipeline.

pub mod config;
pub mod input;
pub mod outcome;
pub mod product;
pub mod summary;
