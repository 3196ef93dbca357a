//! AI implementations for the enrichment library.
//!
//! Prompt templates are provider-neutral. Reply parsing and the OpenAI
//! implementations of [`DescriptionGenerator`](crate::traits::generator::DescriptionGenerator)
//! and [`VisionService`](crate::traits::vision::VisionService) sit behind
//! the `openai` feature.

#[cfg(feature = "openai")]
pub mod parse;
pub mod prompts;

#[cfg(feature = "openai")]
mod openai;

#[cfg(feature = "openai")]
pub use openai::{OpenAiDescriptionGenerator, OpenAiVision, DEFAULT_MODEL};
