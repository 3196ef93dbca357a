//! Trait seams of the pipeline.
//!
//! Each external collaborator sits behind one of these traits so the
//! orchestrator can be driven by real services or by the mocks in
//! [`crate::testing`].

pub mod adapter;
pub mod generator;
pub mod report;
pub mod vision;
