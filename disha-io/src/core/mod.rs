//! Core abstractions shared across the pipeline.
//!
//! - [`types`]: Decoded samples, status flags, and unit conventions

pub mod types;
