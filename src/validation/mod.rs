//! Validation module for pre-run checking.
//!
//! The validation pipeline inspects a graph before a run and lists the
//! problems the run would hit.

pub mod pipeline;
pub mod stages;

pub use pipeline::ValidationPipeline;
pub use stages::{SourceValidation, StructuralValidation, ValidationStage};
