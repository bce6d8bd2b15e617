//! Execution engine module.
//!
//! This module runs flow graphs and reports progress.

pub mod engine;
pub mod progress;

pub use engine::{
    ExecutionEngine, ExecutionOptions, ExecutionStats, MessageLevel, NodeMessage, RunReport,
    DEFAULT_BUDGET_FACTOR,
};
pub use progress::{ProgressTracker, ProgressUpdate, SkipReason};
