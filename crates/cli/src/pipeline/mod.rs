//! Pipeline orchestration module.

mod orchestrator;
mod records;
mod stats;

pub use orchestrator::{Pipeline, PipelineConfig};
pub use stats::PipelineStats;
