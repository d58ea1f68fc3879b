//! Content items and their lifecycle state machine.

mod models;
mod pipeline;

pub use models::{Account, ContentItem, EngagementMetrics, Tab};
pub use pipeline::{ContentPipeline, PipelineError, SortBy};
