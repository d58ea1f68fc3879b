//! Weekly analytics: CSV ingestion, reconciliation with tracked content,
//! retained history and aggregation.

pub mod aggregate;
pub mod history;
pub mod ingest;
mod types;

pub use aggregate::{
    PillarStats, ScoreAccuracy, ScoreComparison, StructureStats, TrendPoint, WeekOverWeek,
    WeekSummary,
};
pub use history::AnalyticsHistory;
pub use ingest::ContentUpload;
pub use types::{DailyRow, PostRecord, PostSource, WeeklySnapshot};
