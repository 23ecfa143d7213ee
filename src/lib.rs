pub mod aggregate;
pub mod dedupe;
pub mod error;
pub mod levels;
pub mod models;
pub mod scores;
pub mod trend;

pub use aggregate::{
    aggregate_combined, aggregate_domains, average_over_range, sort_newest_first,
    weekly_breakdown, within_range, DateRange,
};
pub use dedupe::{dedupe_weekly, normalized_week_start};
pub use error::{LevelTableError, TransitionRejected};
pub use levels::{LevelDefinition, LevelProgress, LevelTable, YouthLevelState};
pub use models::{
    Domain, DomainAggregate, DomainRatingRecord, DomainScores, Metric, NormalizedRecord,
    RatingKind, RecordSource, Shift, WeekSummary,
};
pub use scores::{normalize, normalize_all, to_storage, StoredScore};
pub use trend::{classify_trend, classify_trend_by, Trend, TrendConfig, TrendSummary, WindowPolicy};
