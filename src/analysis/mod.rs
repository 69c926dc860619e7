//! Comparison of the two models' results

pub mod comparator;
pub mod scenario;
pub mod timeline;

pub use comparator::{compare, rank_order, standings, Comparison, ComparisonRecord, Standing};
pub use scenario::{ScenarioOutcome, ScenarioStatus};
pub use timeline::{align, build_timeline, AlignedPoint, TimelineEntry};
