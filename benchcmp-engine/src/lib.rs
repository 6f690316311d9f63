//! Benchmark Comparison Engine
//!
//! This crate turns the measurements of two revisions into a comparison report.
//! It provides:
//! - Per-criterion statistics of a baseline against a change revision
//! - Per-suite tables and an aggregate summary of change ratios
//! - Comparison of executables against a suite's baseline executable
//! - Missing-data detection and warmup series extraction

pub mod compare;
pub mod missing;
pub mod navigation;
pub mod plots;
pub mod report;
pub mod rows;
pub mod stats;
pub mod store;
pub mod table;
pub mod warmup;

pub use compare::{
    CompareRequest, CompareView, CompareViewBasics, CompareViewWithData, CompareViewWithoutData,
    Comparer, NotInBoth,
};
pub use missing::MissingData;
pub use navigation::{build_navigation, CompareNavigation, ExeNavigation, SuiteNavigation};
pub use plots::PlotPaths;
pub use report::{
    AcrossVersions, AllStats, ByExeSuiteComparison, BySuiteComparison, CompareStats,
    ReportAggregator, StatsSummary,
};
pub use rows::{
    CompareStatsRow, CompareStatsRowAcrossExes, RowStats, RunDetails, RunMeasurements,
};
pub use stats::{
    ChangeDirection, ComparisonAnalyzer, ComparisonStatistics, Significance, SummaryStatistics,
};
pub use store::{Dataset, InMemoryStore, MeasurementStore};
pub use table::{CompareStatsTable, CompareStatsTableHeader};
pub use warmup::{extract_warmup, WarmupData, WarmupDataForTrial, WarmupDataPerCriterion};
