//! Benchmark comparison reports for two revisions
//!
//! This library bundles the comparison engine with its shared types so that
//! callers only depend on one crate.

pub use benchcmp_common as common;
pub use benchcmp_engine as engine;

pub mod prelude {
    pub use benchcmp_common::{
        load_config, CompareError, ConfigSource, EngineConfig, ReportConfig, Result, StatsConfig,
    };
    pub use benchcmp_engine::{
        CompareRequest, CompareView, Comparer, Dataset, InMemoryStore, MeasurementStore, WarmupData,
    };
}

use benchcmp_common::{ConfigSource, Result};
use benchcmp_engine::{Comparer, Dataset, InMemoryStore};
use std::path::Path;
use tracing::info;

/// Build a comparer over a JSON dataset file.
///
/// Configuration comes from `config` when given, otherwise from the
/// environment on top of the defaults.
pub fn comparer_from_files(
    dataset: &Path,
    config: Option<&Path>,
) -> Result<Comparer<InMemoryStore>> {
    let source = match config {
        Some(path) => ConfigSource::File(path.to_path_buf()),
        None => ConfigSource::Environment,
    };
    let config = benchcmp_common::load_config(source)?;
    let dataset = Dataset::from_file(dataset)?;
    info!(
        "Loaded dataset with {} runs and {} measurements",
        dataset.runs.len(),
        dataset.measurements.len()
    );

    Ok(Comparer::new(InMemoryStore::new(dataset), config))
}
