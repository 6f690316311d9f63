//! Per-benchmark comparison rows

use benchcmp_common::{
    AvailableProfile, BenchmarkId, CriterionData, CriterionSeries, DataSeriesVersionComparison,
    EnvId, Result, RunConfiguration,
};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::missing::{align_series, detect_missing, MissingData};
use crate::plots::PlotPaths;
use crate::stats::{ComparisonAnalyzer, ComparisonStatistics};

/// Raw series of one run on both revisions, as fetched from storage
#[derive(Debug, Clone, PartialEq)]
pub struct RunMeasurements {
    pub config: RunConfiguration,
    pub base: Vec<CriterionSeries>,
    pub change: Vec<CriterionSeries>,
    pub profile_base: Option<AvailableProfile>,
    pub profile_change: Option<AvailableProfile>,
}

impl RunMeasurements {
    pub fn has_data(&self) -> bool {
        self.base.iter().chain(&self.change).any(|s| !s.is_empty())
    }
}

/// Size of a benchmark's parameter space
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ParameterCounts {
    pub num_v: usize,
    pub num_c: usize,
    pub num_i: usize,
    pub num_ea: usize,
    pub num_env: usize,
}

impl ParameterCounts {
    /// Count distinct parameter values over all runs of one benchmark.
    pub fn count<'a>(runs: impl IntoIterator<Item = &'a RunConfiguration>) -> Self {
        let mut v = HashSet::new();
        let mut c = HashSet::new();
        let mut i = HashSet::new();
        let mut ea = HashSet::new();
        let mut env: HashSet<EnvId> = HashSet::new();

        for run in runs {
            v.insert(run.benchmark.v.as_deref());
            c.insert(run.benchmark.c.as_deref());
            i.insert(run.benchmark.i.as_deref());
            ea.insert(run.benchmark.ea.as_deref());
            env.insert(run.env_id);
        }

        Self {
            num_v: v.len(),
            num_c: c.len(),
            num_i: i.len(),
            num_ea: ea.len(),
            num_env: env.len(),
        }
    }
}

/// Parameters that vary for this benchmark, in v, c, i, ea order.
pub fn arguments_for_display(bench: &BenchmarkId, counts: &ParameterCounts) -> String {
    [
        (counts.num_v, &bench.v),
        (counts.num_c, &bench.c),
        (counts.num_i, &bench.i),
        (counts.num_ea, &bench.ea),
    ]
    .into_iter()
    .filter(|(count, _)| *count > 1)
    .filter_map(|(_, value)| value.as_deref())
    .filter(|value| !value.is_empty())
    .collect::<Vec<_>>()
    .join(" ")
}

/// Descriptive metadata of one run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunDetails {
    pub cmdline: String,
    pub env_id: EnvId,
    pub has_warmup: bool,
    pub profile_base: Option<AvailableProfile>,
    pub profile_change: Option<AvailableProfile>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_series: Option<DataSeriesVersionComparison>,
    /// The two sides were measured under different experiments
    #[serde(default)]
    pub cross_experiment: bool,
    /// Number of VarValues
    pub num_v: usize,
    /// Number of Cores
    pub num_c: usize,
    /// Number of Input Sizes
    pub num_i: usize,
    /// Number of Extra Arguments
    pub num_ea: usize,
    /// Number of Environments
    pub num_env: usize,
}

impl RunDetails {
    fn new(config: &RunConfiguration, counts: &ParameterCounts) -> Self {
        Self {
            cmdline: config.cmdline.clone(),
            env_id: config.env_id,
            has_warmup: config.warmup > 0,
            profile_base: None,
            profile_change: None,
            data_series: None,
            cross_experiment: false,
            num_v: counts.num_v,
            num_c: counts.num_c,
            num_i: counts.num_i,
            num_ea: counts.num_ea,
            num_env: counts.num_env,
        }
    }
}

/// Statistics of one executable against the baseline executable
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompareStatsRowAcrossExes {
    pub exe_name: String,
    pub criteria: IndexMap<String, ComparisonStatistics>,
}

/// The comparison carried by a row, depending on the comparison mode
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RowStats {
    /// Baseline against change revision, per criterion
    VersionStats(IndexMap<String, ComparisonStatistics>),
    /// Each executable against the baseline executable
    ExeStats(Vec<CompareStatsRowAcrossExes>),
}

impl RowStats {
    /// Criteria for which the row carries statistics.
    pub fn criteria(&self) -> Vec<&str> {
        match self {
            RowStats::VersionStats(stats) => stats.keys().map(String::as_str).collect(),
            RowStats::ExeStats(exes) => {
                let mut names: Vec<&str> = Vec::new();
                for name in exes.iter().flat_map(|exe| exe.criteria.keys()) {
                    if !names.contains(&name.as_str()) {
                        names.push(name);
                    }
                }
                names
            }
        }
    }
}

/// One benchmark's full comparison
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompareStatsRow {
    pub bench_id: BenchmarkId,
    pub details: RunDetails,
    pub arguments_for_display: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub missing: Vec<MissingData>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inline_plot: Option<String>,
    #[serde(flatten)]
    pub stats: RowStats,
}

impl CompareStatsRow {
    pub fn version_stats(&self) -> Option<&IndexMap<String, ComparisonStatistics>> {
        match &self.stats {
            RowStats::VersionStats(stats) => Some(stats),
            RowStats::ExeStats(_) => None,
        }
    }

    pub fn exe_stats(&self) -> Option<&[CompareStatsRowAcrossExes]> {
        match &self.stats {
            RowStats::VersionStats(_) => None,
            RowStats::ExeStats(exes) => Some(exes),
        }
    }
}

/// A row together with every criterion observed while building it
#[derive(Debug, Clone)]
pub struct BuiltRow {
    pub row: CompareStatsRow,
    pub criteria: Vec<CriterionData>,
}

/// One executable's run of a benchmark, for across-executables rows
#[derive(Debug, Clone, Copy)]
pub struct ExeRun<'a> {
    pub exe_name: &'a str,
    pub run: &'a RunMeasurements,
}

pub struct RowBuilder<'a> {
    analyzer: &'a ComparisonAnalyzer,
    plots: &'a PlotPaths,
}

impl<'a> RowBuilder<'a> {
    pub fn new(analyzer: &'a ComparisonAnalyzer, plots: &'a PlotPaths) -> Self {
        Self { analyzer, plots }
    }

    /// Compare a run's baseline and change series.
    ///
    /// Returns `None` when neither side has any data. Criteria lacking data
    /// on one side become [`MissingData`] entries instead of statistics.
    pub fn across_versions(
        &self,
        base_commit: &str,
        change_commit: &str,
        run: &RunMeasurements,
        counts: &ParameterCounts,
    ) -> Result<Option<BuiltRow>> {
        if !run.has_data() {
            return Ok(None);
        }

        let warmup = run.config.warmup;
        let aligned = align_series(&run.base, warmup, &run.change, warmup)?;
        let missing = detect_missing(base_commit, change_commit, &aligned);

        let mut version_stats = IndexMap::new();
        for series in &aligned {
            let name = &series.criterion.name;
            if let Some(stats) = self.analyzer.compare(name, &series.base, &series.change) {
                version_stats.insert(name.clone(), stats);
            }
        }

        let mut details = RunDetails::new(&run.config, counts);
        details.profile_base = run.profile_base.clone();
        details.profile_change = run.profile_change.clone();
        details.data_series = run.config.version_comparison();
        details.cross_experiment = details
            .data_series
            .as_ref()
            .is_some_and(|pairing| !pairing.is_same_experiment());

        let row = CompareStatsRow {
            bench_id: run.config.benchmark.clone(),
            arguments_for_display: arguments_for_display(&run.config.benchmark, counts),
            details,
            missing,
            inline_plot: self.plots.inline(run.config.run_id),
            stats: RowStats::VersionStats(version_stats),
        };

        Ok(Some(BuiltRow {
            row,
            criteria: aligned.into_iter().map(|a| a.criterion).collect(),
        }))
    }

    /// Compare the change series of each executable against the baseline executable.
    ///
    /// `exes` lists the baseline executable first. Criteria one of the two
    /// executables lacks are left out of that executable's entry.
    pub fn across_exes(
        &self,
        exes: &[ExeRun<'_>],
        counts: &ParameterCounts,
    ) -> Result<Option<BuiltRow>> {
        let Some(baseline) = exes.first() else {
            return Ok(None);
        };

        let mut criteria: Vec<CriterionData> = Vec::new();
        let mut exe_stats = Vec::with_capacity(exes.len());

        for exe in exes {
            let aligned = align_series(
                &baseline.run.change,
                baseline.run.config.warmup,
                &exe.run.change,
                exe.run.config.warmup,
            )?;

            let mut per_criterion = IndexMap::new();
            for series in aligned {
                if let Some(stats) =
                    self.analyzer.compare(&series.criterion.name, &series.base, &series.change)
                {
                    per_criterion.insert(series.criterion.name.clone(), stats);
                }
                if !criteria.contains(&series.criterion) {
                    criteria.push(series.criterion);
                }
            }

            exe_stats.push(CompareStatsRowAcrossExes {
                exe_name: exe.exe_name.to_string(),
                criteria: per_criterion,
            });
        }

        let config = &baseline.run.config;
        let row = CompareStatsRow {
            bench_id: config.benchmark.clone(),
            details: RunDetails::new(config, counts),
            arguments_for_display: arguments_for_display(&config.benchmark, counts),
            missing: Vec::new(),
            inline_plot: None,
            stats: RowStats::ExeStats(exe_stats),
        };

        Ok(Some(BuiltRow { row, criteria }))
    }
}
