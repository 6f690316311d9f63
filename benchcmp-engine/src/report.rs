//! Aggregation of per-suite tables into the whole-report model

use benchcmp_common::{BenchmarkKey, Environment, Result, RunId};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use tracing::debug;

use crate::plots::PlotPaths;
use crate::rows::{BuiltRow, ExeRun, ParameterCounts, RowBuilder, RunMeasurements};
use crate::stats::{ComparisonAnalyzer, SummaryStatistics, SummaryStatsWithUnit};
use crate::table::{CompareStatsTable, TableBuilder};

/// Suite name to table, in the order suites were encountered
pub type BySuiteComparison = IndexMap<String, CompareStatsTable>;

/// Executable name to suites, in the order executables were encountered
pub type ByExeSuiteComparison = IndexMap<String, BySuiteComparison>;

/// Summary statistics for the overall comparison
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsSummary {
    pub stats: IndexMap<String, SummaryStatsWithUnit>,
    /// The URL to a PNG with the overview statistics
    pub overview_png_url: String,
    /// The URLs to SVGs with the overview statistics
    pub overview_svg_urls: Vec<String>,
    pub num_run_configs: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AcrossVersions {
    pub summary: StatsSummary,
    pub all_measurements: ByExeSuiteComparison,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AllStats {
    pub across_versions: AcrossVersions,
    pub across_exes: BySuiteComparison,
}

impl AllStats {
    pub fn has_exe_comparison(&self) -> bool {
        !self.across_exes.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompareStats {
    #[serde(flatten)]
    pub all: AllStats,
    pub environments: Vec<Environment>,
}

/// Collects change ratios per criterion, counting each run once
#[derive(Debug, Default)]
struct SummaryAccumulator {
    ratios: IndexMap<String, (String, Vec<f64>)>,
    runs: HashSet<RunId>,
}

impl SummaryAccumulator {
    fn record(&mut self, run_id: RunId, built: &BuiltRow) {
        let Some(stats) = built.row.version_stats() else {
            return;
        };
        if !self.runs.insert(run_id) {
            return;
        }

        for (criterion, comparison) in stats {
            let entry = self.ratios.entry(criterion.clone()).or_insert_with(|| {
                let unit = built
                    .criteria
                    .iter()
                    .find(|c| &c.name == criterion)
                    .map(|c| c.unit.clone())
                    .unwrap_or_default();
                (unit, Vec::new())
            });
            if let Some(ratio) = comparison.ratio() {
                entry.1.push(ratio);
            }
        }
    }

    fn finish(self, plots: &PlotPaths, exes: &ByExeSuiteComparison) -> StatsSummary {
        let stats = self
            .ratios
            .into_iter()
            .filter_map(|(criterion, (unit, ratios))| {
                SummaryStatistics::from_ratios(&ratios)
                    .map(|stats| (criterion, SummaryStatsWithUnit { stats, unit }))
            })
            .collect();

        StatsSummary {
            stats,
            overview_png_url: plots.overview_png(),
            overview_svg_urls: exes.keys().filter_map(|exe| plots.overview_svg(exe)).collect(),
            num_run_configs: self.runs.len(),
        }
    }
}

/// Builds [`AllStats`] from fully fetched measurements
pub struct ReportAggregator<'a> {
    analyzer: &'a ComparisonAnalyzer,
    plots: &'a PlotPaths,
}

impl<'a> ReportAggregator<'a> {
    pub fn new(analyzer: &'a ComparisonAnalyzer, plots: &'a PlotPaths) -> Self {
        Self { analyzer, plots }
    }

    /// Build both report sections.
    ///
    /// Executables and suites keep the order they first appear in `runs`.
    pub fn build(
        &self,
        base_commit: &str,
        change_commit: &str,
        runs: &[RunMeasurements],
    ) -> Result<AllStats> {
        let counts = parameter_counts(runs);
        let rows = RowBuilder::new(self.analyzer, self.plots);

        let mut summary = SummaryAccumulator::default();
        let mut by_exe: IndexMap<&str, IndexMap<&str, TableBuilder>> = IndexMap::new();

        for run in runs {
            let bench = &run.config.benchmark;
            let table = by_exe
                .entry(bench.e.as_str())
                .or_default()
                .entry(bench.s.as_str())
                .or_insert_with(|| TableBuilder::new(self.plots.table_svg(&bench.e, &bench.s)));

            let run_counts = &counts[&counts_key(run)];
            let built = rows.across_versions(base_commit, change_commit, run, run_counts)?;
            let Some(built) = built else {
                continue;
            };
            summary.record(run.config.run_id, &built);
            table.push(built)?;
        }

        let mut all_measurements = ByExeSuiteComparison::new();
        for (exe, suites) in by_exe {
            let mut by_suite = BySuiteComparison::new();
            for (suite, table) in suites {
                if !table.is_empty() {
                    by_suite.insert(suite.to_string(), table.build()?);
                }
            }
            if !by_suite.is_empty() {
                all_measurements.insert(exe.to_string(), by_suite);
            }
        }

        let across_exes = self.build_across_exes(runs, &counts)?;
        let summary = summary.finish(self.plots, &all_measurements);
        debug!(
            "Aggregated {} run configurations over {} executables, {} suites across executables",
            summary.num_run_configs,
            all_measurements.len(),
            across_exes.len()
        );

        Ok(AllStats {
            across_versions: AcrossVersions {
                summary,
                all_measurements,
            },
            across_exes,
        })
    }

    /// Tables comparing executables on the change revision.
    ///
    /// The baseline executable of a suite is the first executable seen in it;
    /// benchmarks not run on the baseline executable and at least one other
    /// executable produce no row.
    fn build_across_exes(
        &self,
        runs: &[RunMeasurements],
        counts: &HashMap<(String, String, String), ParameterCounts>,
    ) -> Result<BySuiteComparison> {
        let rows = RowBuilder::new(self.analyzer, self.plots);

        let mut by_suite: IndexMap<&str, IndexMap<BenchmarkKey, Vec<ExeRun<'_>>>> = IndexMap::new();
        for run in runs {
            let bench = &run.config.benchmark;
            let exes = by_suite
                .entry(bench.s.as_str())
                .or_default()
                .entry(bench.without_exe())
                .or_default();
            if let Some(kept) = exes.iter().find(|exe| exe.exe_name == bench.e) {
                debug!(
                    "Run {} repeats {} on {}, comparing executables with run {}",
                    run.config.run_id, bench, bench.e, kept.run.config.run_id
                );
                continue;
            }
            exes.push(ExeRun {
                exe_name: bench.e.as_str(),
                run,
            });
        }

        let mut across_exes = BySuiteComparison::new();
        for (suite, benchmarks) in by_suite {
            let Some(baseline_exe) = benchmarks.values().flatten().map(|exe| exe.exe_name).next()
            else {
                continue;
            };

            let mut table =
                TableBuilder::across_exes(self.plots.exe_table_svg(suite), baseline_exe);
            for exes in benchmarks.values() {
                let Some(baseline_pos) = exes.iter().position(|exe| exe.exe_name == baseline_exe)
                else {
                    continue;
                };
                if exes.len() < 2 {
                    continue;
                }

                let mut ordered = Vec::with_capacity(exes.len());
                ordered.push(exes[baseline_pos]);
                ordered.extend(
                    exes.iter()
                        .enumerate()
                        .filter(|(i, _)| *i != baseline_pos)
                        .map(|(_, exe)| *exe),
                );

                let key = counts_key(ordered[0].run);
                if let Some(built) = rows.across_exes(&ordered, &counts[&key])? {
                    table.push(built)?;
                }
            }

            if !table.is_empty() {
                across_exes.insert(suite.to_string(), table.build()?);
            }
        }

        Ok(across_exes)
    }
}

fn counts_key(run: &RunMeasurements) -> (String, String, String) {
    let bench = &run.config.benchmark;
    (bench.e.clone(), bench.s.clone(), bench.b.clone())
}

/// Parameter space of each benchmark, per executable and suite.
fn parameter_counts(
    runs: &[RunMeasurements],
) -> HashMap<(String, String, String), ParameterCounts> {
    let mut grouped: HashMap<(String, String, String), Vec<&RunMeasurements>> = HashMap::new();
    for run in runs {
        grouped.entry(counts_key(run)).or_default().push(run);
    }

    grouped
        .into_iter()
        .map(|(key, runs)| (key, ParameterCounts::count(runs.iter().map(|r| &r.config))))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use benchcmp_common::{
        BenchmarkId, CriterionData, CriterionSeries, DataSeriesId, RunConfiguration,
    };

    fn series(name: &str, values: &[f64]) -> CriterionSeries {
        CriterionSeries {
            criterion: CriterionData::new(name, "ms"),
            invocations: vec![values.to_vec()],
        }
    }

    fn run(
        run_id: RunId,
        exe: &str,
        suite: &str,
        bench: &str,
        base: &[f64],
        change: &[f64],
    ) -> RunMeasurements {
        RunMeasurements {
            config: RunConfiguration {
                run_id,
                benchmark: BenchmarkId::new(bench, exe, suite),
                cmdline: format!("{} {}", exe, bench),
                env_id: 1,
                warmup: 0,
                base: Some(DataSeriesId::new("base", 1)),
                change: Some(DataSeriesId::new("change", 1)),
            },
            base: vec![series("total", base)],
            change: vec![series("total", change)],
            profile_base: None,
            profile_change: None,
        }
    }

    fn sample_runs() -> Vec<RunMeasurements> {
        vec![
            run(1, "som", "micro", "Fib", &[10.0, 10.0], &[11.0, 11.0]),
            run(2, "somns", "macro", "Richards", &[20.0], &[18.0]),
            run(3, "som", "macro", "Richards", &[30.0], &[30.0]),
            run(4, "somns", "micro", "Fib", &[5.0, 5.0], &[5.5, 5.5]),
            run(5, "som", "micro", "Sieve", &[2.0], &[]),
        ]
    }

    #[test]
    fn test_exe_and_suite_order_is_first_seen() {
        let analyzer = ComparisonAnalyzer::new();
        let plots = PlotPaths::none();
        let stats = ReportAggregator::new(&analyzer, &plots)
            .build("base", "change", &sample_runs())
            .unwrap();

        let all = &stats.across_versions.all_measurements;
        assert_eq!(all.keys().collect::<Vec<_>>(), vec!["som", "somns"]);
        assert_eq!(all["som"].keys().collect::<Vec<_>>(), vec!["micro", "macro"]);
        assert_eq!(all["somns"].keys().collect::<Vec<_>>(), vec!["macro", "micro"]);
        assert_eq!(all["som"]["micro"].benchmarks.len(), 2);
    }

    #[test]
    fn test_summary_counts_each_run_once() {
        let analyzer = ComparisonAnalyzer::new();
        let plots = PlotPaths::new(Some("rep".to_string()));
        let stats = ReportAggregator::new(&analyzer, &plots)
            .build("base", "change", &sample_runs())
            .unwrap();

        let summary = &stats.across_versions.summary;
        assert_eq!(summary.num_run_configs, 5);
        let total = &summary.stats["total"];
        assert_eq!(total.unit, "ms");
        assert!((total.stats.max - 1.1).abs() < 1e-9);
        assert!((total.stats.min - 0.9).abs() < 1e-9);
        assert_eq!(summary.overview_png_url, "rep/overview.png");
        assert_eq!(
            summary.overview_svg_urls,
            vec!["rep/overview.som.svg".to_string(), "rep/overview.somns.svg".to_string()]
        );
    }

    #[test]
    fn test_across_exes_uses_first_exe_as_baseline() {
        let analyzer = ComparisonAnalyzer::new();
        let plots = PlotPaths::none();
        let stats = ReportAggregator::new(&analyzer, &plots)
            .build("base", "change", &sample_runs())
            .unwrap();

        assert!(stats.has_exe_comparison());
        let exes = &stats.across_exes;
        assert_eq!(exes.keys().collect::<Vec<_>>(), vec!["micro", "macro"]);

        let micro = &exes["micro"];
        assert_eq!(micro.baseline_exe_name.as_deref(), Some("som"));
        assert_eq!(micro.benchmarks.len(), 1);
        let fib = micro.benchmarks[0].exe_stats().unwrap();
        assert_eq!(fib[0].exe_name, "som");
        assert_eq!(fib[1].exe_name, "somns");
        assert_eq!(fib[1].criteria["total"].change_m, Some(-0.5));

        let macro_table = &exes["macro"];
        assert_eq!(macro_table.baseline_exe_name.as_deref(), Some("somns"));
    }

    #[test]
    fn test_across_exes_compares_first_run_of_repeated_benchmark() {
        let mut repeated = run(2, "som", "micro", "Fib", &[20.0], &[20.0, 20.0]);
        repeated.config.env_id = 2;
        let runs = vec![
            run(1, "som", "micro", "Fib", &[10.0], &[10.0, 10.0]),
            repeated,
            run(3, "somns", "micro", "Fib", &[5.0], &[5.0, 5.0]),
        ];

        let analyzer = ComparisonAnalyzer::new();
        let plots = PlotPaths::none();
        let stats = ReportAggregator::new(&analyzer, &plots)
            .build("base", "change", &runs)
            .unwrap();

        assert_eq!(stats.across_versions.all_measurements["som"]["micro"].benchmarks.len(), 2);
        let micro = &stats.across_exes["micro"];
        assert_eq!(micro.benchmarks.len(), 1);
        assert_eq!(micro.benchmarks[0].details.env_id, 1);
        let exes = micro.benchmarks[0].exe_stats().unwrap();
        assert_eq!(exes.len(), 2);
        assert_eq!(exes[1].criteria["total"].change_m, Some(-0.5));
    }

    #[test]
    fn test_build_is_deterministic() {
        let analyzer = ComparisonAnalyzer::new();
        let plots = PlotPaths::new(Some("rep".to_string()));
        let aggregator = ReportAggregator::new(&analyzer, &plots);

        let first = aggregator.build("base", "change", &sample_runs()).unwrap();
        let second = aggregator.build("base", "change", &sample_runs()).unwrap();
        let first = serde_json::to_string(&first).unwrap();
        let second = serde_json::to_string(&second).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_empty_input_builds_empty_report() {
        let analyzer = ComparisonAnalyzer::new();
        let plots = PlotPaths::none();
        let stats = ReportAggregator::new(&analyzer, &plots).build("base", "change", &[]).unwrap();
        assert!(stats.across_versions.all_measurements.is_empty());
        assert!(stats.across_versions.summary.stats.is_empty());
        assert_eq!(stats.across_versions.summary.num_run_configs, 0);
        assert!(!stats.has_exe_comparison());
    }
}
