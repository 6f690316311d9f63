//! Comparison requests against a measurement store
//!
//! [`Comparer`] resolves both revisions, fetches every series the report
//! needs, and only then hands the data to the pure aggregation in
//! [`crate::report`].

use benchcmp_common::{
    short_hash, BenchmarkId, CommitId, CompareError, EngineConfig, EnvId, Environment, ProjectId,
    ReportConfig, Result, RevisionData, RunConfiguration, RunId, TrialId,
};
use futures::future::try_join_all;
use indexmap::IndexMap;
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use tracing::{debug, info, warn};

use crate::navigation::{build_navigation, CompareNavigation};
use crate::plots::PlotPaths;
use crate::report::{AllStats, CompareStats, ReportAggregator};
use crate::rows::RunMeasurements;
use crate::stats::ComparisonAnalyzer;
use crate::store::MeasurementStore;
use crate::warmup::{extract_warmup, WarmupData};

/// Identifying fields shared by both kinds of [`CompareView`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompareViewBasics {
    pub project: String,
    pub baseline_hash: String,
    pub change_hash: String,
    pub baseline_hash6: String,
    pub change_hash6: String,
}

impl CompareViewBasics {
    pub fn new(project: impl Into<String>, baseline_hash: &str, change_hash: &str) -> Self {
        Self {
            project: project.into(),
            baseline_hash: baseline_hash.to_string(),
            change_hash: change_hash.to_string(),
            baseline_hash6: short_hash(baseline_hash),
            change_hash6: short_hash(change_hash),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompareViewWithoutData {
    #[serde(flatten)]
    pub basics: CompareViewBasics,
}

/// A run measured on only one of the two revisions
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotInBoth {
    pub run_id: RunId,
    pub benchmark: BenchmarkId,
    /// The revision the run was measured on
    pub commit_id: CommitId,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompareViewWithData {
    #[serde(flatten)]
    pub basics: CompareViewBasics,
    pub no_data: bool,
    pub not_in_both: Vec<NotInBoth>,
    pub base: RevisionData,
    pub change: RevisionData,
    pub navigation: CompareNavigation,
    pub stats: CompareStats,
    pub config: ReportConfig,
    pub has_exe_comparison: bool,
}

/// Outcome of a comparison request
#[derive(Debug, Clone, PartialEq)]
pub enum CompareView {
    /// At least one of the requested hashes did not resolve
    WithoutData(CompareViewWithoutData),
    WithData(Box<CompareViewWithData>),
}

impl CompareView {
    pub fn revision_found(&self) -> bool {
        matches!(self, CompareView::WithData(_))
    }

    pub fn basics(&self) -> &CompareViewBasics {
        match self {
            CompareView::WithoutData(view) => &view.basics,
            CompareView::WithData(view) => &view.basics,
        }
    }

    pub fn with_data(&self) -> Option<&CompareViewWithData> {
        match self {
            CompareView::WithoutData(_) => None,
            CompareView::WithData(view) => Some(view),
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct Tagged<'a, T> {
    revision_found: bool,
    #[serde(flatten)]
    view: &'a T,
}

impl Serialize for CompareView {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            CompareView::WithoutData(view) => Tagged {
                revision_found: false,
                view,
            }
            .serialize(serializer),
            CompareView::WithData(view) => Tagged {
                revision_found: true,
                view: view.as_ref(),
            }
            .serialize(serializer),
        }
    }
}

impl<'de> Deserialize<'de> for CompareView {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let value = serde_json::Value::deserialize(deserializer)?;
        let found = value
            .get("revisionFound")
            .and_then(serde_json::Value::as_bool)
            .ok_or_else(|| <D::Error as de::Error>::missing_field("revisionFound"))?;

        if found {
            serde_json::from_value(value)
                .map(|view| CompareView::WithData(Box::new(view)))
                .map_err(de::Error::custom)
        } else {
            serde_json::from_value(value)
                .map(CompareView::WithoutData)
                .map_err(de::Error::custom)
        }
    }
}

/// Two revisions of a project to compare
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompareRequest {
    pub project_id: ProjectId,
    pub base: String,
    pub change: String,
    /// Directory name plot references are derived from
    #[serde(default)]
    pub report_id: Option<String>,
}

/// Answers comparison and warmup requests from a [`MeasurementStore`]
pub struct Comparer<S> {
    store: S,
    config: EngineConfig,
}

impl<S: MeasurementStore> Comparer<S> {
    pub fn new(store: S, config: EngineConfig) -> Self {
        Self { store, config }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub async fn compare(&self, request: &CompareRequest) -> Result<CompareView> {
        let project_id = request.project_id;
        let project = self.store.project_name(project_id).await?.unwrap_or_default();

        let (base, change) = futures::try_join!(
            self.store.resolve_revision(project_id, &request.base),
            self.store.resolve_revision(project_id, &request.change)
        )?;
        let (Some(base), Some(change)) = (base, change) else {
            warn!(
                "Revision not found in project {}: {}..{}",
                project_id, request.base, request.change
            );
            return Ok(CompareView::WithoutData(CompareViewWithoutData {
                basics: CompareViewBasics::new(project, &request.base, &request.change),
            }));
        };

        info!(
            "Comparing {} against {} for project {}",
            short_hash(&change.commit_id),
            short_hash(&base.commit_id),
            project
        );

        let configs = self
            .store
            .run_configurations(project_id, &base.commit_id, &change.commit_id)
            .await?;
        let (comparable, not_in_both) = split_runs(configs);
        if !not_in_both.is_empty() {
            debug!("{} run configurations measured on only one revision", not_in_both.len());
        }

        let runs = self.fetch_measurements(comparable).await?;

        let analyzer = ComparisonAnalyzer::with_config(self.config.stats.clone());
        let plots = PlotPaths::new(request.report_id.clone());
        let all = ReportAggregator::new(&analyzer, &plots).build(
            &base.commit_id,
            &change.commit_id,
            &runs,
        )?;
        let navigation = build_navigation(&all);
        let environments = self.fetch_environments(&all).await?;

        let no_data = all.across_versions.all_measurements.is_empty();
        if no_data {
            warn!(
                "No comparable benchmarks between {} and {}",
                short_hash(&base.commit_id),
                short_hash(&change.commit_id)
            );
        }
        let has_exe_comparison = all.has_exe_comparison();

        Ok(CompareView::WithData(Box::new(CompareViewWithData {
            basics: CompareViewBasics::new(project, &base.commit_id, &change.commit_id),
            no_data,
            not_in_both,
            base,
            change,
            navigation,
            stats: CompareStats { all, environments },
            config: self.config.report.clone(),
            has_exe_comparison,
        })))
    }

    /// Per-iteration values of two trials for the given criteria.
    pub async fn warmup(
        &self,
        trial1: TrialId,
        trial2: TrialId,
        criteria: &[String],
    ) -> Result<WarmupData> {
        let (first, second) = futures::try_join!(
            self.store.trial_measurements(trial1),
            self.store.trial_measurements(trial2)
        )?;
        let first = first.ok_or(CompareError::TrialNotFound(trial1))?;
        let second = second.ok_or(CompareError::TrialNotFound(trial2))?;

        Ok(extract_warmup(&first, &second, criteria))
    }

    /// Fetch both sides of every run, one batch per executable.
    ///
    /// The result keeps the order of `configs`.
    async fn fetch_measurements(
        &self,
        configs: Vec<RunConfiguration>,
    ) -> Result<Vec<RunMeasurements>> {
        let mut by_exe: IndexMap<String, Vec<(usize, RunConfiguration)>> = IndexMap::new();
        for (position, config) in configs.into_iter().enumerate() {
            by_exe
                .entry(config.benchmark.e.clone())
                .or_default()
                .push((position, config));
        }

        let batches = try_join_all(by_exe.into_iter().map(|(exe, runs)| async move {
            debug!("Fetching {} runs of {}", runs.len(), exe);
            try_join_all(runs.into_iter().map(|(position, config)| async move {
                self.fetch_run(config).await.map(|run| (position, run))
            }))
            .await
        }))
        .await?;

        let mut runs: Vec<(usize, RunMeasurements)> = batches.into_iter().flatten().collect();
        runs.sort_by_key(|(position, _)| *position);
        Ok(runs.into_iter().map(|(_, run)| run).collect())
    }

    async fn fetch_run(&self, config: RunConfiguration) -> Result<RunMeasurements> {
        let pairing = config.version_comparison().ok_or_else(|| {
            CompareError::MalformedInput(format!(
                "run {} lacks a series on one revision",
                config.run_id
            ))
        })?;
        if !pairing.is_same_experiment() {
            warn!(
                "Run {} compares experiment {} against experiment {}",
                config.run_id, pairing.base, pairing.change
            );
        }

        let (base, change, profile_base, profile_change) = futures::try_join!(
            self.store.fetch_series(config.run_id, &pairing.base),
            self.store.fetch_series(config.run_id, &pairing.change),
            self.store.available_profile(config.run_id, &pairing.base),
            self.store.available_profile(config.run_id, &pairing.change)
        )?;

        Ok(RunMeasurements {
            config,
            base,
            change,
            profile_base,
            profile_change,
        })
    }

    /// Environments referenced by any row, in first-seen order.
    async fn fetch_environments(&self, all: &AllStats) -> Result<Vec<Environment>> {
        let mut env_ids: Vec<EnvId> = Vec::new();
        let tables = all
            .across_versions
            .all_measurements
            .values()
            .flat_map(|suites| suites.values())
            .chain(all.across_exes.values());
        for row in tables.flat_map(|table| &table.benchmarks) {
            if !env_ids.contains(&row.details.env_id) {
                env_ids.push(row.details.env_id);
            }
        }

        let environments =
            try_join_all(env_ids.iter().map(|id| self.store.environment(*id))).await?;
        Ok(env_ids
            .iter()
            .zip(environments)
            .filter_map(|(id, env)| {
                if env.is_none() {
                    warn!("Environment {} referenced by a run is not stored", id);
                }
                env
            })
            .collect())
    }
}

/// Separate runs measured on both revisions from those measured on one.
fn split_runs(configs: Vec<RunConfiguration>) -> (Vec<RunConfiguration>, Vec<NotInBoth>) {
    let mut comparable = Vec::new();
    let mut not_in_both = Vec::new();

    for config in configs {
        match (&config.base, &config.change) {
            (Some(_), Some(_)) => comparable.push(config),
            (Some(side), None) | (None, Some(side)) => not_in_both.push(NotInBoth {
                run_id: config.run_id,
                benchmark: config.benchmark.clone(),
                commit_id: side.commit_id.clone(),
            }),
            (None, None) => {}
        }
    }

    (comparable, not_in_both)
}
