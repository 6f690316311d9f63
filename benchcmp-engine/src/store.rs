//! Access to stored measurements
//!
//! The engine reads everything through [`MeasurementStore`]. [`InMemoryStore`]
//! serves a JSON dataset and backs the tests and the reporter binary.

use async_trait::async_trait;
use benchcmp_common::{
    AvailableProfile, BenchmarkId, CriterionData, CriterionSeries, DataSeriesId, EnvId,
    Environment, ExpId, ProjectId, Result, RevisionData, RunConfiguration, RunId, TrialId,
    TrialMeasurements,
};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::Path;
use tracing::{debug, warn};

/// Read-only storage collaborator
#[async_trait]
pub trait MeasurementStore: Send + Sync {
    async fn project_name(&self, project_id: ProjectId) -> Result<Option<String>>;

    /// Resolve a full commit hash or an unambiguous prefix of one.
    async fn resolve_revision(
        &self,
        project_id: ProjectId,
        hash: &str,
    ) -> Result<Option<RevisionData>>;

    /// Every run measured for either commit, with the series of each side.
    async fn run_configurations(
        &self,
        project_id: ProjectId,
        base: &str,
        change: &str,
    ) -> Result<Vec<RunConfiguration>>;

    /// Values of one run's series, per criterion and invocation.
    async fn fetch_series(
        &self,
        run_id: RunId,
        series: &DataSeriesId,
    ) -> Result<Vec<CriterionSeries>>;

    async fn environment(&self, env_id: EnvId) -> Result<Option<Environment>>;

    async fn available_profile(
        &self,
        run_id: RunId,
        series: &DataSeriesId,
    ) -> Result<Option<AvailableProfile>>;

    async fn trial_measurements(&self, trial_id: TrialId) -> Result<Option<TrialMeasurements>>;
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectRecord {
    pub id: ProjectId,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunRecord {
    pub run_id: RunId,
    pub benchmark: BenchmarkId,
    pub cmdline: String,
    pub env_id: EnvId,
    #[serde(default)]
    pub warmup: u32,
}

/// Values of one criterion recorded by one trial
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MeasurementRecord {
    pub run_id: RunId,
    pub series: DataSeriesId,
    pub trial_id: TrialId,
    pub criterion: CriterionData,
    pub invocations: Vec<Vec<f64>>,
}

/// Everything an [`InMemoryStore`] serves
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Dataset {
    pub projects: Vec<ProjectRecord>,
    pub revisions: Vec<RevisionData>,
    pub runs: Vec<RunRecord>,
    pub measurements: Vec<MeasurementRecord>,
    pub environments: Vec<Environment>,
    pub profiles: Vec<AvailableProfile>,
}

impl Dataset {
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }
}

#[derive(Debug, Clone, Default)]
pub struct InMemoryStore {
    dataset: Dataset,
}

impl InMemoryStore {
    pub fn new(dataset: Dataset) -> Self {
        Self { dataset }
    }

    /// Series of both sides of a run.
    ///
    /// Sides are paired on the lowest experiment both commits share. Without
    /// a shared experiment each side takes its own lowest one, which makes
    /// the pairing a cross-experiment comparison.
    fn pair_series(
        &self,
        run_id: RunId,
        base: &str,
        change: &str,
    ) -> (Option<DataSeriesId>, Option<DataSeriesId>) {
        let experiments = |commit: &str| -> BTreeSet<ExpId> {
            self.dataset
                .measurements
                .iter()
                .filter(|m| m.run_id == run_id && m.series.commit_id == commit)
                .map(|m| m.series.exp_id)
                .collect()
        };
        let base_exps = experiments(base);
        let change_exps = experiments(change);

        if let Some(shared) = base_exps.intersection(&change_exps).next() {
            return (
                Some(DataSeriesId::new(base, *shared)),
                Some(DataSeriesId::new(change, *shared)),
            );
        }
        if let (Some(b), Some(c)) = (base_exps.first(), change_exps.first()) {
            debug!(
                "Run {} shares no experiment between revisions, pairing {} with {}",
                run_id, b, c
            );
        }
        (
            base_exps.first().map(|exp| DataSeriesId::new(base, *exp)),
            change_exps.first().map(|exp| DataSeriesId::new(change, *exp)),
        )
    }
}

#[async_trait]
impl MeasurementStore for InMemoryStore {
    async fn project_name(&self, project_id: ProjectId) -> Result<Option<String>> {
        Ok(self
            .dataset
            .projects
            .iter()
            .find(|p| p.id == project_id)
            .map(|p| p.name.clone()))
    }

    async fn resolve_revision(
        &self,
        project_id: ProjectId,
        hash: &str,
    ) -> Result<Option<RevisionData>> {
        if hash.is_empty() {
            return Ok(None);
        }

        let candidates: Vec<&RevisionData> = self
            .dataset
            .revisions
            .iter()
            .filter(|r| r.project_id == project_id && r.commit_id.starts_with(hash))
            .collect();

        if let Some(exact) = candidates.iter().find(|r| r.commit_id == hash) {
            return Ok(Some((*exact).clone()));
        }
        match candidates.as_slice() {
            [single] => Ok(Some((*single).clone())),
            [] => Ok(None),
            _ => {
                warn!("Commit prefix {} is ambiguous ({} matches)", hash, candidates.len());
                Ok(None)
            }
        }
    }

    async fn run_configurations(
        &self,
        project_id: ProjectId,
        base: &str,
        change: &str,
    ) -> Result<Vec<RunConfiguration>> {
        let in_project = |commit: &str| {
            self.dataset
                .revisions
                .iter()
                .any(|r| r.project_id == project_id && r.commit_id == commit)
        };
        if !in_project(base) || !in_project(change) {
            return Ok(Vec::new());
        }

        let configs: Vec<RunConfiguration> = self
            .dataset
            .runs
            .iter()
            .filter_map(|run| {
                let (base, change) = self.pair_series(run.run_id, base, change);
                if base.is_none() && change.is_none() {
                    return None;
                }
                Some(RunConfiguration {
                    run_id: run.run_id,
                    benchmark: run.benchmark.clone(),
                    cmdline: run.cmdline.clone(),
                    env_id: run.env_id,
                    warmup: run.warmup,
                    base,
                    change,
                })
            })
            .collect();

        debug!("Found {} run configurations for {}..{}", configs.len(), base, change);
        Ok(configs)
    }

    async fn fetch_series(
        &self,
        run_id: RunId,
        series: &DataSeriesId,
    ) -> Result<Vec<CriterionSeries>> {
        let mut by_criterion: IndexMap<&str, CriterionSeries> = IndexMap::new();
        for record in self
            .dataset
            .measurements
            .iter()
            .filter(|m| m.run_id == run_id && &m.series == series)
        {
            by_criterion
                .entry(record.criterion.name.as_str())
                .or_insert_with(|| CriterionSeries {
                    criterion: record.criterion.clone(),
                    invocations: Vec::new(),
                })
                .invocations
                .extend(record.invocations.iter().cloned());
        }
        Ok(by_criterion.into_values().collect())
    }

    async fn environment(&self, env_id: EnvId) -> Result<Option<Environment>> {
        Ok(self.dataset.environments.iter().find(|e| e.id == env_id).cloned())
    }

    async fn available_profile(
        &self,
        run_id: RunId,
        series: &DataSeriesId,
    ) -> Result<Option<AvailableProfile>> {
        Ok(self
            .dataset
            .profiles
            .iter()
            .find(|p| {
                p.run_id == run_id
                    && p.commit_id == series.commit_id
                    && p.exp_id == series.exp_id
            })
            .cloned())
    }

    async fn trial_measurements(&self, trial_id: TrialId) -> Result<Option<TrialMeasurements>> {
        let records: Vec<&MeasurementRecord> = self
            .dataset
            .measurements
            .iter()
            .filter(|m| m.trial_id == trial_id)
            .collect();
        let Some(first) = records.first() else {
            return Ok(None);
        };

        let warmup = self
            .dataset
            .runs
            .iter()
            .find(|r| r.run_id == first.run_id)
            .map(|r| r.warmup)
            .unwrap_or_default();

        let mut by_criterion: IndexMap<&str, CriterionSeries> = IndexMap::new();
        for record in records {
            by_criterion
                .entry(record.criterion.name.as_str())
                .or_insert_with(|| CriterionSeries {
                    criterion: record.criterion.clone(),
                    invocations: Vec::new(),
                })
                .invocations
                .extend(record.invocations.iter().cloned());
        }

        Ok(Some(TrialMeasurements {
            trial_id,
            warmup,
            series: by_criterion.into_values().collect(),
        }))
    }
}
