use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Number of hash characters shown wherever a revision is displayed
pub const SHORT_HASH_LEN: usize = 6;

/// Unique identifier for projects
pub type ProjectId = i64;

/// Unique identifier for experiments
pub type ExpId = i64;

/// Unique identifier for run configurations
pub type RunId = i64;

/// Unique identifier for trials
pub type TrialId = i64;

/// Unique identifier for environments
pub type EnvId = i64;

/// Full commit hash of a revision
pub type CommitId = String;

/// Abbreviate a commit hash for display.
pub fn short_hash(hash: &str) -> String {
    hash.chars().take(SHORT_HASH_LEN).collect()
}

/// Identifies the set of measurements of one run under one experiment.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataSeriesId {
    pub commit_id: CommitId,
    pub exp_id: ExpId,
}

impl DataSeriesId {
    pub fn new(commit_id: impl Into<CommitId>, exp_id: ExpId) -> Self {
        Self {
            commit_id: commit_id.into(),
            exp_id,
        }
    }
}

impl fmt::Display for DataSeriesId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", short_hash(&self.commit_id), self.exp_id)
    }
}

/// One run as measured on the baseline and on the change revision.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataSeriesVersionComparison {
    pub run_id: RunId,
    pub base: DataSeriesId,
    pub change: DataSeriesId,
}

impl DataSeriesVersionComparison {
    /// Both sides belong to the same experiment definition.
    pub fn is_same_experiment(&self) -> bool {
        self.base.exp_id == self.change.exp_id
    }
}

/// Identifies a benchmark together with the parameters of one run.
///
/// Field names follow the compact form used by report consumers:
/// `b` benchmark, `e` executable, `s` suite, `v` variable value,
/// `c` cores, `i` input size, `ea` extra arguments.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BenchmarkId {
    pub b: String,
    pub e: String,
    pub s: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub v: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub c: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub i: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ea: Option<String>,
}

impl BenchmarkId {
    pub fn new(bench: impl Into<String>, exe: impl Into<String>, suite: impl Into<String>) -> Self {
        Self {
            b: bench.into(),
            e: exe.into(),
            s: suite.into(),
            v: None,
            c: None,
            i: None,
            ea: None,
        }
    }

    /// The same benchmark and parameters, independent of the executable.
    pub fn without_exe(&self) -> BenchmarkKey {
        BenchmarkKey {
            b: self.b.clone(),
            s: self.s.clone(),
            v: self.v.clone(),
            c: self.c.clone(),
            i: self.i.clone(),
            ea: self.ea.clone(),
        }
    }
}

impl fmt::Display for BenchmarkId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.e, self.s, self.b)
    }
}

/// A benchmark with its parameters but without the executable.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BenchmarkKey {
    pub b: String,
    pub s: String,
    pub v: Option<String>,
    pub c: Option<String>,
    pub i: Option<String>,
    pub ea: Option<String>,
}

/// A named, unit-bearing measured quantity.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CriterionData {
    pub name: String,
    pub unit: String,
}

impl CriterionData {
    pub fn new(name: impl Into<String>, unit: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            unit: unit.into(),
        }
    }
}

/// Whether smaller or larger values of a criterion are better.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Polarity {
    #[default]
    LowerIsBetter,
    HigherIsBetter,
}

/// Metadata of a stored revision.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RevisionData {
    pub project_id: ProjectId,
    pub name: String,
    pub source_id: i64,
    pub commit_id: CommitId,
    pub repo_url: String,
    pub branch_or_tag: String,
    pub commit_message: String,
    pub author_name: String,
    pub author_email: String,
    pub committer_name: String,
    pub committer_email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub commit_time: Option<DateTime<Utc>>,
}

/// Machine a run was executed on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Environment {
    pub id: EnvId,
    pub hostname: String,
    pub os_type: String,
    pub memory: u64,
    pub cpu: String,
    pub clock_speed: u64,
}

/// Profiling data recorded for one side of a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AvailableProfile {
    pub run_id: RunId,
    pub trial_id: TrialId,
    pub exp_id: ExpId,
    pub commit_id: CommitId,
    pub benchmark: String,
}

/// A run configuration measured for at least one of two revisions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunConfiguration {
    pub run_id: RunId,
    pub benchmark: BenchmarkId,
    pub cmdline: String,
    pub env_id: EnvId,
    /// Number of leading iterations per invocation considered warmup
    #[serde(default)]
    pub warmup: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base: Option<DataSeriesId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub change: Option<DataSeriesId>,
}

impl RunConfiguration {
    /// Pairing of both sides, when the run was measured on both.
    pub fn version_comparison(&self) -> Option<DataSeriesVersionComparison> {
        match (&self.base, &self.change) {
            (Some(base), Some(change)) => Some(DataSeriesVersionComparison {
                run_id: self.run_id,
                base: base.clone(),
                change: change.clone(),
            }),
            _ => None,
        }
    }
}

/// Raw values of one criterion, one sequence of iterations per invocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CriterionSeries {
    pub criterion: CriterionData,
    pub invocations: Vec<Vec<f64>>,
}

impl CriterionSeries {
    /// Flattened samples, skipping the first `warmup` iterations of each invocation.
    pub fn steady_state(&self, warmup: u32) -> Vec<f64> {
        self.invocations
            .iter()
            .flat_map(|iterations| iterations.iter().skip(warmup as usize).copied())
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.invocations.iter().all(Vec::is_empty)
    }
}

/// All raw values recorded by one trial.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrialMeasurements {
    pub trial_id: TrialId,
    pub warmup: u32,
    pub series: Vec<CriterionSeries>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_hash() {
        assert_eq!(short_hash("deadbeefcafe"), "deadbe");
        assert_eq!(short_hash("abc"), "abc");
    }

    #[test]
    fn test_steady_state_skips_warmup_per_invocation() {
        let series = CriterionSeries {
            criterion: CriterionData::new("total", "ms"),
            invocations: vec![vec![9.0, 5.0, 4.0], vec![8.0, 6.0]],
        };
        assert_eq!(series.steady_state(1), vec![5.0, 4.0, 6.0]);
        assert_eq!(series.steady_state(0).len(), 5);
        assert!(!series.is_empty());
    }

    #[test]
    fn test_version_comparison_requires_both_sides() {
        let mut run = RunConfiguration {
            run_id: 7,
            benchmark: BenchmarkId::new("Fib", "som", "micro"),
            cmdline: "som Fib".to_string(),
            env_id: 1,
            warmup: 0,
            base: Some(DataSeriesId::new("aaaa", 1)),
            change: None,
        };
        assert!(run.version_comparison().is_none());

        run.change = Some(DataSeriesId::new("bbbb", 1));
        let pairing = run.version_comparison().unwrap();
        assert_eq!(pairing.run_id, 7);
        assert!(pairing.is_same_experiment());
    }

    #[test]
    fn test_benchmark_id_serializes_compactly() {
        let mut id = BenchmarkId::new("Fib", "som", "micro");
        id.v = Some("10".to_string());
        let json = serde_json::to_value(&id).unwrap();
        assert_eq!(json["b"], "Fib");
        assert_eq!(json["v"], "10");
        assert!(json.get("ea").is_none());
    }
}
