//! Alignment of baseline and change series and detection of missing data

use benchcmp_common::{CommitId, CompareError, CriterionData, CriterionSeries, Result};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::warn;

/// The named commit has no data for the named criterion
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MissingData {
    pub commit_id: CommitId,
    pub criterion: CriterionData,
}

/// Steady-state samples of both sides for one criterion
#[derive(Debug, Clone, PartialEq)]
pub struct AlignedSeries {
    pub criterion: CriterionData,
    pub base: Vec<f64>,
    pub change: Vec<f64>,
}

impl AlignedSeries {
    pub fn is_complete(&self) -> bool {
        !self.base.is_empty() && !self.change.is_empty()
    }
}

/// Pair up the criteria of both sides.
///
/// Criteria keep first-seen order, baseline first. A criterion reported
/// twice on one side, or with different units on the two sides, is a
/// contract violation. Each side drops its own warmup iterations unless
/// that would leave no samples, in which case every iteration is kept.
pub fn align_series(
    base: &[CriterionSeries],
    base_warmup: u32,
    change: &[CriterionSeries],
    change_warmup: u32,
) -> Result<Vec<AlignedSeries>> {
    let mut aligned: IndexMap<&str, AlignedSeries> = IndexMap::new();

    for series in base {
        let name = series.criterion.name.as_str();
        if aligned.contains_key(name) {
            return Err(CompareError::MalformedInput(format!(
                "criterion '{}' reported twice for the baseline",
                name
            )));
        }
        aligned.insert(
            name,
            AlignedSeries {
                criterion: series.criterion.clone(),
                base: samples(series, base_warmup),
                change: Vec::new(),
            },
        );
    }

    let mut seen_in_change = Vec::with_capacity(change.len());
    for series in change {
        let name = series.criterion.name.as_str();
        if seen_in_change.contains(&name) {
            return Err(CompareError::MalformedInput(format!(
                "criterion '{}' reported twice for the change",
                name
            )));
        }
        seen_in_change.push(name);

        let entry = aligned.entry(name).or_insert_with(|| AlignedSeries {
            criterion: series.criterion.clone(),
            base: Vec::new(),
            change: Vec::new(),
        });
        if entry.criterion.unit != series.criterion.unit {
            return Err(CompareError::MalformedInput(format!(
                "criterion '{}' measured in '{}' and '{}'",
                name, entry.criterion.unit, series.criterion.unit
            )));
        }
        entry.change = samples(series, change_warmup);
    }

    Ok(aligned.into_values().collect())
}

fn samples(series: &CriterionSeries, warmup: u32) -> Vec<f64> {
    let steady = series.steady_state(warmup);
    if steady.is_empty() && !series.is_empty() {
        warn!(
            "Warmup of {} iterations covers every value of '{}', keeping all iterations",
            warmup, series.criterion.name
        );
        return series.steady_state(0);
    }
    steady
}

/// Missing entries ordered by commit (baseline, then change), then criterion order.
pub fn detect_missing(
    base_commit: &str,
    change_commit: &str,
    aligned: &[AlignedSeries],
) -> Vec<MissingData> {
    let base_missing = aligned
        .iter()
        .filter(|a| a.base.is_empty())
        .map(|a| MissingData {
            commit_id: base_commit.to_string(),
            criterion: a.criterion.clone(),
        });
    let change_missing = aligned
        .iter()
        .filter(|a| a.change.is_empty())
        .map(|a| MissingData {
            commit_id: change_commit.to_string(),
            criterion: a.criterion.clone(),
        });

    base_missing.chain(change_missing).collect()
}
