//! Per-iteration series of two trials for warmup plots

use benchcmp_common::{TrialId, TrialMeasurements};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WarmupDataPerCriterion {
    pub criterion: String,
    pub unit: String,
    /// One sequence of iteration values per invocation
    pub values: Vec<Vec<f64>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WarmupDataForTrial {
    pub trial_id: TrialId,
    pub warmup: u32,
    pub data: Vec<WarmupDataPerCriterion>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WarmupData {
    pub trial1: WarmupDataForTrial,
    pub trial2: WarmupDataForTrial,
}

/// Package the requested criteria of both trials, index-aligned.
///
/// A trial without data for a criterion gets an empty value sequence, with
/// the unit taken from the other trial when that one has it.
pub fn extract_warmup(
    trial1: &TrialMeasurements,
    trial2: &TrialMeasurements,
    criteria: &[String],
) -> WarmupData {
    WarmupData {
        trial1: extract_trial(trial1, trial2, criteria),
        trial2: extract_trial(trial2, trial1, criteria),
    }
}

fn extract_trial(
    trial: &TrialMeasurements,
    other: &TrialMeasurements,
    criteria: &[String],
) -> WarmupDataForTrial {
    let data = criteria
        .iter()
        .map(|criterion| {
            let own = trial.series.iter().find(|s| &s.criterion.name == criterion);
            let unit = own
                .or_else(|| other.series.iter().find(|s| &s.criterion.name == criterion))
                .map(|s| s.criterion.unit.clone())
                .unwrap_or_default();

            WarmupDataPerCriterion {
                criterion: criterion.clone(),
                unit,
                values: own.map(|s| s.invocations.clone()).unwrap_or_default(),
            }
        })
        .collect();

    WarmupDataForTrial {
        trial_id: trial.trial_id,
        warmup: trial.warmup,
        data,
    }
}
