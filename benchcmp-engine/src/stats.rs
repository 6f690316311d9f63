//! Comparison statistics for the measurements of two revisions
//!
//! Every comparison uses the arithmetic mean as central tendency. The change
//! metric is the relative difference of the change mean to the baseline mean,
//! and significance comes from Welch's t-test against a two-sided Student-t
//! critical value at the configured confidence level.

use benchcmp_common::{Polarity, StatsConfig};
use serde::{Deserialize, Serialize};

/// Two-sided Student-t critical values for 1..=30 degrees of freedom
const T_TABLE_90: [f64; 30] = [
    6.314, 2.920, 2.353, 2.132, 2.015, 1.943, 1.895, 1.860, 1.833, 1.812,
    1.796, 1.782, 1.771, 1.761, 1.753, 1.746, 1.740, 1.734, 1.729, 1.725,
    1.721, 1.717, 1.714, 1.711, 1.708, 1.706, 1.703, 1.701, 1.699, 1.697,
];
const T_TABLE_95: [f64; 30] = [
    12.706, 4.303, 3.182, 2.776, 2.571, 2.447, 2.365, 2.306, 2.262, 2.228,
    2.201, 2.179, 2.160, 2.145, 2.131, 2.120, 2.110, 2.101, 2.093, 2.086,
    2.080, 2.074, 2.069, 2.064, 2.060, 2.056, 2.052, 2.048, 2.045, 2.042,
];
const T_TABLE_99: [f64; 30] = [
    63.657, 9.925, 5.841, 4.604, 4.032, 3.707, 3.499, 3.355, 3.250, 3.169,
    3.106, 3.055, 3.012, 2.977, 2.947, 2.921, 2.898, 2.878, 2.861, 2.845,
    2.831, 2.819, 2.807, 2.797, 2.787, 2.779, 2.771, 2.763, 2.756, 2.750,
];

/// Descriptive statistics of one side of a comparison
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SampleSummary {
    pub samples: usize,
    pub mean: f64,
    pub median: f64,
    /// Sample standard deviation (n - 1)
    pub std_dev: f64,
}

impl SampleSummary {
    /// Summarize the given values, `None` for an empty series.
    pub fn from_values(values: &[f64]) -> Option<Self> {
        if values.is_empty() {
            return None;
        }

        let n = values.len();
        let mean = values.iter().sum::<f64>() / n as f64;
        let variance = if n > 1 {
            values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1) as f64
        } else {
            0.0
        };

        let mut sorted = values.to_vec();
        sorted.sort_by(f64::total_cmp);
        let median = if n % 2 == 1 {
            sorted[n / 2]
        } else {
            (sorted[n / 2 - 1] + sorted[n / 2]) / 2.0
        };

        Some(Self {
            samples: n,
            mean,
            median,
            std_dev: variance.sqrt(),
        })
    }

    fn variance(&self) -> f64 {
        self.std_dev * self.std_dev
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ChangeDirection {
    Improvement,
    Regression,
    Unchanged,
    /// Baseline mean is zero while the change mean is not
    Undefined,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Significance {
    Significant,
    NotSignificant,
    /// Fewer than two samples on at least one side
    Insufficient,
}

/// Result of comparing the baseline and change series of one criterion
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComparisonStatistics {
    pub base: SampleSummary,
    pub change: SampleSummary,
    /// `mean(change) / mean(base) - 1`, `None` when undefined
    pub change_m: Option<f64>,
    pub direction: ChangeDirection,
    pub significance: Significance,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub t_statistic: Option<f64>,
}

impl ComparisonStatistics {
    /// Ratio of the change mean to the baseline mean.
    pub fn ratio(&self) -> Option<f64> {
        self.change_m.map(|m| m + 1.0)
    }
}

/// Aggregate over the change ratios of many series
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryStatistics {
    pub min: f64,
    pub max: f64,
    pub geomean: f64,
}

impl SummaryStatistics {
    /// Only finite, positive ratios participate; `None` if none remain.
    pub fn from_ratios(ratios: &[f64]) -> Option<Self> {
        let usable: Vec<f64> = ratios
            .iter()
            .copied()
            .filter(|r| r.is_finite() && *r > 0.0)
            .collect();
        if usable.is_empty() {
            return None;
        }

        let log_sum: f64 = usable.iter().map(|r| r.ln()).sum();
        Some(Self {
            min: usable.iter().copied().fold(f64::INFINITY, f64::min),
            max: usable.iter().copied().fold(f64::NEG_INFINITY, f64::max),
            geomean: (log_sum / usable.len() as f64).exp(),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryStatsWithUnit {
    pub stats: SummaryStatistics,
    pub unit: String,
}

/// Computes [`ComparisonStatistics`] with a fixed statistical configuration
#[derive(Debug, Clone)]
pub struct ComparisonAnalyzer {
    config: StatsConfig,
}

impl ComparisonAnalyzer {
    pub fn new() -> Self {
        Self::with_config(StatsConfig::default())
    }

    pub fn with_config(config: StatsConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &StatsConfig {
        &self.config
    }

    /// Compare two series of one criterion.
    ///
    /// Returns `None` when either side has no samples; the caller records
    /// that as missing data instead.
    pub fn compare(
        &self,
        criterion: &str,
        base: &[f64],
        change: &[f64],
    ) -> Option<ComparisonStatistics> {
        let base = SampleSummary::from_values(base)?;
        let change = SampleSummary::from_values(change)?;

        let change_m = relative_change(base.mean, change.mean);
        let direction = match change_m {
            None => ChangeDirection::Undefined,
            Some(m) if m.abs() <= self.config.change_threshold => ChangeDirection::Unchanged,
            Some(m) => match (self.config.polarity_of(criterion), m > 0.0) {
                (Polarity::LowerIsBetter, true) | (Polarity::HigherIsBetter, false) => {
                    ChangeDirection::Regression
                }
                _ => ChangeDirection::Improvement,
            },
        };

        let (significance, t_statistic) = self.welch_test(&base, &change);

        Some(ComparisonStatistics {
            base,
            change,
            change_m,
            direction,
            significance,
            t_statistic,
        })
    }

    fn welch_test(
        &self,
        base: &SampleSummary,
        change: &SampleSummary,
    ) -> (Significance, Option<f64>) {
        if base.samples < 2 || change.samples < 2 {
            return (Significance::Insufficient, None);
        }

        let vb = base.variance() / base.samples as f64;
        let vc = change.variance() / change.samples as f64;
        let diff = change.mean - base.mean;
        let standard_error = (vb + vc).sqrt();

        if standard_error == 0.0 {
            let significance = if diff == 0.0 {
                Significance::NotSignificant
            } else {
                Significance::Significant
            };
            return (significance, None);
        }

        let t = diff / standard_error;
        let df = (vb + vc).powi(2)
            / (vb.powi(2) / (base.samples - 1) as f64 + vc.powi(2) / (change.samples - 1) as f64);

        let significance = if t.abs() > t_critical(df, self.config.confidence_level) {
            Significance::Significant
        } else {
            Significance::NotSignificant
        };
        (significance, Some(t))
    }
}

impl Default for ComparisonAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

fn relative_change(base_mean: f64, change_mean: f64) -> Option<f64> {
    if base_mean == 0.0 {
        if change_mean == 0.0 {
            Some(0.0)
        } else {
            None
        }
    } else {
        Some(change_mean / base_mean - 1.0)
    }
}

/// Two-sided critical value; fractional degrees of freedom round down.
fn t_critical(df: f64, confidence_level: f64) -> f64 {
    let (table, normal) = match confidence_level {
        x if x >= 0.99 => (&T_TABLE_99, 2.576),
        x if x >= 0.95 => (&T_TABLE_95, 1.960),
        _ => (&T_TABLE_90, 1.645),
    };

    let df = if df.is_finite() { df.floor().max(1.0) as usize } else { usize::MAX };
    if df <= table.len() {
        table[df - 1]
    } else {
        normal
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sample_summary() {
        let summary = SampleSummary::from_values(&[4.0, 1.0, 3.0, 2.0]).unwrap();
        assert_eq!(summary.samples, 4);
        assert_eq!(summary.mean, 2.5);
        assert_eq!(summary.median, 2.5);
        assert!((summary.std_dev - 1.291).abs() < 0.001);

        assert!(SampleSummary::from_values(&[]).is_none());
    }

    #[test]
    fn test_regression_example() {
        let analyzer = ComparisonAnalyzer::new();
        let stats = analyzer
            .compare("total", &[100.0, 102.0, 98.0], &[120.0, 118.0, 119.0])
            .unwrap();

        let change = stats.change_m.unwrap();
        assert!((change - 0.19).abs() < 1e-9);
        assert_eq!(stats.direction, ChangeDirection::Regression);
        assert_eq!(stats.significance, Significance::Significant);
        assert!(stats.t_statistic.unwrap() > 0.0);
        assert!((stats.ratio().unwrap() - 1.19).abs() < 1e-9);
    }

    #[test]
    fn test_higher_is_better_flips_direction() {
        let analyzer = ComparisonAnalyzer::with_config(StatsConfig {
            higher_is_better: vec!["throughput".to_string()],
            ..Default::default()
        });
        let stats = analyzer.compare("throughput", &[10.0, 10.0], &[12.0, 12.0]).unwrap();
        assert_eq!(stats.direction, ChangeDirection::Improvement);

        let stats = analyzer.compare("total", &[10.0, 10.0], &[12.0, 12.0]).unwrap();
        assert_eq!(stats.direction, ChangeDirection::Regression);
    }

    #[test]
    fn test_zero_baseline_is_undefined() {
        let analyzer = ComparisonAnalyzer::new();
        let stats = analyzer.compare("GC", &[0.0, 0.0], &[3.0, 5.0]).unwrap();
        assert_eq!(stats.change_m, None);
        assert_eq!(stats.direction, ChangeDirection::Undefined);

        let stats = analyzer.compare("GC", &[0.0], &[0.0]).unwrap();
        assert_eq!(stats.change_m, Some(0.0));
        assert_eq!(stats.direction, ChangeDirection::Unchanged);
        assert_eq!(stats.significance, Significance::Insufficient);
    }

    #[test]
    fn test_empty_side_yields_no_statistics() {
        let analyzer = ComparisonAnalyzer::new();
        assert!(analyzer.compare("total", &[], &[1.0]).is_none());
        assert!(analyzer.compare("total", &[1.0], &[]).is_none());
    }

    #[test]
    fn test_unequal_sample_counts() {
        let analyzer = ComparisonAnalyzer::new();
        let stats = analyzer
            .compare("total", &[10.0, 11.0, 9.0, 10.0, 10.0], &[10.1, 9.9])
            .unwrap();
        assert_eq!(stats.base.samples, 5);
        assert_eq!(stats.change.samples, 2);
        assert_eq!(stats.direction, ChangeDirection::Unchanged);
        assert_eq!(stats.significance, Significance::NotSignificant);
    }

    #[test]
    fn test_constant_series_significance() {
        let analyzer = ComparisonAnalyzer::new();
        let stats = analyzer.compare("total", &[5.0, 5.0], &[6.0, 6.0]).unwrap();
        assert_eq!(stats.significance, Significance::Significant);
        assert!(stats.t_statistic.is_none());

        let stats = analyzer.compare("total", &[5.0, 5.0], &[5.0, 5.0]).unwrap();
        assert_eq!(stats.significance, Significance::NotSignificant);
    }

    #[test]
    fn test_t_critical_lookup() {
        assert_eq!(t_critical(1.0, 0.95), 12.706);
        assert_eq!(t_critical(2.94, 0.95), 4.303);
        assert_eq!(t_critical(0.3, 0.95), 12.706);
        assert_eq!(t_critical(120.0, 0.99), 2.576);
        assert_eq!(t_critical(10.0, 0.90), 1.812);
    }

    #[test]
    fn test_summary_from_ratios() {
        let summary = SummaryStatistics::from_ratios(&[0.5, 2.0, f64::NAN, -1.0]).unwrap();
        assert_eq!(summary.min, 0.5);
        assert_eq!(summary.max, 2.0);
        assert!((summary.geomean - 1.0).abs() < 1e-12);

        assert!(SummaryStatistics::from_ratios(&[f64::INFINITY]).is_none());
    }
}
