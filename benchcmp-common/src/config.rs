//! Configuration management for benchcmp

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::error::{CompareError, Result};
use crate::types::Polarity;

/// Confidence levels with a tabulated critical value
pub const SUPPORTED_CONFIDENCE_LEVELS: [f64; 3] = [0.90, 0.95, 0.99];

/// Settings of the comparison statistics
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StatsConfig {
    /// Confidence level of the significance test
    pub confidence_level: f64,
    /// Relative change at or below which a criterion counts as unchanged
    pub change_threshold: f64,
    /// Criteria for which larger values are better (e.g. throughput)
    pub higher_is_better: Vec<String>,
}

impl Default for StatsConfig {
    fn default() -> Self {
        Self {
            confidence_level: 0.95,
            change_threshold: 0.01,
            higher_is_better: Vec::new(),
        }
    }
}

impl StatsConfig {
    pub fn polarity_of(&self, criterion: &str) -> Polarity {
        if self.higher_is_better.iter().any(|c| c == criterion) {
            Polarity::HigherIsBetter
        } else {
            Polarity::LowerIsBetter
        }
    }

    pub fn validate(&self) -> Result<()> {
        if !SUPPORTED_CONFIDENCE_LEVELS
            .iter()
            .any(|level| (level - self.confidence_level).abs() < 1e-9)
        {
            return Err(CompareError::Config(format!(
                "unsupported confidence level {}, expected one of {:?}",
                self.confidence_level, SUPPORTED_CONFIDENCE_LEVELS
            )));
        }
        if !(self.change_threshold >= 0.0) {
            return Err(CompareError::Config(format!(
                "change threshold must be non-negative, got {}",
                self.change_threshold
            )));
        }
        Ok(())
    }
}

/// Settings only the rendering layer interprets
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ReportConfig {
    /// The URL part where reports are stored, and publicly accessible
    pub reports_url: String,
    pub overview_plot_width: u32,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            reports_url: "/static/reports".to_string(),
            overview_plot_width: 432,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub stats: StatsConfig,
    pub report: ReportConfig,
}

impl EngineConfig {
    /// Load configuration from a TOML file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)
            .map_err(|e| CompareError::Config(format!("{}: {}", path.display(), e)))?;
        config.stats.validate()?;
        Ok(config)
    }

    /// Save configuration to a TOML file
    pub fn to_file(&self, path: &Path) -> Result<()> {
        let content =
            toml::to_string_pretty(self).map_err(|e| CompareError::Config(e.to_string()))?;
        std::fs::create_dir_all(path.parent().unwrap_or(&PathBuf::from(".")))?;
        std::fs::write(path, content)?;
        Ok(())
    }
}

/// Configuration source for loading engine settings
pub enum ConfigSource {
    File(PathBuf),
    Default,
    Environment,
}

/// Load engine configuration from various sources
pub fn load_config(source: ConfigSource) -> Result<EngineConfig> {
    match source {
        ConfigSource::File(path) => EngineConfig::from_file(&path),
        ConfigSource::Default => Ok(EngineConfig::default()),
        ConfigSource::Environment => {
            let mut config = EngineConfig::default();

            // Override with environment variables if present
            if let Ok(confidence) = std::env::var("BENCHCMP_CONFIDENCE") {
                config.stats.confidence_level = confidence.parse().map_err(|_| {
                    CompareError::Config(format!("invalid BENCHCMP_CONFIDENCE: {}", confidence))
                })?;
            }

            if let Ok(threshold) = std::env::var("BENCHCMP_CHANGE_THRESHOLD") {
                config.stats.change_threshold = threshold.parse().map_err(|_| {
                    CompareError::Config(format!(
                        "invalid BENCHCMP_CHANGE_THRESHOLD: {}",
                        threshold
                    ))
                })?;
            }

            if let Ok(url) = std::env::var("BENCHCMP_REPORTS_URL") {
                config.report.reports_url = url;
            }

            debug!("Loaded configuration from environment: {:?}", config);
            config.stats.validate()?;
            Ok(config)
        }
    }
}
