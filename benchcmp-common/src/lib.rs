pub mod types;
pub mod error;
pub mod config;

pub use types::*;
pub use error::{CompareError, Result};
pub use config::{load_config, ConfigSource, EngineConfig, ReportConfig, StatsConfig};
