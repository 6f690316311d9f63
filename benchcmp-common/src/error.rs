use thiserror::Error;
use crate::types::TrialId;

/// Main error type for benchcmp
#[derive(Error, Debug)]
pub enum CompareError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Malformed input: {0}")]
    MalformedInput(String),

    #[error("Trial {0} not found")]
    TrialNotFound(TrialId),
}

impl CompareError {
    /// Upstream data violates a structural contract of the report model.
    pub fn is_contract_violation(&self) -> bool {
        matches!(self, CompareError::MalformedInput(_))
    }
}

pub type Result<T> = std::result::Result<T, CompareError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = CompareError::TrialNotFound(42);
        assert_eq!(err.to_string(), "Trial 42 not found");

        let err = CompareError::MalformedInput("unit mismatch".to_string());
        assert!(err.to_string().contains("unit mismatch"));
        assert!(err.is_contract_violation());
        assert!(!CompareError::Storage("down".to_string()).is_contract_violation());
    }
}
