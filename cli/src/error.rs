//! Centralized error types for zerolock
//!
//! Uses thiserror for typed errors that can be matched on,
//! while still being compatible with anyhow for propagation.

use thiserror::Error;
use zerolock_core::GuardError;

/// Errors raised while replaying migration plans
#[derive(Error, Debug)]
pub enum CheckError {
    #[error("Plan file not found: {path}")]
    PlanNotFound { path: String },

    #[error("Failed to parse plan {path}: {message}")]
    PlanParse { path: String, message: String },

    #[error("Migration {migration}: {source}")]
    Guard {
        migration: String,
        #[source]
        source: GuardError,
    },

    #[error("{count} unsafe operation(s) found")]
    UnsafeOperations { count: usize },
}

impl CheckError {
    /// Process exit code for this failure
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::UnsafeOperations { .. } => 1,
            Self::Guard { source, .. } if source.is_unsafe_operation() => 1,
            _ => 2,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use zerolock_core::ScopeViolation;

    #[test]
    fn test_plan_error_display() {
        let err = CheckError::PlanNotFound {
            path: "plans/missing.yaml".to_string(),
        };
        assert!(err.to_string().contains("plans/missing.yaml"));
    }

    #[test]
    fn test_exit_codes() {
        assert_eq!(CheckError::UnsafeOperations { count: 2 }.exit_code(), 1);

        let corruption = CheckError::Guard {
            migration: "20240101_x".to_string(),
            source: ScopeViolation::OverrideUnderflow.into(),
        };
        assert_eq!(corruption.exit_code(), 2);
        assert!(corruption.to_string().contains("Scope corruption"));
    }
}
