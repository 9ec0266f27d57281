//! Error types for the migration guard
//!
//! Uses thiserror so hosts can match on the failure class:
//! an unsafe operation is the migration author's problem, a scope violation
//! is a bug in the host integration.

use thiserror::Error;

use crate::verdict::Diagnostic;

/// Top-level error returned by the dispatcher
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GuardError {
    /// A rule blocked the operation; the migration must abort
    #[error("{0}")]
    UnsafeOperation(Box<Diagnostic>),

    /// The host broke the scope-tracking contract; not meant to be caught
    #[error("Scope corruption: {0}")]
    ScopeCorruption(#[from] ScopeViolation),
}

impl GuardError {
    /// Diagnostic carried by an unsafe-operation error
    pub fn diagnostic(&self) -> Option<&Diagnostic> {
        match self {
            Self::UnsafeOperation(diagnostic) => Some(diagnostic),
            Self::ScopeCorruption(_) => None,
        }
    }

    pub fn is_unsafe_operation(&self) -> bool {
        matches!(self, Self::UnsafeOperation(_))
    }
}

/// Misuse of the scope lifecycle
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ScopeViolation {
    #[error("override region exited without a matching entry")]
    OverrideUnderflow,

    #[error("{depth} override region(s) still open at a migration boundary")]
    UnbalancedOverride { depth: usize },

    #[error("{flag} was already set for this migration")]
    FlagAlreadySet { flag: &'static str },

    #[error("{flag} changed after {operations} operation(s) had already run")]
    FlagAfterStart {
        flag: &'static str,
        operations: usize,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scope_violation_display() {
        let err = ScopeViolation::FlagAfterStart {
            flag: "rollback",
            operations: 2,
        };
        assert_eq!(
            err.to_string(),
            "rollback changed after 2 operation(s) had already run"
        );
    }

    #[test]
    fn test_error_conversion() {
        let err: GuardError = ScopeViolation::OverrideUnderflow.into();
        assert!(matches!(err, GuardError::ScopeCorruption(_)));
        assert!(!err.is_unsafe_operation());
        assert!(err.diagnostic().is_none());
        assert!(err.to_string().starts_with("Scope corruption"));
    }
}
