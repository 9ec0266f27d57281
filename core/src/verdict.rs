//! Rule outcomes and diagnostics

use std::fmt;

use crate::operation::OperationKind;
use crate::rules::RuleId;

/// Closing line of every diagnostic
const OVERRIDE_HINT: &str = "If you're 100% positive that this migration is already safe, \
then wrap the operation in a safety_assured region.";

/// Outcome of evaluating one rule against one operation
#[derive(Debug, Clone, PartialEq)]
pub enum Verdict {
    Allowed,
    Blocked(Box<Diagnostic>),
}

impl Verdict {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Self::Allowed)
    }

    pub fn is_blocked(&self) -> bool {
        matches!(self, Self::Blocked(_))
    }

    pub fn diagnostic(&self) -> Option<&Diagnostic> {
        match self {
            Self::Allowed => None,
            Self::Blocked(diagnostic) => Some(diagnostic),
        }
    }
}

/// Rendered explanation of why an operation was blocked
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    rule: RuleId,
    kind: OperationKind,
    table: String,
    headline: String,
    hazard: String,
    remediation: String,
}

impl Diagnostic {
    /// Build a diagnostic. `remediation` must not be empty.
    pub(crate) fn new(
        rule: RuleId,
        kind: OperationKind,
        table: impl Into<String>,
        headline: impl Into<String>,
        hazard: impl Into<String>,
        remediation: impl Into<String>,
    ) -> Self {
        let remediation = remediation.into();
        debug_assert!(!remediation.trim().is_empty(), "blocked verdict without remediation");

        Self {
            rule,
            kind,
            table: table.into(),
            headline: headline.into(),
            hazard: hazard.into(),
            remediation,
        }
    }

    pub fn rule(&self) -> RuleId {
        self.rule
    }

    pub fn kind(&self) -> OperationKind {
        self.kind
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    /// One-line summary, e.g. "Adding a column with a default is unsafe!"
    pub fn headline(&self) -> &str {
        &self.headline
    }

    pub fn hazard(&self) -> &str {
        &self.hazard
    }

    pub fn remediation(&self) -> &str {
        &self.remediation
    }

    /// Full plain-text message shown to the migration author
    pub fn message(&self) -> String {
        format!(
            "{}\n\n{}\n\n{}\n\n{}",
            self.headline,
            self.hazard.trim_end(),
            self.remediation.trim_end(),
            OVERRIDE_HINT
        )
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_layout() {
        let diagnostic = Diagnostic::new(
            RuleId::RemoveColumn,
            OperationKind::RemoveColumn,
            "users",
            "Removing a column is unsafe!",
            "Running code still reads it.",
            "Ignore it first.\n",
        );

        let message = diagnostic.message();
        assert!(message.starts_with("Removing a column is unsafe!\n\n"));
        assert!(message.contains("Running code still reads it.\n\nIgnore it first.\n\n"));
        assert!(message.ends_with(OVERRIDE_HINT));
        assert_eq!(diagnostic.to_string(), message);
    }

    #[test]
    fn test_verdict_accessors() {
        assert!(Verdict::Allowed.is_allowed());
        assert!(Verdict::Allowed.diagnostic().is_none());

        let blocked = Verdict::Blocked(Box::new(Diagnostic::new(
            RuleId::AddIndex,
            OperationKind::AddIndex,
            "users",
            "headline",
            "hazard",
            "remediation",
        )));
        assert!(blocked.is_blocked());
        assert_eq!(blocked.diagnostic().map(|d| d.rule()), Some(RuleId::AddIndex));
    }
}
