//! Removing a column. Always blocked: a running deployment may still read it.

use super::{Rule, RuleId};
use crate::format;
use crate::operation::{Operation, OperationKind};
use crate::scope::ScopeState;
use crate::verdict::Verdict;

pub struct RemoveColumnRule;

impl Rule for RemoveColumnRule {
    fn id(&self) -> RuleId {
        RuleId::RemoveColumn
    }

    fn applies_to(&self, kind: OperationKind) -> bool {
        kind == OperationKind::RemoveColumn
    }

    fn evaluate(&self, operation: &Operation, _scope: &ScopeState) -> Verdict {
        let Operation::RemoveColumn { table, column } = operation else {
            return Verdict::Blocked(Box::new(format::unchecked_kind(
                self.id(),
                operation.kind(),
                operation.table(),
            )));
        };

        Verdict::Blocked(Box::new(format::remove_column(table, column)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_always_blocks() {
        let scope = ScopeState {
            ddl_transaction_disabled: true,
            ..ScopeState::default()
        };
        for scope in [ScopeState::default(), scope] {
            let verdict = RemoveColumnRule.evaluate(&Operation::remove_column("users", "active"), &scope);
            assert!(verdict.is_blocked());
        }
    }

    #[test]
    fn test_ignores_other_kinds() {
        assert!(!RemoveColumnRule.applies_to(OperationKind::AddColumn));
        assert!(RemoveColumnRule.applies_to(OperationKind::RemoveColumn));
    }
}
