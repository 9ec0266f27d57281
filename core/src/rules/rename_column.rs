//! Renaming a column. Always blocked: to a live reader it is an add and a
//! remove at the same instant.

use super::{Rule, RuleId};
use crate::format;
use crate::operation::{Operation, OperationKind};
use crate::scope::ScopeState;
use crate::verdict::Verdict;

pub struct RenameColumnRule;

impl Rule for RenameColumnRule {
    fn id(&self) -> RuleId {
        RuleId::RenameColumn
    }

    fn applies_to(&self, kind: OperationKind) -> bool {
        kind == OperationKind::RenameColumn
    }

    fn evaluate(&self, operation: &Operation, _scope: &ScopeState) -> Verdict {
        let Operation::RenameColumn { table, from, to } = operation else {
            return Verdict::Blocked(Box::new(format::unchecked_kind(
                self.id(),
                operation.kind(),
                operation.table(),
            )));
        };

        Verdict::Blocked(Box::new(format::rename_column(table, from, to)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_always_blocks() {
        let op = Operation::rename_column("users", "fname", "first_name");
        let verdict = RenameColumnRule.evaluate(&op, &ScopeState::default());
        let diagnostic = verdict.diagnostic().expect("rename should block");
        assert_eq!(diagnostic.rule(), RuleId::RenameColumn);
        assert_eq!(diagnostic.table(), "users");
    }
}
