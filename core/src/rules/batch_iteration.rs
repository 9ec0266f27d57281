//! Iterating rows inside a migration.
//!
//! Loading an unfiltered relation into memory before iterating is blocked;
//! batched retrieval or a filtered relation is allowed.

use super::{Rule, RuleId};
use crate::format;
use crate::operation::{Operation, OperationKind};
use crate::scope::ScopeState;
use crate::verdict::Verdict;

pub struct BatchIterationRule;

impl Rule for BatchIterationRule {
    fn id(&self) -> RuleId {
        RuleId::BatchIteration
    }

    fn applies_to(&self, kind: OperationKind) -> bool {
        kind == OperationKind::RawIteration
    }

    fn evaluate(&self, operation: &Operation, _scope: &ScopeState) -> Verdict {
        let Operation::RawIteration {
            table,
            scoped,
            batched,
        } = operation
        else {
            return Verdict::Blocked(Box::new(format::unchecked_kind(
                self.id(),
                operation.kind(),
                operation.table(),
            )));
        };

        if *batched || *scoped {
            Verdict::Allowed
        } else {
            Verdict::Blocked(Box::new(format::batch_iteration(table)))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn iteration(scoped: bool, batched: bool) -> Operation {
        Operation::RawIteration {
            table: "users".to_string(),
            scoped,
            batched,
        }
    }

    #[test]
    fn test_blocks_unscoped_unbatched() {
        let verdict = BatchIterationRule.evaluate(&iteration(false, false), &ScopeState::default());
        assert!(verdict.is_blocked());
    }

    #[test]
    fn test_allows_batched_or_scoped() {
        for (scoped, batched) in [(true, false), (false, true), (true, true)] {
            let verdict =
                BatchIterationRule.evaluate(&iteration(scoped, batched), &ScopeState::default());
            assert!(verdict.is_allowed(), "scoped={} batched={}", scoped, batched);
        }
    }
}
