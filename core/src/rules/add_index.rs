//! Adding an index.
//!
//! Safe only when built with the concurrent algorithm AND the migration runs
//! outside the DDL transaction. Anything else is blocked, including a missing
//! algorithm.

use super::{Rule, RuleId};
use crate::format;
use crate::operation::{IndexAlgorithm, Operation, OperationKind};
use crate::scope::ScopeState;
use crate::verdict::Verdict;

pub struct AddIndexRule;

impl Rule for AddIndexRule {
    fn id(&self) -> RuleId {
        RuleId::AddIndex
    }

    fn applies_to(&self, kind: OperationKind) -> bool {
        kind == OperationKind::AddIndex
    }

    fn evaluate(&self, operation: &Operation, scope: &ScopeState) -> Verdict {
        let Operation::AddIndex {
            table,
            columns,
            algorithm,
            unique,
            ..
        } = operation
        else {
            return Verdict::Blocked(Box::new(format::unchecked_kind(
                self.id(),
                operation.kind(),
                operation.table(),
            )));
        };

        match (algorithm, scope.ddl_transaction_disabled) {
            (Some(IndexAlgorithm::Concurrently), true) => Verdict::Allowed,
            (Some(IndexAlgorithm::Concurrently), false) => Verdict::Blocked(Box::new(
                format::add_index_in_transaction(table, columns, *unique),
            )),
            (_, _) => Verdict::Blocked(Box::new(format::add_index_non_concurrent(
                table, columns, *unique,
            ))),
        }
    }
}
