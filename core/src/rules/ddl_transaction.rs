//! Disabling the DDL transaction is only justified for concurrent index
//! builds; for anything else it drops the rollback safety net.

use super::{Rule, RuleId};
use crate::format;
use crate::operation::{Operation, OperationKind};
use crate::scope::ScopeState;
use crate::verdict::Verdict;

pub struct DdlTransactionRule;

impl Rule for DdlTransactionRule {
    fn id(&self) -> RuleId {
        RuleId::DdlTransaction
    }

    fn applies_to(&self, kind: OperationKind) -> bool {
        kind != OperationKind::AddIndex
    }

    fn evaluate(&self, operation: &Operation, scope: &ScopeState) -> Verdict {
        if scope.ddl_transaction_disabled && operation.kind() != OperationKind::AddIndex {
            Verdict::Blocked(Box::new(format::ddl_transaction(
                operation.kind(),
                operation.table(),
            )))
        } else {
            Verdict::Allowed
        }
    }
}
