//! Adding a column.
//!
//! A NOT NULL constraint or a non-null default both force a full-table
//! rewrite while the table is locked. A column added with no default, or
//! with an explicit null default, is metadata-only.

use super::{Rule, RuleId};
use crate::format;
use crate::operation::{Operation, OperationKind};
use crate::scope::ScopeState;
use crate::verdict::Verdict;

pub struct AddColumnRule;

impl Rule for AddColumnRule {
    fn id(&self) -> RuleId {
        RuleId::AddColumn
    }

    fn applies_to(&self, kind: OperationKind) -> bool {
        kind == OperationKind::AddColumn
    }

    fn evaluate(&self, operation: &Operation, _scope: &ScopeState) -> Verdict {
        let Operation::AddColumn {
            table,
            column,
            column_type,
            default,
            null,
        } = operation
        else {
            return Verdict::Blocked(Box::new(format::unchecked_kind(
                self.id(),
                operation.kind(),
                operation.table(),
            )));
        };

        // Checked first: a default does not make a NOT NULL column safe
        if *null == Some(false) {
            return Verdict::Blocked(Box::new(format::add_column_not_null(
                table,
                column,
                column_type,
                default.as_ref(),
            )));
        }

        match default {
            Some(value) if !value.is_null() => Verdict::Blocked(Box::new(
                format::add_column_default(table, column, column_type, value),
            )),
            _ => Verdict::Allowed,
        }
    }
}
