//! Schema changes, data changes and index builds must each live in their own
//! migration. Blocks an operation whose category differs from one already
//! seen in the current migration.

use super::{Rule, RuleId};
use crate::format;
use crate::operation::{Operation, OperationKind};
use crate::scope::ScopeState;
use crate::verdict::Verdict;

pub struct MixedMigrationRule;

impl Rule for MixedMigrationRule {
    fn id(&self) -> RuleId {
        RuleId::MixedMigration
    }

    fn applies_to(&self, _kind: OperationKind) -> bool {
        true
    }

    fn evaluate(&self, operation: &Operation, scope: &ScopeState) -> Verdict {
        let category = operation.category();
        let mixes = scope.seen_categories.iter().any(|seen| *seen != category);

        if mixes {
            Verdict::Blocked(Box::new(format::mixed_migration(
                operation.kind(),
                operation.table(),
                &scope.seen_categories,
                category,
            )))
        } else {
            Verdict::Allowed
        }
    }
}
