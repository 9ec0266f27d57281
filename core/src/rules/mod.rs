//! Safety rules
//!
//! Each rule is a stateless unit struct implementing [`Rule`]. The
//! [`RuleSet`] keeps them in evaluation order: the rule specific to an
//! operation kind first, then the rules shared across kinds.
//!
//! | rule              | kinds                                   |
//! |-------------------|-----------------------------------------|
//! | `add_column`      | add_column                              |
//! | `remove_column`   | remove_column                           |
//! | `rename_column`   | rename_column                           |
//! | `add_index`       | add_index                               |
//! | `batch_iteration` | raw_iteration                           |
//! | `ddl_transaction` | every kind except add_index             |
//! | `mixed_migration` | every kind                              |

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::operation::{Operation, OperationKind};
use crate::scope::ScopeState;
use crate::verdict::Verdict;

mod add_column;
mod add_index;
mod batch_iteration;
mod ddl_transaction;
mod mixed_migration;
mod remove_column;
mod rename_column;

pub use add_column::AddColumnRule;
pub use add_index::AddIndexRule;
pub use batch_iteration::BatchIterationRule;
pub use ddl_transaction::DdlTransactionRule;
pub use mixed_migration::MixedMigrationRule;
pub use remove_column::RemoveColumnRule;
pub use rename_column::RenameColumnRule;

/// A single safety check
pub trait Rule: Send + Sync {
    fn id(&self) -> RuleId;

    /// Whether the rule has anything to say about this kind of operation
    fn applies_to(&self, kind: OperationKind) -> bool;

    /// Decide whether the operation is safe in the given scope.
    ///
    /// Only called with kinds `applies_to` accepts. A kind the rule does not
    /// inspect is Blocked, never silently Allowed.
    fn evaluate(&self, operation: &Operation, scope: &ScopeState) -> Verdict;
}

/// Stable identifier of a rule
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleId {
    AddColumn,
    RemoveColumn,
    RenameColumn,
    AddIndex,
    BatchIteration,
    DdlTransaction,
    MixedMigration,
}

impl RuleId {
    pub fn name(&self) -> &'static str {
        match self {
            Self::AddColumn => "add_column",
            Self::RemoveColumn => "remove_column",
            Self::RenameColumn => "rename_column",
            Self::AddIndex => "add_index",
            Self::BatchIteration => "batch_iteration",
            Self::DdlTransaction => "ddl_transaction",
            Self::MixedMigration => "mixed_migration",
        }
    }

    /// One-line description for rule listings
    pub fn summary(&self) -> &'static str {
        match self {
            Self::AddColumn => "new columns must be nullable and have no non-null default",
            Self::RemoveColumn => "columns may only be removed after the code stops using them",
            Self::RenameColumn => "columns may not be renamed in place",
            Self::AddIndex => "indexes must be built concurrently outside the DDL transaction",
            Self::BatchIteration => "unfiltered relations must be iterated in batches",
            Self::DdlTransaction => "the DDL transaction may only be disabled for index builds",
            Self::MixedMigration => "schema, data and index changes belong in separate migrations",
        }
    }
}

impl fmt::Display for RuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

static ADD_COLUMN: AddColumnRule = AddColumnRule;
static REMOVE_COLUMN: RemoveColumnRule = RemoveColumnRule;
static RENAME_COLUMN: RenameColumnRule = RenameColumnRule;
static ADD_INDEX: AddIndexRule = AddIndexRule;
static BATCH_ITERATION: BatchIterationRule = BatchIterationRule;
static DDL_TRANSACTION: DdlTransactionRule = DdlTransactionRule;
static MIXED_MIGRATION: MixedMigrationRule = MixedMigrationRule;

/// Ordered collection of rules consulted by the dispatcher
#[derive(Clone)]
pub struct RuleSet {
    rules: Vec<&'static dyn Rule>,
}

impl RuleSet {
    /// Every built-in rule, kind-specific rules first
    pub fn standard() -> Self {
        Self {
            rules: vec![
                &ADD_COLUMN,
                &REMOVE_COLUMN,
                &RENAME_COLUMN,
                &ADD_INDEX,
                &BATCH_ITERATION,
                &DDL_TRANSACTION,
                &MIXED_MIGRATION,
            ],
        }
    }

    /// Builder: drop a rule from the set
    pub fn without(mut self, id: RuleId) -> Self {
        self.rules.retain(|rule| rule.id() != id);
        self
    }

    pub fn rules(&self) -> impl Iterator<Item = &'static dyn Rule> + '_ {
        self.rules.iter().copied()
    }

    /// Rules applying to a kind, in evaluation order
    pub fn rules_for(&self, kind: OperationKind) -> impl Iterator<Item = &'static dyn Rule> + '_ {
        self.rules().filter(move |rule| rule.applies_to(kind))
    }

    /// Evaluate the operation, stopping at the first blocking rule
    pub fn evaluate(&self, operation: &Operation, scope: &ScopeState) -> Verdict {
        for rule in self.rules_for(operation.kind()) {
            let verdict = rule.evaluate(operation, scope);
            if verdict.is_blocked() {
                return verdict;
            }
        }
        Verdict::Allowed
    }
}

impl Default for RuleSet {
    fn default() -> Self {
        Self::standard()
    }
}

impl fmt::Debug for RuleSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.rules.iter().map(|rule| rule.id()))
            .finish()
    }
}
