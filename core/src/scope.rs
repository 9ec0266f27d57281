//! Scope tracking for one migration run
//!
//! The tracker answers a single question for the dispatcher: "is the
//! operation about to run exempt from rule evaluation right now?". It also
//! carries the per-migration facts some rules read (DDL transaction mode and
//! the categories of operations already seen).
//!
//! ## Lifecycle
//!
//! ```text
//! begin_migration ─▶ set_rollback / set_ddl_transaction_disabled (once each)
//!                 ─▶ operations (override regions nest LIFO)
//!                 ─▶ finish_migration
//! ```
//!
//! Every misuse of that lifecycle is reported as a [`ScopeViolation`].

use std::collections::BTreeSet;

use crate::config::GuardConfig;
use crate::error::ScopeViolation;
use crate::operation::Category;

/// Why an operation skipped rule evaluation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Exemption {
    /// Process-wide override switch is on
    GlobalOverride,
    /// Full schema load rather than an incremental migration
    SchemaLoad,
    /// Down migration
    Rollback,
    /// Inside a `safety_assured` region
    OverrideRegion,
}

impl Exemption {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::GlobalOverride => "global override",
            Self::SchemaLoad => "schema load",
            Self::Rollback => "rollback",
            Self::OverrideRegion => "safety assured",
        }
    }
}

/// Read-only view of the scope handed to rules
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScopeState {
    pub global_override: bool,
    pub schema_load: bool,
    pub override_active: bool,
    pub override_depth: usize,
    pub is_rollback: bool,
    pub ddl_transaction_disabled: bool,
    /// Categories of operations already allowed in the current migration
    pub seen_categories: BTreeSet<Category>,
}

impl ScopeState {
    /// Exemption in effect, if any. Checked in order of precedence.
    pub fn exemption(&self) -> Option<Exemption> {
        if self.global_override {
            Some(Exemption::GlobalOverride)
        } else if self.schema_load {
            Some(Exemption::SchemaLoad)
        } else if self.is_rollback {
            Some(Exemption::Rollback)
        } else if self.override_active && self.override_depth > 0 {
            Some(Exemption::OverrideRegion)
        } else {
            None
        }
    }

    pub fn is_exempt(&self) -> bool {
        self.exemption().is_some()
    }
}

/// Mutable scope state owned by a single migration run
#[derive(Debug)]
pub struct ScopeTracker {
    state: ScopeState,
    migration: Option<String>,
    rollback_set: bool,
    ddl_set: bool,
    operations_seen: usize,
}

impl ScopeTracker {
    /// Create a tracker for a new run
    pub fn new(config: &GuardConfig) -> Self {
        Self {
            state: ScopeState {
                global_override: config.global_override,
                schema_load: config.schema_load,
                ..ScopeState::default()
            },
            migration: None,
            rollback_set: false,
            ddl_set: false,
            operations_seen: 0,
        }
    }

    pub fn state(&self) -> &ScopeState {
        &self.state
    }

    /// Name of the migration currently in progress
    pub fn current_migration(&self) -> Option<&str> {
        self.migration.as_deref()
    }

    pub fn is_exempt(&self) -> bool {
        self.state.is_exempt()
    }

    pub fn exemption(&self) -> Option<Exemption> {
        self.state.exemption()
    }

    /// Start a new migration unit, clearing per-migration state
    pub fn begin_migration(&mut self, name: impl Into<String>) -> Result<(), ScopeViolation> {
        if self.state.override_depth > 0 {
            return Err(ScopeViolation::UnbalancedOverride {
                depth: self.state.override_depth,
            });
        }

        self.migration = Some(name.into());
        self.state.is_rollback = false;
        self.state.ddl_transaction_disabled = false;
        self.state.seen_categories.clear();
        self.rollback_set = false;
        self.ddl_set = false;
        self.operations_seen = 0;
        Ok(())
    }

    /// End the current migration unit
    pub fn finish_migration(&mut self) -> Result<(), ScopeViolation> {
        if self.state.override_depth > 0 {
            return Err(ScopeViolation::UnbalancedOverride {
                depth: self.state.override_depth,
            });
        }

        self.migration = None;
        Ok(())
    }

    /// Mark the current migration as a down (rollback) migration
    pub fn set_rollback(&mut self, rollback: bool) -> Result<(), ScopeViolation> {
        self.ensure_configurable("rollback", self.rollback_set)?;
        self.state.is_rollback = rollback;
        self.rollback_set = true;
        Ok(())
    }

    /// Record whether the migration runs outside the atomic DDL transaction
    pub fn set_ddl_transaction_disabled(&mut self, disabled: bool) -> Result<(), ScopeViolation> {
        self.ensure_configurable("ddl_transaction_disabled", self.ddl_set)?;
        self.state.ddl_transaction_disabled = disabled;
        self.ddl_set = true;
        Ok(())
    }

    fn ensure_configurable(&self, flag: &'static str, already_set: bool) -> Result<(), ScopeViolation> {
        if already_set {
            return Err(ScopeViolation::FlagAlreadySet { flag });
        }
        if self.operations_seen > 0 {
            return Err(ScopeViolation::FlagAfterStart {
                flag,
                operations: self.operations_seen,
            });
        }
        Ok(())
    }

    /// Open an override region
    pub fn enter_override(&mut self) {
        self.state.override_depth += 1;
        self.state.override_active = true;
    }

    /// Close the innermost override region
    pub fn exit_override(&mut self) -> Result<(), ScopeViolation> {
        if self.state.override_depth == 0 {
            return Err(ScopeViolation::OverrideUnderflow);
        }

        self.state.override_depth -= 1;
        if self.state.override_depth == 0 {
            self.state.override_active = false;
        }
        Ok(())
    }

    /// Reset the region stack to `depth` after a misbehaving region body
    pub(crate) fn restore_override_depth(&mut self, depth: usize) {
        self.state.override_depth = depth;
        self.state.override_active = depth > 0;
    }

    /// Note that an operation was dispatched (flags are frozen from here on)
    pub(crate) fn observe(&mut self) {
        self.operations_seen += 1;
    }

    /// Remember the category of an operation that passed the rules
    pub(crate) fn record(&mut self, category: Category) {
        self.state.seen_categories.insert(category);
    }
}
