//! Interception dispatcher
//!
//! The host runner calls [`Dispatcher::check`] (or [`Dispatcher::execute`])
//! for every operation before performing it. Each call walks the same path:
//!
//! ```text
//! observed ─▶ exempt? ──yes──▶ Exempted ─▶ operation proceeds
//!                │
//!                no
//!                ▼
//!          rules evaluated ─▶ Allowed ─▶ operation proceeds
//!                         └─▶ Blocked ─▶ Err(UnsafeOperation), operation never runs
//! ```
//!
//! The dispatcher owns the run's [`ScopeTracker`]; one dispatcher per run.

use tracing::{debug, warn};

use crate::config::GuardConfig;
use crate::error::{GuardError, ScopeViolation};
use crate::operation::Operation;
use crate::rules::RuleSet;
use crate::scope::{Exemption, ScopeTracker};
use crate::verdict::Verdict;

/// Result of a dispatch that did not block
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Rules were skipped
    Exempted(Exemption),
    /// Rules ran and all passed
    Allowed,
}

/// Per-run dispatch counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchStats {
    pub exempted: usize,
    pub allowed: usize,
    pub blocked: usize,
}

impl DispatchStats {
    pub fn total(&self) -> usize {
        self.exempted + self.allowed + self.blocked
    }
}

/// Gate between the host runner and the operations it executes
#[derive(Debug)]
pub struct Dispatcher {
    rules: RuleSet,
    scope: ScopeTracker,
    stats: DispatchStats,
}

impl Dispatcher {
    /// Create a dispatcher with the standard rule set
    pub fn new(config: GuardConfig) -> Self {
        Self::with_rules(config, RuleSet::standard())
    }

    pub fn with_rules(config: GuardConfig, rules: RuleSet) -> Self {
        if config.global_override {
            warn!("Global override is on: every operation will be exempt from safety checks");
        }

        Self {
            rules,
            scope: ScopeTracker::new(&config),
            stats: DispatchStats::default(),
        }
    }

    pub fn scope(&self) -> &ScopeTracker {
        &self.scope
    }

    pub fn rules(&self) -> &RuleSet {
        &self.rules
    }

    pub fn stats(&self) -> DispatchStats {
        self.stats
    }

    pub fn begin_migration(&mut self, name: impl Into<String>) -> Result<(), GuardError> {
        let name = name.into();
        debug!("Begin migration {}", name);
        self.scope.begin_migration(name)?;
        Ok(())
    }

    pub fn finish_migration(&mut self) -> Result<(), GuardError> {
        self.scope.finish_migration()?;
        Ok(())
    }

    pub fn set_rollback(&mut self, rollback: bool) -> Result<(), GuardError> {
        self.scope.set_rollback(rollback)?;
        Ok(())
    }

    pub fn set_ddl_transaction_disabled(&mut self, disabled: bool) -> Result<(), GuardError> {
        self.scope.set_ddl_transaction_disabled(disabled)?;
        Ok(())
    }

    pub fn enter_override(&mut self) {
        self.scope.enter_override();
    }

    pub fn exit_override(&mut self) -> Result<(), GuardError> {
        self.scope.exit_override()?;
        Ok(())
    }

    /// Validate one operation about to execute.
    ///
    /// Returns `Err(GuardError::UnsafeOperation)` when a rule blocks it; the
    /// host must not perform the operation in that case.
    pub fn check(&mut self, operation: &Operation) -> Result<Outcome, GuardError> {
        self.scope.observe();

        if let Some(exemption) = self.scope.exemption() {
            debug!(
                "Exempt ({}): {} on {}",
                exemption.as_str(),
                operation.kind(),
                operation.table()
            );
            self.stats.exempted += 1;
            return Ok(Outcome::Exempted(exemption));
        }

        match self.rules.evaluate(operation, self.scope.state()) {
            Verdict::Allowed => {
                debug!("Allowed: {} on {}", operation.kind(), operation.table());
                self.scope.record(operation.category());
                self.stats.allowed += 1;
                Ok(Outcome::Allowed)
            }
            Verdict::Blocked(diagnostic) => {
                warn!(
                    "Blocked by {}: {} on {} in {}",
                    diagnostic.rule(),
                    operation.kind(),
                    operation.table(),
                    self.scope.current_migration().unwrap_or("<no migration>")
                );
                self.stats.blocked += 1;
                Err(GuardError::UnsafeOperation(diagnostic))
            }
        }
    }

    /// Check the operation, then run `perform` only if it was not blocked
    pub fn execute<T, F>(&mut self, operation: &Operation, perform: F) -> Result<T, GuardError>
    where
        F: FnOnce() -> T,
    {
        self.check(operation)?;
        Ok(perform())
    }

    /// Run `body` inside an override region.
    ///
    /// The region is closed on every return path of `body`. A body that
    /// leaves regions open or closes regions it did not open is reported as
    /// scope corruption, and the depth is put back to its value on entry.
    pub fn safety_assured<T, E, F>(&mut self, body: F) -> Result<T, E>
    where
        F: FnOnce(&mut Self) -> Result<T, E>,
        E: From<GuardError>,
    {
        let depth = self.scope.state().override_depth;
        self.enter_override();

        let result = body(self);

        let inner_depth = self.scope.state().override_depth;
        if inner_depth != depth + 1 {
            self.scope.restore_override_depth(depth);
            let violation = if inner_depth > depth + 1 {
                ScopeViolation::UnbalancedOverride {
                    depth: inner_depth - depth - 1,
                }
            } else {
                ScopeViolation::OverrideUnderflow
            };
            return Err(GuardError::from(violation).into());
        }
        self.exit_override()?;

        result
    }
}
