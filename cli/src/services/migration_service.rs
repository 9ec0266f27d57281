//! Migration service - replays migration plans through the guard
//!
//! Acts as the host runner for the dispatcher: begins each migration, sets
//! its direction and DDL transaction mode, then hands every step to the
//! dispatcher in order, bracketing `safety_assured` steps with override
//! regions.

use tracing::{debug, info, warn};
use zerolock_core::{Diagnostic, DispatchStats, Dispatcher, GuardConfig, GuardError};

use crate::config::GatesConfig;
use crate::domain::migration::{MigrationPlan, PlannedMigration, Step};
use crate::error::CheckError;
use crate::observability::RunTracker;

/// An operation a rule refused to let through
#[derive(Debug, Clone)]
pub struct BlockedOperation {
    pub migration: String,
    pub diagnostic: Diagnostic,
}

/// Accumulated results across every plan replayed by one service
#[derive(Debug, Default)]
pub struct RunReport {
    pub migrations_checked: usize,
    pub migrations_skipped: Vec<String>,
    pub blocked: Vec<BlockedOperation>,
    pub stats: DispatchStats,
    /// Replay stopped at the first blocked operation
    pub halted: bool,
}

impl RunReport {
    pub fn is_valid(&self) -> bool {
        self.blocked.is_empty()
    }
}

/// Whether replay should go on after a migration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flow {
    Continue,
    Halted,
}

/// Service for checking migration plans
pub struct MigrationService {
    dispatcher: Dispatcher,
    gates: GatesConfig,
    tracker: RunTracker,
    report: RunReport,
}

impl MigrationService {
    /// Create a new migration service
    pub fn new(guard: GuardConfig, gates: GatesConfig) -> Self {
        let tracker = RunTracker::new(gates.events);
        Self {
            dispatcher: Dispatcher::new(guard),
            gates,
            tracker,
            report: RunReport::default(),
        }
    }

    pub fn tracker(&self) -> &RunTracker {
        &self.tracker
    }

    /// Replay one plan. Stops early (fail-fast) unless report-all is enabled.
    ///
    /// # Errors
    /// Returns `CheckError::Guard` when the scope contract is broken; blocked
    /// operations are recorded in the report instead.
    pub fn run_plan(&mut self, plan: &MigrationPlan) -> Result<(), CheckError> {
        if self.report.halted {
            return Ok(());
        }

        for migration in &plan.migrations {
            if self.gates.is_excluded(&migration.name, migration.version()) {
                info!("Skipping excluded migration {}", migration.name);
                self.report.migrations_skipped.push(migration.name.clone());
                continue;
            }

            if self.run_migration(migration)? == Flow::Halted {
                self.report.halted = true;
                break;
            }
        }

        Ok(())
    }

    fn run_migration(&mut self, migration: &PlannedMigration) -> Result<Flow, CheckError> {
        let name = migration.name.as_str();
        info!(
            "Checking {} ({}, {} operations)",
            name,
            migration.direction.name(),
            migration.operation_count()
        );

        let blocked_before = self.report.blocked.len();

        let setup = |dispatcher: &mut Dispatcher| -> Result<(), GuardError> {
            dispatcher.begin_migration(name)?;
            dispatcher.set_rollback(migration.direction.is_rollback())?;
            dispatcher.set_ddl_transaction_disabled(migration.disable_ddl_transaction)?;
            Ok(())
        };
        setup(&mut self.dispatcher).map_err(|source| guard_error(name, source))?;

        let flow = self.dispatch_steps(name, &migration.steps)?;

        if flow == Flow::Continue {
            self.dispatcher
                .finish_migration()
                .map_err(|source| guard_error(name, source))?;
        }

        self.report.migrations_checked += 1;
        self.report.stats = self.dispatcher.stats();
        self.tracker.emit_migration_checked(
            name,
            migration.direction.name(),
            migration.operation_count(),
            self.report.blocked.len() - blocked_before,
        );

        Ok(flow)
    }

    fn dispatch_steps(&mut self, migration: &str, steps: &[Step]) -> Result<Flow, CheckError> {
        for step in steps {
            match step {
                Step::Operation(operation) => match self.dispatcher.check(operation) {
                    Ok(outcome) => {
                        debug!("{:?}: {} on {}", outcome, operation.kind(), operation.table())
                    }
                    Err(GuardError::UnsafeOperation(diagnostic)) => {
                        warn!("{}: {}", migration, diagnostic.headline());
                        self.tracker.emit_blocked(migration, &diagnostic);
                        self.report.blocked.push(BlockedOperation {
                            migration: migration.to_string(),
                            diagnostic: *diagnostic,
                        });

                        if !self.gates.report_all {
                            return Ok(Flow::Halted);
                        }
                    }
                    Err(source) => return Err(guard_error(migration, source)),
                },
                Step::SafetyAssured { safety_assured } => {
                    self.dispatcher.enter_override();
                    let flow = self.dispatch_steps(migration, safety_assured)?;
                    self.dispatcher
                        .exit_override()
                        .map_err(|source| guard_error(migration, source))?;

                    if flow == Flow::Halted {
                        return Ok(Flow::Halted);
                    }
                }
            }
        }

        Ok(Flow::Continue)
    }

    /// Finish the run and hand back the report
    pub fn finish(mut self) -> RunReport {
        self.report.stats = self.dispatcher.stats();
        self.tracker.emit_completed(
            self.report.migrations_checked,
            self.report.migrations_skipped.len(),
            self.report.stats,
        );
        self.report
    }
}

fn guard_error(migration: &str, source: GuardError) -> CheckError {
    CheckError::Guard {
        migration: migration.to_string(),
        source,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use zerolock_core::RuleId;

    fn plan(yaml: &str) -> MigrationPlan {
        MigrationPlan::from_yaml(yaml).unwrap()
    }

    const UNSAFE_PLAN: &str = r#"
migrations:
  - name: 20240101120000_add_active_to_users
    steps:
      - add_column: { table: users, column: active, type: boolean, default: true }
      - add_column: { table: users, column: verified, type: boolean, null: false }
  - name: 20240102120000_drop_legacy
    steps:
      - remove_column: { table: users, column: legacy }
"#;

    #[test]
    fn test_fail_fast_stops_at_first_block() {
        let mut service = MigrationService::new(GuardConfig::default(), GatesConfig::default());
        service.run_plan(&plan(UNSAFE_PLAN)).unwrap();
        let report = service.finish();

        assert!(report.halted);
        assert_eq!(report.blocked.len(), 1);
        assert_eq!(report.migrations_checked, 1);
        assert_eq!(report.stats.total(), 1);
        assert!(report.blocked[0].diagnostic.message().contains("default"));
    }

    #[test]
    fn test_report_all_collects_every_block() {
        let gates = GatesConfig {
            report_all: true,
            ..Default::default()
        };
        let mut service = MigrationService::new(GuardConfig::default(), gates);
        service.run_plan(&plan(UNSAFE_PLAN)).unwrap();
        let report = service.finish();

        assert!(!report.halted);
        assert_eq!(report.migrations_checked, 2);
        let rules: Vec<RuleId> = report.blocked.iter().map(|b| b.diagnostic.rule()).collect();
        assert_eq!(rules, vec![RuleId::AddColumn, RuleId::AddColumn, RuleId::RemoveColumn]);
        assert_eq!(report.blocked[2].migration, "20240102120000_drop_legacy");
    }

    #[test]
    fn test_safety_assured_and_rollback_pass() {
        let yaml = r#"
migrations:
  - name: 20240102120000_drop_legacy
    steps:
      - safety_assured:
          - remove_column: { table: users, column: legacy }
          - safety_assured:
              - rename_column: { table: users, from: fname, to: first_name }
  - name: 20240102120000_drop_legacy
    direction: down
    steps:
      - add_column: { table: users, column: legacy, type: string, null: false }
"#;
        let mut service = MigrationService::new(GuardConfig::default(), GatesConfig::default());
        service.run_plan(&plan(yaml)).unwrap();
        let report = service.finish();

        assert!(report.is_valid());
        assert_eq!(report.stats.exempted, 3);
        assert_eq!(report.migrations_checked, 2);
    }

    #[test]
    fn test_global_override_passes_everything() {
        let guard = GuardConfig {
            global_override: true,
            schema_load: false,
        };
        let mut service = MigrationService::new(guard, GatesConfig::default());
        service.run_plan(&plan(UNSAFE_PLAN)).unwrap();
        let report = service.finish();

        assert!(report.is_valid());
        assert_eq!(report.stats.exempted, 3);
    }

    #[test]
    fn test_excluded_migrations_skipped() {
        let gates = GatesConfig {
            check_after: Some("20240102".to_string()),
            ..Default::default()
        };
        let mut service = MigrationService::new(GuardConfig::default(), gates);
        service.run_plan(&plan(UNSAFE_PLAN)).unwrap();
        let report = service.finish();

        assert_eq!(report.migrations_skipped, vec!["20240101120000_add_active_to_users"]);
        assert_eq!(report.blocked.len(), 1);
        assert_eq!(report.blocked[0].diagnostic.rule(), RuleId::RemoveColumn);
    }

    #[test]
    fn test_halted_service_ignores_later_plans() {
        let mut service = MigrationService::new(GuardConfig::default(), GatesConfig::default());
        service.run_plan(&plan(UNSAFE_PLAN)).unwrap();
        service.run_plan(&plan(UNSAFE_PLAN)).unwrap();
        let report = service.finish();
        assert_eq!(report.blocked.len(), 1);
    }
}
