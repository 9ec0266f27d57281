//! End-to-end dispatch scenarios through the public API

use zerolock_core::{
    DefaultValue, Dispatcher, Exemption, GuardConfig, GuardError, IndexAlgorithm, Operation,
    Outcome,
};

fn guard() -> Dispatcher {
    let mut guard = Dispatcher::new(GuardConfig::default());
    guard.begin_migration("20240101120000_users").unwrap();
    guard
}

fn every_operation() -> Vec<Operation> {
    vec![
        Operation::add_column("users", "active", "boolean").with_default(DefaultValue::Bool(true)),
        Operation::add_column("users", "active", "boolean").with_null(false),
        Operation::remove_column("users", "active"),
        Operation::rename_column("users", "fname", "first_name"),
        Operation::add_index("users", ["email"], None),
        Operation::DataMutation {
            table: "users".to_string(),
            description: "update_all".to_string(),
        },
        Operation::RawIteration {
            table: "users".to_string(),
            scoped: false,
            batched: false,
        },
        Operation::SchemaChange {
            table: "users".to_string(),
            description: "drop table".to_string(),
        },
    ]
}

fn blocked_message(result: Result<Outcome, GuardError>) -> String {
    match result {
        Err(GuardError::UnsafeOperation(diagnostic)) => diagnostic.message(),
        other => panic!("expected a blocked operation, got {:?}", other),
    }
}

#[test]
fn test_add_column_with_default_blocked() {
    let mut guard = guard();
    let op = Operation::add_column("users", "active", "boolean")
        .with_default(DefaultValue::Bool(true));
    let message = blocked_message(guard.check(&op));
    assert!(message.contains("default"));
}

#[test]
fn test_add_column_with_null_default_allowed() {
    let mut guard = guard();
    let op = Operation::add_column("users", "active", "boolean").with_default(DefaultValue::Null);
    assert_eq!(guard.check(&op).unwrap(), Outcome::Allowed);
}

#[test]
fn test_add_column_without_default_allowed() {
    let mut guard = guard();
    let op = Operation::add_column("users", "active", "boolean");
    assert_eq!(guard.check(&op).unwrap(), Outcome::Allowed);
}

#[test]
fn test_add_column_not_null_blocked() {
    let mut guard = guard();
    let op = Operation::add_column("users", "active", "boolean").with_null(false);
    let message = blocked_message(guard.check(&op));
    assert!(message.contains("not nullable"));
}

#[test]
fn test_remove_column_needs_override() {
    let mut guard = guard();
    let op = Operation::remove_column("users", "active");
    blocked_message(guard.check(&op));

    guard.enter_override();
    assert_eq!(
        guard.check(&op).unwrap(),
        Outcome::Exempted(Exemption::OverrideRegion)
    );
    guard.exit_override().unwrap();
}

#[test]
fn test_rename_column_blocked() {
    let mut guard = guard();
    let op = Operation::rename_column("users", "fname", "first_name");
    let message = blocked_message(guard.check(&op));
    assert!(message.contains("AddFirstNameToUsers"));
}

#[test]
fn test_concurrent_index_outside_transaction_allowed() {
    let mut guard = Dispatcher::new(GuardConfig::default());
    guard.begin_migration("20240101120000_index_users_email").unwrap();
    guard.set_ddl_transaction_disabled(true).unwrap();

    let op = Operation::add_index("users", ["email"], Some(IndexAlgorithm::Concurrently));
    assert_eq!(guard.check(&op).unwrap(), Outcome::Allowed);
}

#[test]
fn test_nested_override_law() {
    let mut guard = guard();
    guard.enter_override();
    guard.enter_override();
    guard.exit_override().unwrap();
    assert!(guard.scope().is_exempt());

    guard.exit_override().unwrap();
    assert!(!guard.scope().is_exempt());

    assert!(matches!(
        guard.exit_override(),
        Err(GuardError::ScopeCorruption(_))
    ));
}

#[test]
fn test_global_override_dominates() {
    let config = GuardConfig {
        global_override: true,
        schema_load: false,
    };
    let mut guard = Dispatcher::new(config);
    guard.begin_migration("20240101120000_anything").unwrap();
    guard.set_ddl_transaction_disabled(true).unwrap();

    for op in every_operation() {
        assert_eq!(
            guard.check(&op).unwrap(),
            Outcome::Exempted(Exemption::GlobalOverride)
        );
    }
}

#[test]
fn test_schema_load_exempts_everything() {
    let mut guard = Dispatcher::new(GuardConfig::default().with_schema_load(true));
    for op in every_operation() {
        assert!(guard.check(&op).is_ok());
    }
    assert_eq!(guard.stats().exempted, every_operation().len());
}

#[test]
fn test_rollback_dominates() {
    let mut guard = guard();
    guard.set_rollback(true).unwrap();
    guard.set_ddl_transaction_disabled(true).unwrap();

    for op in every_operation() {
        assert_eq!(
            guard.check(&op).unwrap(),
            Outcome::Exempted(Exemption::Rollback)
        );
    }
}

#[test]
fn test_each_migration_is_its_own_unit() {
    let mut guard = Dispatcher::new(GuardConfig::default());

    guard.begin_migration("20240101120000_backfill").unwrap();
    let backfill = Operation::DataMutation {
        table: "users".to_string(),
        description: "backfill active".to_string(),
    };
    assert_eq!(guard.check(&backfill).unwrap(), Outcome::Allowed);
    guard.finish_migration().unwrap();

    guard.begin_migration("20240102120000_add_column").unwrap();
    let column = Operation::add_column("users", "verified", "boolean");
    assert_eq!(guard.check(&column).unwrap(), Outcome::Allowed);

    // Mixing inside one migration is still caught
    let message = blocked_message(guard.check(&backfill));
    assert!(message.contains("Mixing data/index/schema changes"));
}
