//! # zerolock-core
//!
//! Runtime safety gate for database migrations run during rolling
//! deployments. The host migration runner hands every schema or data
//! operation to a [`Dispatcher`] before executing it; the dispatcher either
//! lets it through, exempts it (override region, rollback, schema load,
//! global override), or blocks it with a diagnostic explaining the hazard and
//! how to rewrite the migration.
//!
//! ```
//! use zerolock_core::{Dispatcher, GuardConfig, Operation};
//!
//! let mut guard = Dispatcher::new(GuardConfig::default());
//! guard.begin_migration("20240101120000_add_active_to_users").unwrap();
//!
//! // Plain nullable column: fine
//! assert!(guard.check(&Operation::add_column("users", "active", "boolean")).is_ok());
//!
//! // Dropping a column a running deployment still reads: blocked
//! let err = guard.check(&Operation::remove_column("users", "legacy")).unwrap_err();
//! assert!(err.to_string().contains("Removing a column is unsafe!"));
//! ```

pub mod config;
pub mod dispatcher;
pub mod error;
pub mod format;
pub mod inflect;
pub mod operation;
pub mod rules;
pub mod scope;
pub mod verdict;

pub use config::GuardConfig;
pub use dispatcher::{DispatchStats, Dispatcher, Outcome};
pub use error::{GuardError, ScopeViolation};
pub use operation::{Category, DefaultValue, IndexAlgorithm, Operation, OperationKind};
pub use rules::{Rule, RuleId, RuleSet};
pub use scope::{Exemption, ScopeState, ScopeTracker};
pub use verdict::{Diagnostic, Verdict};
