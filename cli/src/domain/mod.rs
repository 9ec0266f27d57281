//! Domain layer - pure business logic
//!
//! Plan types replayed by the services layer. No I/O here.

pub mod migration;

pub use migration::MigrationPlan;
