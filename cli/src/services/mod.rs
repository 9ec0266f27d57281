//! Services layer - orchestration logic
//!
//! Coordinates plan replay between the domain types and the guard.

pub mod migration_service;

pub use migration_service::{MigrationService, RunReport};
