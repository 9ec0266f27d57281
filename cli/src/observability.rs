//! # Run Observability
//!
//! Structured events for migration checks, enabled with `--events` or
//! `events: true` in the gate file.
//!
//! ## Event Flow
//!
//! ```text
//! zerolock → JSON stdout → log collector
//! ```
//!
//! Events are single JSON lines prefixed with `ZEROLOCK_EVENT:` so a
//! collector can pick them out of regular output.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::time::Instant;
use uuid::Uuid;
use zerolock_core::{Diagnostic, DispatchStats};

/// Event prefix for collectors to identify structured events
const EVENT_PREFIX: &str = "ZEROLOCK_EVENT:";

/// Check event types
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event_type", rename_all = "snake_case")]
pub enum CheckEvent {
    /// Plan replay started
    RunStarted(RunStartedEvent),
    /// An operation was blocked by a rule
    OperationBlocked(OperationBlockedEvent),
    /// All steps of one migration were dispatched
    MigrationChecked(MigrationCheckedEvent),
    /// Plan replay finished
    RunCompleted(RunCompletedEvent),
}

/// Common fields for all events
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventMetadata {
    /// Timestamp in RFC3339 format
    pub timestamp: String,
    /// Identifier shared by every event of one run
    pub run_id: String,
    /// Hostname of the machine running the check
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hostname: Option<String>,
    /// CI job ID if running in CI
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ci_job_id: Option<String>,
}

impl EventMetadata {
    fn new(run_id: &str) -> Self {
        Self {
            timestamp: Utc::now().to_rfc3339(),
            run_id: run_id.to_string(),
            hostname: std::env::var("HOSTNAME").ok(),
            ci_job_id: std::env::var("GITHUB_RUN_ID")
                .ok()
                .or_else(|| std::env::var("CI_JOB_ID").ok()),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunStartedEvent {
    #[serde(flatten)]
    pub metadata: EventMetadata,
    /// Plan files being replayed
    pub plans: Vec<String>,
    pub global_override: bool,
    pub schema_load: bool,
    pub report_all: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OperationBlockedEvent {
    #[serde(flatten)]
    pub metadata: EventMetadata,
    pub migration: String,
    pub rule: String,
    pub operation: String,
    pub table: String,
    pub headline: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MigrationCheckedEvent {
    #[serde(flatten)]
    pub metadata: EventMetadata,
    pub migration: String,
    pub direction: String,
    pub operations: usize,
    pub blocked: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunCompletedEvent {
    #[serde(flatten)]
    pub metadata: EventMetadata,
    pub duration_secs: f64,
    pub migrations_checked: usize,
    pub migrations_skipped: usize,
    pub exempted: usize,
    pub allowed: usize,
    pub blocked: usize,
}

/// Emits a structured event as JSON to stdout
pub fn emit_event(event: &CheckEvent) {
    match serde_json::to_string(event) {
        Ok(json) => {
            println!("{}{}", EVENT_PREFIX, json);
        }
        Err(e) => {
            tracing::error!("Failed to serialize event: {}", e);
        }
    }
}

/// Emits events for one run; a disabled tracker is a no-op
pub struct RunTracker {
    run_id: String,
    enabled: bool,
    start: Instant,
}

impl RunTracker {
    pub fn new(enabled: bool) -> Self {
        Self {
            run_id: Uuid::new_v4().to_string(),
            enabled,
            start: Instant::now(),
        }
    }

    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    pub fn elapsed_secs(&self) -> f64 {
        self.start.elapsed().as_secs_f64()
    }

    fn emit(&self, event: CheckEvent) {
        if self.enabled {
            emit_event(&event);
        }
    }

    pub fn emit_started(
        &self,
        plans: Vec<String>,
        global_override: bool,
        schema_load: bool,
        report_all: bool,
    ) {
        self.emit(CheckEvent::RunStarted(RunStartedEvent {
            metadata: EventMetadata::new(&self.run_id),
            plans,
            global_override,
            schema_load,
            report_all,
        }));
    }

    pub fn emit_blocked(&self, migration: &str, diagnostic: &Diagnostic) {
        self.emit(CheckEvent::OperationBlocked(OperationBlockedEvent {
            metadata: EventMetadata::new(&self.run_id),
            migration: migration.to_string(),
            rule: diagnostic.rule().to_string(),
            operation: diagnostic.kind().to_string(),
            table: diagnostic.table().to_string(),
            headline: diagnostic.headline().to_string(),
        }));
    }

    pub fn emit_migration_checked(
        &self,
        migration: &str,
        direction: &str,
        operations: usize,
        blocked: usize,
    ) {
        self.emit(CheckEvent::MigrationChecked(MigrationCheckedEvent {
            metadata: EventMetadata::new(&self.run_id),
            migration: migration.to_string(),
            direction: direction.to_string(),
            operations,
            blocked,
        }));
    }

    pub fn emit_completed(&self, checked: usize, skipped: usize, stats: DispatchStats) {
        self.emit(CheckEvent::RunCompleted(RunCompletedEvent {
            metadata: EventMetadata::new(&self.run_id),
            duration_secs: self.elapsed_secs(),
            migrations_checked: checked,
            migrations_skipped: skipped,
            exempted: stats.exempted,
            allowed: stats.allowed,
            blocked: stats.blocked,
        }));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_serialization() {
        let event = CheckEvent::MigrationChecked(MigrationCheckedEvent {
            metadata: EventMetadata::new("run-1"),
            migration: "20240101120000_add_active".to_string(),
            direction: "up".to_string(),
            operations: 3,
            blocked: 1,
        });

        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["event_type"], "migration_checked");
        assert_eq!(json["run_id"], "run-1");
        assert_eq!(json["operations"], 3);
        assert!(json["timestamp"].as_str().is_some());
    }

    #[test]
    fn test_run_ids_are_unique() {
        let a = RunTracker::new(false);
        let b = RunTracker::new(false);
        assert_ne!(a.run_id(), b.run_id());
    }
}
