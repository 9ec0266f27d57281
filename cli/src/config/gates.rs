//! Migration gate configuration.
//!
//! Controls which migrations are checked and how failures are reported.

use anyhow::{bail, Result};
use glob::Pattern;
use serde::{Deserialize, Serialize};

/// Gate configuration, loaded from `zerolock.yaml`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GatesConfig {
    /// Migrations to skip entirely
    /// These are typically already-executed migrations that predate the gate rules
    /// Supports glob patterns (e.g., "20230101*") or exact names
    #[serde(default)]
    pub excluded_migrations: Vec<String>,

    /// Minimum migration version to check (e.g., "20240101")
    /// Migrations with versions before this are skipped
    #[serde(default)]
    pub check_after: Option<String>,

    /// Keep evaluating after the first blocked operation and report every one
    #[serde(default)]
    pub report_all: bool,

    /// Emit structured JSON events on stdout
    #[serde(default)]
    pub events: bool,
}

impl GatesConfig {
    /// Validate patterns and thresholds
    ///
    /// # Errors
    /// Returns error if a glob pattern is malformed or `check_after` is not a version prefix
    pub fn validate(&self) -> Result<()> {
        for pattern in &self.excluded_migrations {
            if pattern.trim().is_empty() {
                bail!("excluded_migrations cannot contain empty patterns");
            }
            if let Err(e) = Pattern::new(pattern) {
                bail!("Invalid pattern '{}' in excluded_migrations: {}", pattern, e);
            }
        }

        if let Some(ref threshold) = self.check_after {
            if threshold.is_empty() || !threshold.chars().all(|c| c.is_ascii_digit()) {
                bail!(
                    "check_after must be a numeric version prefix (e.g. \"20240101\"), got '{}'",
                    threshold
                );
            }
        }

        Ok(())
    }

    /// Check if a migration should be skipped
    pub fn is_excluded(&self, name: &str, version: &str) -> bool {
        // Check check_after threshold
        if let Some(ref threshold) = self.check_after {
            let prefix_len = threshold.len().min(version.len());
            if !version.is_empty()
                && version.as_bytes()[..prefix_len] < threshold.as_bytes()[..prefix_len]
            {
                return true;
            }
        }

        // Check excluded patterns
        for pattern in &self.excluded_migrations {
            // Try as glob pattern first
            if let Ok(glob_pattern) = Pattern::new(pattern) {
                if glob_pattern.matches(name) {
                    return true;
                }
            }
            // Fall back to exact match
            if name == pattern {
                return true;
            }
        }

        false
    }
}
