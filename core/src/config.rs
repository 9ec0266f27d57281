//! Run configuration
//!
//! Read once at process start and handed to the dispatcher. Nothing in rule
//! evaluation looks at the environment directly.

use serde::{Deserialize, Serialize};

/// Environment variable that switches every check off for the process
pub const SAFETY_ASSURED_ENV: &str = "SAFETY_ASSURED";

/// Process-level switches for a migration run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuardConfig {
    /// Exempt every operation (schema reloads, CI bypass)
    #[serde(default)]
    pub global_override: bool,

    /// Loading a full schema rather than running incremental migrations
    #[serde(default)]
    pub schema_load: bool,
}

impl GuardConfig {
    /// Build from the process environment
    pub fn from_env() -> Self {
        let global_override = std::env::var(SAFETY_ASSURED_ENV)
            .map(|v| is_truthy(&v))
            .unwrap_or(false);

        Self {
            global_override,
            schema_load: false,
        }
    }

    /// Builder: set schema load mode
    pub fn with_schema_load(mut self, schema_load: bool) -> Self {
        self.schema_load = schema_load;
        self
    }
}

/// Interpret an environment switch value (`1`, `true`, `yes`, `on`)
pub fn is_truthy(value: &str) -> bool {
    matches!(
        value.trim().to_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}
