//! Migration plan domain types
//!
//! A plan is the recorded sequence of operations a host runner executed (or
//! is about to execute) for a set of migrations. Plans are YAML:
//!
//! ```yaml
//! migrations:
//!   - name: 20240101120000_add_active_to_users
//!     direction: up
//!     disable_ddl_transaction: false
//!     steps:
//!       - add_column: { table: users, column: active, type: boolean, null: true }
//!       - safety_assured:
//!           - remove_column: { table: users, column: legacy_flag }
//! ```
//!
//! Each step is a one-key mapping: the operation kind (or `safety_assured`)
//! and its arguments. Column nullability may be written `null:` as in Rails
//! migrations or `nullable:`.

use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize};
use serde_yaml::value::{Tag, TaggedValue};
use serde_yaml::{Mapping, Value};
use zerolock_core::{Operation, OperationKind};

/// Step key opening a nested override region
const SAFETY_ASSURED_KEY: &str = "safety_assured";

/// Direction a migration runs in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    #[default]
    Up,
    Down,
}

impl Direction {
    pub fn is_rollback(&self) -> bool {
        *self == Self::Down
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Up => "up",
            Self::Down => "down",
        }
    }
}

/// One step of a migration: an operation or a nested override region
#[derive(Debug, Clone, PartialEq)]
pub enum Step {
    /// Steps the author has manually verified as safe
    SafetyAssured { safety_assured: Vec<Step> },
    Operation(Operation),
}

impl<'de> Deserialize<'de> for Step {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        Step::from_value(value).map_err(de::Error::custom)
    }
}

impl Step {
    fn from_value(value: Value) -> Result<Self, String> {
        let Value::Mapping(mapping) = value else {
            return Err("a step must be a mapping like `add_column: { ... }`".to_string());
        };
        if mapping.len() != 1 {
            return Err(format!(
                "a step must have exactly one key, found {}",
                mapping.len()
            ));
        }

        let Some((key, body)) = mapping.into_iter().next() else {
            return Err("empty step".to_string());
        };
        let Value::String(key) = key else {
            return Err(format!("step key must be an operation name, got {:?}", key));
        };

        if key == SAFETY_ASSURED_KEY {
            let steps: Vec<Step> = serde_yaml::from_value(body)
                .map_err(|e| format!("{}: {}", SAFETY_ASSURED_KEY, e))?;
            return Ok(Self::SafetyAssured {
                safety_assured: steps,
            });
        }

        if !OperationKind::ALL.iter().any(|kind| kind.name() == key) {
            return Err(format!("unknown step `{}`", key));
        }

        // serde_yaml reads externally tagged enums from tagged values
        let tagged = Value::Tagged(Box::new(TaggedValue {
            tag: Tag::new(key.clone()),
            value: rename_null_key(body),
        }));
        serde_yaml::from_value(tagged)
            .map(Self::Operation)
            .map_err(|e| format!("{}: {}", key, e))
    }

    /// Number of operations in this step, including nested ones
    pub fn operation_count(&self) -> usize {
        match self {
            Self::SafetyAssured { safety_assured } => {
                safety_assured.iter().map(Step::operation_count).sum()
            }
            Self::Operation(_) => 1,
        }
    }
}

/// A bare `null:` key parses as YAML null; treat it as `nullable`
fn rename_null_key(body: Value) -> Value {
    match body {
        Value::Mapping(fields) => Value::Mapping(
            fields
                .into_iter()
                .map(|(key, value)| match key {
                    Value::Null => (Value::String("nullable".to_string()), value),
                    key => (key, value),
                })
                .collect::<Mapping>(),
        ),
        other => other,
    }
}

/// A single migration within a plan
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PlannedMigration {
    /// Migration name, conventionally prefixed with its version timestamp
    pub name: String,

    #[serde(default)]
    pub direction: Direction,

    /// Migration runs outside the atomic DDL transaction
    #[serde(default)]
    pub disable_ddl_transaction: bool,

    #[serde(default)]
    pub steps: Vec<Step>,
}

impl PlannedMigration {
    /// Leading digits of the name (e.g. "20240101120000")
    pub fn version(&self) -> &str {
        let end = self
            .name
            .find(|c: char| !c.is_ascii_digit())
            .unwrap_or(self.name.len());
        &self.name[..end]
    }

    pub fn operation_count(&self) -> usize {
        self.steps.iter().map(Step::operation_count).sum()
    }
}

/// Ordered list of migrations to replay
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct MigrationPlan {
    #[serde(default)]
    pub migrations: Vec<PlannedMigration>,
}

impl MigrationPlan {
    pub fn from_yaml(content: &str) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(content)
    }

    pub fn operation_count(&self) -> usize {
        self.migrations
            .iter()
            .map(PlannedMigration::operation_count)
            .sum()
    }
}
