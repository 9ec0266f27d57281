//! Plan check command
//!
//! Loads gate configuration and plan files, replays every plan through the
//! guard and prints what was blocked.
//!
//! ## Exit codes
//! - `0`: every operation was allowed or exempt
//! - `1`: at least one operation was blocked
//! - `2`: the plan or configuration could not be used

use anyhow::Result;
use colored::Colorize;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, info};
use zerolock_core::GuardConfig;

use crate::config::resolve_gates_config;
use crate::domain::MigrationPlan;
use crate::error::CheckError;
use crate::services::{MigrationService, RunReport};
use crate::ui;

/// Arguments of `zerolock check`
#[derive(Debug, Clone, Default)]
pub struct CheckOptions {
    pub plans: Vec<PathBuf>,
    pub config: Option<PathBuf>,
    pub safety_assured: bool,
    pub schema_load: bool,
    pub report_all: bool,
    pub events: bool,
}

pub async fn execute(options: CheckOptions) -> Result<()> {
    ui::print_header("Migration Safety Check");

    let report = run(&options).await?;
    print_report(&report);

    if report.is_valid() {
        ui::print_success("No unsafe operations found");
        Ok(())
    } else {
        Err(CheckError::UnsafeOperations {
            count: report.blocked.len(),
        }
        .into())
    }
}

/// Replay the plans and return the report without printing it
pub async fn run(options: &CheckOptions) -> Result<RunReport> {
    let mut gates = resolve_gates_config(options.config.as_deref()).await?;
    // Flags can only switch modes on
    gates.report_all |= options.report_all;
    gates.events |= options.events;

    let mut guard = GuardConfig::from_env().with_schema_load(options.schema_load);
    guard.global_override |= options.safety_assured;

    if guard.global_override {
        ui::print_warning("Global override is on (SAFETY_ASSURED), every operation will be let through");
    }

    let mut plans = Vec::with_capacity(options.plans.len());
    for path in &options.plans {
        let plan = load_plan(path).await?;
        info!(
            "Loaded {} ({} migrations, {} operations)",
            path.display(),
            plan.migrations.len(),
            plan.operation_count()
        );
        plans.push(plan);
    }

    let report_all = gates.report_all;
    let mut service = MigrationService::new(guard, gates);
    debug!("Run id {}", service.tracker().run_id());
    service.tracker().emit_started(
        options
            .plans
            .iter()
            .map(|p| p.display().to_string())
            .collect(),
        guard.global_override,
        guard.schema_load,
        report_all,
    );

    for plan in &plans {
        service.run_plan(plan)?;
    }

    Ok(service.finish())
}

/// Read and parse one plan file
pub async fn load_plan(path: &Path) -> Result<MigrationPlan, CheckError> {
    let content = match fs::read_to_string(path).await {
        Ok(content) => content,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            return Err(CheckError::PlanNotFound {
                path: path.display().to_string(),
            })
        }
        Err(e) => {
            return Err(CheckError::PlanParse {
                path: path.display().to_string(),
                message: e.to_string(),
            })
        }
    };

    MigrationPlan::from_yaml(&content).map_err(|e| CheckError::PlanParse {
        path: path.display().to_string(),
        message: e.to_string(),
    })
}

fn print_report(report: &RunReport) {
    println!(
        "{}",
        format!(
            "Checked {} migrations ({} skipped)",
            report.migrations_checked,
            report.migrations_skipped.len()
        )
        .bold()
    );

    for blocked in &report.blocked {
        ui::print_diagnostic(&blocked.migration, &blocked.diagnostic);
    }

    println!();
    println!(
        "   {} allowed, {} exempt, {} blocked",
        report.stats.allowed, report.stats.exempted, report.stats.blocked
    );

    if report.halted {
        ui::print_info("Stopped at the first unsafe operation, use --report-all to see every one");
    }
}
