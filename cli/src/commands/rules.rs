//! Rule catalogue command
//!
//! Lists every built-in rule with the operation kinds it inspects.

use anyhow::Result;
use colored::Colorize;
use zerolock_core::{OperationKind, RuleId, RuleSet};

use crate::ui;

/// Rules in evaluation order, each with the kinds it applies to
pub fn catalogue(rules: &RuleSet) -> Vec<(RuleId, Vec<OperationKind>)> {
    rules
        .rules()
        .map(|rule| {
            let kinds = OperationKind::ALL
                .into_iter()
                .filter(|kind| rule.applies_to(*kind))
                .collect();
            (rule.id(), kinds)
        })
        .collect()
}

pub fn execute() -> Result<()> {
    ui::print_header("Migration Safety Rules");

    for (id, kinds) in catalogue(&RuleSet::standard()) {
        let kinds: Vec<&str> = kinds.iter().map(|kind| kind.name()).collect();
        println!("  {} {}", id.name().bold(), id.summary());
        println!("     {} {}", "applies to:".dimmed(), kinds.join(", "));
    }

    println!();
    ui::print_info("Wrap a reviewed operation in safety_assured to skip these checks");
    Ok(())
}
