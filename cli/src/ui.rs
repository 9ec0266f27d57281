// Terminal UI utilities

use colored::Colorize;
use zerolock_core::Diagnostic;

pub fn print_header(title: &str) {
    println!();
    println!(
        "{}",
        "╔════════════════════════════════════════════════════════════╗".bright_blue()
    );
    println!("{}", format!("║  {:<58}║", title).bright_blue());
    println!(
        "{}",
        "╚════════════════════════════════════════════════════════════╝".bright_blue()
    );
    println!();
}

pub fn print_success(message: &str) {
    println!("{}", format!("✅ {}", message).bright_green().bold());
}

pub fn print_error(message: &str) {
    eprintln!("{}", format!("❌ {}", message).bright_red().bold());
}

pub fn print_info(message: &str) {
    println!("{}", format!("ℹ️  {}", message).bright_cyan());
}

pub fn print_warning(message: &str) {
    println!("{}", format!("⚠️  {}", message).bright_yellow());
}

/// Print a blocked operation: headline in red, the rest of the message indented
pub fn print_diagnostic(migration: &str, diagnostic: &Diagnostic) {
    println!(
        "\n   {} {} ({})",
        "❌".red(),
        diagnostic.headline().bright_red().bold(),
        migration.dimmed()
    );
    println!();
    for line in diagnostic.hazard().lines() {
        println!("      {}", line);
    }
    println!();
    for line in diagnostic.remediation().lines() {
        println!("      {}", line.cyan());
    }
}
