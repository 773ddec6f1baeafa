//! `courier check`: load and validate configuration without connecting.

use std::path::Path;

use {
    anyhow::Result,
    courier_config::{Severity, ValidationResult},
};

/// ANSI color codes.
const RED: &str = "\x1b[31m";
const YELLOW: &str = "\x1b[33m";
const BOLD: &str = "\x1b[1m";
const RESET: &str = "\x1b[0m";

pub fn check(explicit: Option<&Path>) -> Result<()> {
    let (config, path) = crate::load(explicit)?;

    if let Some(ref path) = path {
        eprintln!("Checking {}\n", path.display());
    } else {
        eprintln!("No config file found; checking defaults.\n");
    }

    let result = courier_config::validate(&config);
    let shown = print_diagnostics(&result);
    if shown > 0 {
        eprintln!();
    }

    let errors = result.count(Severity::Error);
    let warnings = result.count(Severity::Warning);
    if errors == 0 && warnings == 0 {
        eprintln!("No issues found.");
    } else {
        eprintln!("{errors} error(s), {warnings} warning(s)");
    }

    if errors > 0 {
        std::process::exit(1);
    }

    Ok(())
}

fn print_diagnostics(result: &ValidationResult) -> usize {
    let mut diagnostics: Vec<_> = result.diagnostics.iter().collect();
    diagnostics.sort_by_key(|d| d.severity);

    for d in &diagnostics {
        let color = match d.severity {
            Severity::Error => RED,
            Severity::Warning => YELLOW,
        };
        eprintln!("  {BOLD}{color}{}{RESET} {}: {}", d.severity, d.path, d.message);
    }
    diagnostics.len()
}
