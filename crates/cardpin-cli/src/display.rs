//! Display formatting for CLI output
//!
//! Renders the run summary, manual installation guidance and the reminders
//! printed after the resource store changes. Rendering functions return
//! strings so the text can be checked without a terminal.

use cardpin_core::store::MODULE_TYPE;
use cardpin_core::{InstallReport, InstallationResult, Outcome, PatchOutcome, Settings};
use console::style;
use std::fmt::Write;
use std::path::Path;

/// One line per dependency, in catalog order
pub fn render_results(report: &InstallReport) -> String {
    let mut out = String::new();
    for result in &report.results {
        let _ = writeln!(out, "{}", render_result(result));
    }
    out
}

fn render_result(result: &InstallationResult) -> String {
    let dependency = &result.dependency;
    match &result.outcome {
        Outcome::Installed(asset) => format!(
            "{} {} {} {}",
            style("✓").green().bold(),
            style(&dependency.name).cyan(),
            style("→").blue(),
            asset.public_url
        ),
        Outcome::Failed { kind, message } => format!(
            "{} {} ({}@{}): {}\n    {}",
            style("✗").red().bold(),
            style(&dependency.name).cyan(),
            dependency.repository,
            dependency.tag_label(),
            style(kind).red(),
            style(message).dim()
        ),
    }
}

/// Final tally line
pub fn render_tally(report: &InstallReport) -> String {
    let total = report.results.len();
    let failed = report.failure_count();
    let installed = total - failed;

    if failed == 0 {
        format!(
            "{} {} of {} dependencies installed",
            style("✓").green().bold(),
            installed,
            total
        )
    } else {
        format!(
            "{} {} installed, {} failed (of {})",
            style("✗").red().bold(),
            installed,
            failed,
            total
        )
    }
}

/// Manual steps for every failed dependency
pub fn render_manual_guidance(report: &InstallReport, settings: &Settings) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", style("Manual installation required:").yellow().bold());

    for failure in report.failures() {
        let dependency = &failure.dependency;
        let _ = writeln!(
            out,
            "  {} {} ({})",
            style("•").yellow(),
            dependency.repository,
            dependency.strategy
        );
        let _ = writeln!(
            out,
            "      copy the card's .js file into {}",
            settings.community_dir.join(&dependency.install_folder).display()
        );
    }

    let _ = writeln!(
        out,
        "  {} files placed there are served under /hacsfiles/<folder>/<file>",
        style("hint:").blue()
    );
    out
}

/// Outcome of the resource store patch
pub fn render_patch_outcome(outcome: &PatchOutcome, store_path: &Path) -> String {
    match outcome {
        PatchOutcome::NotApplicable => format!(
            "{} No resource store at {} and the UI is in YAML mode; register resources in configuration.yaml",
            style("⚠").yellow(),
            store_path.display()
        ),
        PatchOutcome::Unchanged => format!(
            "{} Resource store already up to date",
            style("✓").green()
        ),
        PatchOutcome::Patched {
            repaired,
            added,
            created,
            backup,
        } => {
            let mut line = format!(
                "{} Resource store {}: {} repaired, {} added",
                style("✓").green().bold(),
                if *created { "created" } else { "updated" },
                repaired,
                added
            );
            if let Some(backup) = backup {
                let _ = write!(line, "\n    backup: {}", style(backup.display()).dim());
            }
            line
        }
    }
}

/// configuration.yaml snippet registering the installed URLs
pub fn render_yaml_resources(urls: &[String]) -> String {
    let mut out = String::from("lovelace:\n  mode: yaml\n  resources:\n");
    for url in urls {
        let _ = writeln!(out, "    - url: {}\n      type: {}", url, MODULE_TYPE);
    }
    out
}

/// Manual registration steps when the store could not be patched
pub fn render_manual_registration(urls: &[String]) -> String {
    let mut out = String::new();
    if urls.is_empty() {
        return out;
    }
    let _ = writeln!(out, "\nRegister these as JavaScript module resources manually:");
    for url in urls {
        let _ = writeln!(out, "  {}", url);
    }
    out
}

/// Reminder printed after the store changed
pub fn render_restart_reminder() -> String {
    format!(
        "{} Restart Home Assistant, then hard-refresh the browser (Ctrl+Shift+R) to load the new resources",
        style("→").blue().bold()
    )
}
