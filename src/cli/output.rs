use colored::*;

use super::args::OutputFormat;
use crate::common::format::{self, humanize, humanize_colored};
use crate::gate::RebootStatus;
use crate::report;
use crate::runner::{RunAborted, RunObserver, RunReport, StepOutcome, StepState};

/// Prints step progress as it happens.
///
/// Warnings and failures always go to stderr at the point they occur, even
/// in JSON or quiet mode; progress lines only in human mode.
#[derive(Debug)]
pub struct TerminalObserver {
    progress: bool,
}

impl TerminalObserver {
    pub fn new(format: OutputFormat, quiet: bool) -> Self {
        Self {
            progress: format == OutputFormat::Human && !quiet,
        }
    }
}

impl RunObserver for TerminalObserver {
    fn on_step_started(&mut self, index: usize, total: usize, name: &str) {
        if self.progress {
            println!();
            println!(
                "  {} {} {}",
                "→".cyan(),
                format!("[{}/{}]", index + 1, total).dimmed(),
                name.bold()
            );
        }
    }

    fn on_step_finished(&mut self, name: &str, outcome: &StepOutcome) {
        let took = format::format_duration(outcome.duration_ms as f64 / 1000.0);
        match outcome.state {
            StepState::Succeeded if self.progress => match outcome.freed_bytes {
                Some(freed) => println!(
                    "  {} {} — freed {} {}",
                    "✓".green(),
                    name,
                    humanize_colored(freed),
                    took.dimmed()
                ),
                None => println!("  {} {} {}", "✓".green(), name, took.dimmed()),
            },
            StepState::WarnFailed => eprintln!(
                "  {} {}: {}",
                "⚠".yellow(),
                name.yellow(),
                outcome.error.as_deref().unwrap_or("failed")
            ),
            StepState::FatalFailed => eprintln!(
                "  {} {}: {}",
                "✗".red(),
                name.red().bold(),
                outcome.error.as_deref().unwrap_or("failed")
            ),
            StepState::Aborted if self.progress => {
                println!("  {} {} {}", "-".dimmed(), name.dimmed(), "(not run)".dimmed())
            }
            _ => {}
        }
    }
}

/// Print the plan banner before running
pub fn print_plan_header(plan: &str, dry_run: bool) {
    println!();
    println!("{}  archtidy {}", "🧹", plan.bold());
    if dry_run {
        println!(
            "  {} Dry run — commands that change the system will only be logged",
            "ℹ️"
        );
    }
    println!("{}", "─".repeat(60).dimmed());
}

/// Print a run report in the requested format
pub fn print_report(report: &RunReport, format: OutputFormat) {
    match format {
        OutputFormat::Human => print_report_human(report),
        OutputFormat::Json => print_report_json(report),
        OutputFormat::Quiet => println!("{}", report::render_quiet(report)),
    }
}

/// Print the summary with colored step tags
pub fn print_report_human(report: &RunReport) {
    println!();
    println!("{}  Summary", "📋");
    println!("{}", "─".repeat(60).dimmed());
    for line in report::render(report).lines() {
        let colored = if line.starts_with("[ ok ]") {
            line.green()
        } else if line.starts_with("[warn]") || line.starts_with("  - ") {
            line.yellow()
        } else if line.starts_with("[FAIL]") {
            line.red().bold()
        } else if line.starts_with("[skip]") {
            line.dimmed()
        } else {
            line.bold()
        };
        println!("  {}", colored);
    }
    println!("{}", "─".repeat(60).dimmed());
    println!(
        "  {} Total space freed: {}",
        "💾",
        humanize_colored(report.total_freed_bytes)
    );
    print_reboot_hint(&report.reboot);
    println!();
}

fn print_reboot_hint(status: &RebootStatus) {
    match status {
        RebootStatus::Declined | RebootStatus::Suppressed => println!(
            "  {} Kernel packages changed — reboot when convenient",
            "💡"
        ),
        RebootStatus::Unavailable(_) | RebootStatus::Failed(_) => println!(
            "  {} Kernel packages changed — run {} to load the new kernel",
            "⚠".yellow(),
            "systemctl reboot".cyan()
        ),
        RebootStatus::Performed => println!("  {} Rebooting…", "🔄"),
        RebootStatus::NotRequired => {}
    }
}

/// Print a run report as JSON
pub fn print_report_json(report: &RunReport) {
    match serde_json::to_string_pretty(report) {
        Ok(json) => println!("{}", json),
        Err(e) => eprintln!("Error serializing report: {}", e),
    }
}

/// Print the partial report of an aborted run
pub fn print_aborted(aborted: &RunAborted, format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            let json = serde_json::json!({
                "aborted": true,
                "failed_step": aborted.step,
                "error": aborted.message,
                "exit_code": aborted.exit_code(),
                "report": aborted.report,
            });
            match serde_json::to_string_pretty(&json) {
                Ok(s) => println!("{}", s),
                Err(e) => eprintln!("Error serializing report: {}", e),
            }
        }
        OutputFormat::Quiet => println!("{}", report::render_quiet(&aborted.report)),
        OutputFormat::Human => {
            print_report_human(&aborted.report);
            eprintln!(
                "  {} Aborted at '{}': {}",
                "✗".red(),
                aborted.step.bold(),
                aborted.message
            );
            eprintln!(
                "  {} {} freed before the abort",
                "ℹ️",
                humanize(aborted.report.total_freed_bytes)
            );
            eprintln!();
        }
    }
}
