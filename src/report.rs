//! Plain-text rendering of a [`RunReport`]. Pure: callers decide where the
//! text goes.

use std::fmt::Write;

use crate::common::format::humanize;
use crate::gate::RebootStatus;
use crate::runner::{RunReport, StepOutcome, StepState};

fn tag(state: StepState) -> &'static str {
    match state {
        StepState::Succeeded => "[ ok ]",
        StepState::WarnFailed => "[warn]",
        StepState::FatalFailed => "[FAIL]",
        StepState::Aborted => "[skip]",
        StepState::Pending | StepState::Running => "[ .. ]",
    }
}

fn detail(outcome: &StepOutcome) -> Option<String> {
    match outcome.state {
        StepState::Succeeded => outcome
            .freed_bytes
            .map(|freed| format!("freed {}", humanize(freed))),
        StepState::WarnFailed | StepState::FatalFailed => outcome.error.clone(),
        StepState::Aborted => Some("not run".to_string()),
        StepState::Pending | StepState::Running => None,
    }
}

/// One line per step in execution order, then the freed total and the
/// reboot outcome.
pub fn render(report: &RunReport) -> String {
    let mut out = String::new();

    for record in &report.steps {
        let _ = match detail(&record.outcome) {
            Some(detail) => writeln!(out, "{} {}: {}", tag(record.outcome.state), record.name, detail),
            None => writeln!(out, "{} {}", tag(record.outcome.state), record.name),
        };
    }

    let _ = writeln!(out, "Total space freed: {}", humanize(report.total_freed_bytes));
    let _ = writeln!(out, "Reboot: {}", reboot_line(report));

    let warnings: Vec<_> = report.warnings().collect();
    if !warnings.is_empty() {
        let _ = writeln!(out, "Warnings ({}):", warnings.len());
        for record in warnings {
            let _ = writeln!(
                out,
                "  - {}: {}",
                record.name,
                record.outcome.error.as_deref().unwrap_or("failed")
            );
        }
    }

    out
}

fn reboot_line(report: &RunReport) -> String {
    if !report.reboot_required && report.reboot == RebootStatus::NotRequired {
        return "not required".to_string();
    }
    report.reboot.to_string()
}

/// Single line for `--format quiet`: freed bytes, ok, warned, reboot
pub fn render_quiet(report: &RunReport) -> String {
    format!(
        "{}  {} ok  {} warn  reboot={}",
        humanize(report.total_freed_bytes),
        report.count(StepState::Succeeded),
        report.count(StepState::WarnFailed),
        if report.reboot_required { "yes" } else { "no" }
    )
}
