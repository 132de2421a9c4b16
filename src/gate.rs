//! Decides whether a follow-up action (a reboot) is warranted after a run,
//! and drives it through the confirmation interface.

use serde::Serialize;

use crate::common::config::RebootPolicy;
use crate::common::errors::MaintenanceError;
use crate::snapshot::{diff, DiffResult, NamedSet};

/// What happened to the optional reboot at the end of a run
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "detail", rename_all = "snake_case")]
pub enum RebootStatus {
    /// Snapshots matched; nothing was asked
    NotRequired,
    /// A reboot was warranted but the policy forbids offering it
    Suppressed,
    /// The operator said no
    Declined,
    /// The confirmation interface could not be shown
    Unavailable(String),
    /// The reboot was triggered
    Performed,
    /// The reboot command failed
    Failed(String),
}

impl RebootStatus {
    /// Problems worth a warning line; the run itself still succeeded
    pub fn is_warning(&self) -> bool {
        matches!(self, RebootStatus::Unavailable(_) | RebootStatus::Failed(_))
    }
}

impl std::fmt::Display for RebootStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RebootStatus::NotRequired => write!(f, "not required"),
            RebootStatus::Suppressed => write!(f, "required, not offered (reboot_policy = never)"),
            RebootStatus::Declined => write!(f, "required, declined"),
            RebootStatus::Unavailable(msg) => write!(f, "required, could not ask: {}", msg),
            RebootStatus::Performed => write!(f, "requested"),
            RebootStatus::Failed(msg) => write!(f, "required, reboot failed: {}", msg),
        }
    }
}

/// `diff(before, after).changed`
pub fn should_prompt(before: &NamedSet, after: &NamedSet) -> bool {
    diff(before, after).changed
}

/// Reboot decision for one pair of kernel snapshots
#[derive(Debug, Clone)]
pub struct ReconciliationGate {
    diff: DiffResult,
    policy: RebootPolicy,
}

impl ReconciliationGate {
    pub fn new(before: &NamedSet, after: &NamedSet, policy: RebootPolicy) -> Self {
        Self {
            diff: diff(before, after),
            policy,
        }
    }

    pub fn diff(&self) -> &DiffResult {
        &self.diff
    }

    /// The watched set changed, whatever the policy says
    pub fn required(&self) -> bool {
        self.diff.changed
    }

    /// Whether the operator should be asked
    pub fn should_prompt(&self) -> bool {
        self.diff.changed && self.policy == RebootPolicy::Prompt
    }

    /// Ask through `confirm` and, only on a yes, run `act`.
    ///
    /// Nothing is called when the set is unchanged. With
    /// [`RebootPolicy::Auto`] the question is skipped; with
    /// [`RebootPolicy::Never`] neither closure runs.
    pub fn confirm_and_act<F, A>(&self, prompt: &str, confirm: F, act: A) -> RebootStatus
    where
        F: FnOnce(&str) -> Result<bool, MaintenanceError>,
        A: FnOnce() -> anyhow::Result<()>,
    {
        if !self.diff.changed {
            tracing::debug!("snapshot unchanged, no follow-up needed");
            return RebootStatus::NotRequired;
        }

        tracing::info!(
            added = ?self.diff.added,
            removed = ?self.diff.removed,
            "snapshot changed"
        );

        let confirmed = match self.policy {
            RebootPolicy::Never => return RebootStatus::Suppressed,
            RebootPolicy::Auto => true,
            RebootPolicy::Prompt => match confirm(prompt) {
                Ok(answer) => answer,
                Err(err) => {
                    tracing::warn!(error = %err, "confirmation unavailable, skipping reboot");
                    return RebootStatus::Unavailable(unavailable_detail(err));
                }
            },
        };

        if !confirmed {
            return RebootStatus::Declined;
        }

        match act() {
            Ok(()) => RebootStatus::Performed,
            Err(err) => {
                tracing::warn!(error = %format!("{:#}", err), "reboot failed");
                RebootStatus::Failed(format!("{:#}", err))
            }
        }
    }

    /// Message shown in the confirmation dialog
    pub fn describe(&self) -> String {
        let mut parts = Vec::new();
        if !self.diff.added.is_empty() {
            parts.push(format!(
                "installed: {}",
                self.diff.added.iter().cloned().collect::<Vec<_>>().join(", ")
            ));
        }
        if !self.diff.removed.is_empty() {
            parts.push(format!(
                "removed: {}",
                self.diff.removed.iter().cloned().collect::<Vec<_>>().join(", ")
            ));
        }
        if parts.is_empty() {
            "Kernel packages are unchanged.".to_string()
        } else {
            format!("Kernel packages changed ({}). Reboot now?", parts.join("; "))
        }
    }
}

fn unavailable_detail(err: MaintenanceError) -> String {
    match err {
        MaintenanceError::ConfirmationUnavailable { message } => message,
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    fn kernels(names: &[&str]) -> NamedSet {
        NamedSet::new("kernels", names.iter().copied())
    }

    #[test]
    fn test_describe_lists_changes() {
        let gate = ReconciliationGate::new(
            &kernels(&["linux"]),
            &kernels(&["linux", "linux-lts"]),
            RebootPolicy::Prompt,
        );
        assert!(gate.describe().contains("installed: linux-lts"));
    }

    #[test]
    fn test_never_policy_suppresses() {
        let gate = ReconciliationGate::new(&kernels(&["linux"]), &kernels(&[]), RebootPolicy::Never);
        assert!(gate.required());
        assert!(!gate.should_prompt());

        let asked = Cell::new(false);
        let status = gate.confirm_and_act(
            "Reboot?",
            |_| {
                asked.set(true);
                Ok(true)
            },
            || Ok(()),
        );
        assert_eq!(status, RebootStatus::Suppressed);
        assert!(!asked.get());
    }

    #[test]
    fn test_auto_policy_skips_question() {
        let gate = ReconciliationGate::new(&kernels(&["linux"]), &kernels(&["linux-zen"]), RebootPolicy::Auto);
        let acted = Cell::new(false);
        let status = gate.confirm_and_act(
            "Reboot?",
            |_| panic!("must not ask"),
            || {
                acted.set(true);
                Ok(())
            },
        );
        assert_eq!(status, RebootStatus::Performed);
        assert!(acted.get());
    }

    #[test]
    fn test_failed_reboot_is_warning() {
        let gate = ReconciliationGate::new(&kernels(&["linux"]), &kernels(&["linux-zen"]), RebootPolicy::Prompt);
        let status = gate.confirm_and_act("Reboot?", |_| Ok(true), || anyhow::bail!("polkit denied"));
        assert_eq!(status, RebootStatus::Failed("polkit denied".to_string()));
        assert!(status.is_warning());
    }
}
