//! Maintenance plans: the concrete step lists behind each command.

pub mod cleanup;
pub mod install;
pub mod update;

use anyhow::Result;
use std::path::PathBuf;

use crate::accounting::freed_between;
use crate::common::config::Config;
use crate::gate::ReconciliationGate;
use crate::runner::{RunAborted, RunObserver, RunReport, Step, StepRunner};
use crate::snapshot::{NamedSet, SnapshotDiffer};
use crate::system::System;

/// Shared state threaded through every step of a plan
pub struct PlanContext<'c> {
    pub system: &'c dyn System,
    pub config: &'c Config,
    pub kernels_before: Option<NamedSet>,
    pub kernels_after: Option<NamedSet>,
    pub installed: Option<NamedSet>,
}

impl std::fmt::Debug for PlanContext<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlanContext")
            .field("kernels_before", &self.kernels_before)
            .field("kernels_after", &self.kernels_after)
            .field("installed", &self.installed.as_ref().map(NamedSet::len))
            .finish_non_exhaustive()
    }
}

impl<'c> PlanContext<'c> {
    pub fn new(system: &'c dyn System, config: &'c Config) -> Self {
        Self {
            system,
            config,
            kernels_before: None,
            kernels_after: None,
            installed: None,
        }
    }

    pub fn differ(&self) -> SnapshotDiffer<'c> {
        SnapshotDiffer::new(self.system)
    }

    /// Run `f` between two size readings of `paths` and return the freed delta
    pub fn measured<F>(&self, paths: &[PathBuf], f: F) -> Result<Option<i64>>
    where
        F: FnOnce(&Self) -> Result<()>,
    {
        let size = |ctx: &Self| -> u64 {
            paths
                .iter()
                .map(|p| ctx.system.measure_directory_size(p))
                .fold(0u64, u64::saturating_add)
        };
        let before = size(self);
        f(self)?;
        let after = size(self);
        tracing::debug!(before, after, "measured cleanup");
        Ok(Some(freed_between(before, after)))
    }
}

/// Step type used by every plan
pub type PlanStep<'c> = Step<'static, PlanContext<'c>>;

/// Which maintenance to perform
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Plan {
    /// System and AUR upgrade with a reboot check
    Update,
    /// Disk-space cleanup
    Clean,
    /// Install the given applications through the AUR helper
    Install(Vec<String>),
    /// Update followed by cleanup
    Maintain,
}

impl Plan {
    pub fn name(&self) -> &'static str {
        match self {
            Plan::Update => "update",
            Plan::Clean => "clean",
            Plan::Install(_) => "install",
            Plan::Maintain => "maintain",
        }
    }

    pub fn steps<'c>(&self, ctx: &PlanContext<'c>) -> Vec<PlanStep<'c>> {
        match self {
            Plan::Update => update::steps(ctx),
            Plan::Clean => cleanup::steps(ctx),
            Plan::Install(apps) => install::steps(ctx, apps),
            Plan::Maintain => {
                let mut steps = update::steps(ctx);
                steps.extend(cleanup::steps(ctx));
                steps
            }
        }
    }
}

/// Run a plan to completion, then offer a reboot if the kernel set changed
pub fn execute(
    plan: &Plan,
    system: &dyn System,
    config: &Config,
    observer: &mut dyn RunObserver,
) -> Result<RunReport, RunAborted> {
    let mut ctx = PlanContext::new(system, config);
    let steps = plan.steps(&ctx);
    tracing::info!(plan = plan.name(), steps = steps.len(), "starting plan");

    let mut report = StepRunner::new(observer).run(steps, &mut ctx)?;

    if let (Some(before), Some(after)) = (&ctx.kernels_before, &ctx.kernels_after) {
        let gate = ReconciliationGate::new(before, after, config.reboot_policy);
        report.reboot_required = gate.required();
        report.reboot = gate.confirm_and_act(
            &gate.describe(),
            |prompt| system.confirmation_dialog("Reboot required", prompt),
            || system.trigger_reboot(),
        );
    }

    Ok(report)
}
