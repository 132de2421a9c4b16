use anyhow::Context;

use super::{PlanContext, PlanStep};
use crate::runner::StepCategory;
use crate::system::{argv, selectors};

pub const SNAPSHOT_BEFORE: &str = "Snapshot kernels (before)";
pub const UPGRADE_OFFICIAL: &str = "Upgrade official packages";
pub const UPGRADE_AUR: &str = "Upgrade AUR packages";
pub const UPDATE_FLATPAK: &str = "Update Flatpak apps";
pub const SNAPSHOT_AFTER: &str = "Snapshot kernels (after)";

/// Kernel snapshot, official upgrade, AUR upgrade, Flatpak, kernel snapshot.
///
/// The AUR upgrade only warns on failure so the second snapshot still runs
/// and a kernel change from the official upgrade still triggers the gate.
///
/// The snapshots hold package names only: installing or removing a kernel
/// package triggers the gate, a version bump of an installed one does not.
pub fn steps<'c>(ctx: &PlanContext<'c>) -> Vec<PlanStep<'c>> {
    let mut steps = vec![
        PlanStep::fatal(SNAPSHOT_BEFORE, StepCategory::Query, |ctx| {
            ctx.kernels_before = Some(ctx.differ().capture(selectors::KERNELS)?);
            Ok(None)
        }),
        PlanStep::fatal(UPGRADE_OFFICIAL, StepCategory::Upgrade, |ctx| {
            let mut cmd = argv(["pacman", "-Syu"]);
            cmd.extend(ctx.config.noconfirm_flag().map(String::from));
            ctx.system
                .run_privileged_command(&cmd)?
                .into_result(&cmd)?;
            Ok(None)
        }),
        PlanStep::warn(UPGRADE_AUR, StepCategory::Upgrade, |ctx| {
            let helper = ctx.config.aur_helper.as_str();
            if !ctx.system.is_available(helper) {
                anyhow::bail!("AUR helper '{}' is not installed", helper);
            }
            let mut cmd = argv([helper, "-Sua"]);
            cmd.extend(ctx.config.noconfirm_flag().map(String::from));
            ctx.system
                .run_action(&cmd)?
                .into_result(&cmd)
                .with_context(|| format!("{} AUR upgrade failed", helper))?;
            Ok(None)
        }),
    ];

    if ctx.config.flatpak && ctx.system.is_available("flatpak") {
        steps.push(PlanStep::warn(UPDATE_FLATPAK, StepCategory::Upgrade, |ctx| {
            let cmd = argv(["flatpak", "update", "-y", "--noninteractive"]);
            ctx.system.run_action(&cmd)?.into_result(&cmd)?;
            Ok(None)
        }));
    }

    steps.push(PlanStep::fatal(SNAPSHOT_AFTER, StepCategory::Query, |ctx| {
        ctx.kernels_after = Some(ctx.differ().capture(selectors::KERNELS)?);
        Ok(None)
    }));

    steps
}
