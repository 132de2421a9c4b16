use anyhow::Context;

use super::{PlanContext, PlanStep};
use crate::runner::StepCategory;
use crate::system::{argv, selectors};

pub const CHECK_HELPER: &str = "Check AUR helper";
pub const SNAPSHOT_INSTALLED: &str = "Snapshot installed packages";

/// Step name used for one application
pub fn install_step_name(app: &str) -> String {
    format!("Install {}", app)
}

/// Bulk installation through the AUR helper, one step per application.
///
/// Applications already installed are skipped, so re-running the plan is a
/// no-op. A single failed package only warns.
pub fn steps<'c>(_ctx: &PlanContext<'c>, apps: &[String]) -> Vec<PlanStep<'c>> {
    let mut steps = vec![
        PlanStep::fatal(CHECK_HELPER, StepCategory::Install, |ctx| {
            let helper = ctx.config.aur_helper.as_str();
            if !ctx.system.is_available(helper) {
                anyhow::bail!(
                    "AUR helper '{}' is not installed (set aur_helper in the config)",
                    helper
                );
            }
            Ok(None)
        }),
        PlanStep::fatal(SNAPSHOT_INSTALLED, StepCategory::Query, |ctx| {
            ctx.installed = Some(ctx.differ().capture(selectors::INSTALLED)?);
            Ok(None)
        }),
    ];

    let mut seen = std::collections::BTreeSet::new();
    for app in apps.iter().filter(|a| seen.insert(a.as_str())) {
        let app = app.clone();
        steps.push(PlanStep::warn(install_step_name(&app), StepCategory::Install, move |ctx| {
            let already = ctx
                .installed
                .as_ref()
                .is_some_and(|installed| installed.contains(&app));
            if already {
                tracing::info!(app = %app, "already installed, skipping");
                return Ok(None);
            }

            let helper = ctx.config.aur_helper.as_str();
            let cmd = argv([helper, "-S", "--needed", "--noconfirm", app.as_str()]);
            ctx.system
                .run_action(&cmd)?
                .into_result(&cmd)
                .with_context(|| format!("Failed to install '{}'", app))?;
            Ok(None)
        }));
    }

    steps
}
