use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

use super::{PlanContext, PlanStep};
use crate::runner::StepCategory;
use crate::system::{argv, selectors};

pub const PACMAN_CACHE: &str = "/var/cache/pacman/pkg";
pub const MODULES_DIR: &str = "/usr/lib/modules";
pub const JOURNAL_DIR: &str = "/var/log/journal";
pub const FLATPAK_SYSTEM_DIR: &str = "/var/lib/flatpak";
pub const TEMP_DIRS: [&str; 2] = ["/tmp", "/var/tmp"];

pub const CLEAN_PACKAGE_CACHE: &str = "Clean package cache";
pub const CLEAN_AUR_CACHE: &str = "Clean AUR helper cache";
pub const REMOVE_ORPHANS: &str = "Remove orphaned packages";
pub const REMOVE_OLD_KERNELS: &str = "Remove old kernel modules";
pub const CLEAN_TEMP: &str = "Clean temporary files";
pub const VACUUM_JOURNAL: &str = "Vacuum journal logs";
pub const CLEAR_THUMBNAILS: &str = "Clear thumbnail cache";
pub const REMOVE_FLATPAK_UNUSED: &str = "Remove unused Flatpak runtimes";
pub const TRIM_SSD: &str = "Trim SSD";

/// Disk-space cleanup. Every step only warns on failure: one cache that
/// cannot be cleared should not keep the others from being cleared.
pub fn steps<'c>(ctx: &PlanContext<'c>) -> Vec<PlanStep<'c>> {
    let mut steps = vec![
        PlanStep::warn(CLEAN_PACKAGE_CACHE, StepCategory::Cleanup, |ctx| {
            if !ctx.system.is_available("paccache") {
                anyhow::bail!("paccache not found (install pacman-contrib)");
            }
            let keep = format!("-rk{}", ctx.config.paccache_keep);
            ctx.measured(&[PathBuf::from(PACMAN_CACHE)], |ctx| {
                for cmd in [argv(["paccache", keep.as_str()]), argv(["paccache", "-ruk0"])] {
                    ctx.system.run_privileged_command(&cmd)?.into_result(&cmd)?;
                }
                Ok(())
            })
        }),
        PlanStep::warn(CLEAN_AUR_CACHE, StepCategory::Cleanup, |ctx| {
            let dir = user_cache_dir()?.join(&ctx.config.aur_helper);
            clear_user_dir(ctx, &dir)
        }),
        PlanStep::warn(REMOVE_ORPHANS, StepCategory::Cleanup, |ctx| {
            let orphans = ctx.differ().capture(selectors::ORPHANS)?;
            if orphans.is_empty() {
                tracing::info!("no orphaned packages");
                return Ok(None);
            }
            tracing::info!(count = orphans.len(), "removing orphaned packages");
            let mut cmd = argv(["pacman", "-Rns", "--noconfirm"]);
            cmd.extend(orphans.elements().iter().cloned());
            ctx.system.run_privileged_command(&cmd)?.into_result(&cmd)?;
            Ok(None)
        }),
        PlanStep::warn(REMOVE_OLD_KERNELS, StepCategory::Cleanup, |ctx| {
            let stale = stale_module_dirs(ctx)?;
            if stale.is_empty() {
                tracing::info!("no stale kernel module directories");
                return Ok(Some(0));
            }
            ctx.measured(&stale, |ctx| {
                let mut cmd = argv(["rm", "-rf", "--"]);
                cmd.extend(stale.iter().map(|p| p.display().to_string()));
                ctx.system.run_privileged_command(&cmd)?.into_result(&cmd)?;
                Ok(())
            })
        }),
        PlanStep::warn(CLEAN_TEMP, StepCategory::Cleanup, |ctx| {
            let roots: Vec<PathBuf> = TEMP_DIRS.iter().map(PathBuf::from).collect();
            let age = format!("+{}", ctx.config.tmp_max_age_days);
            ctx.measured(&roots, |ctx| {
                for dir in TEMP_DIRS {
                    let cmd = argv(["find", dir, "-xdev", "-type", "f", "-atime", age.as_str(), "-delete"]);
                    ctx.system.run_privileged_command(&cmd)?.into_result(&cmd)?;
                }
                Ok(())
            })
        }),
        PlanStep::warn(VACUUM_JOURNAL, StepCategory::Cleanup, |ctx| {
            let vacuum = format!("--vacuum-time={}", ctx.config.journal_retention);
            ctx.measured(&[PathBuf::from(JOURNAL_DIR)], |ctx| {
                let cmd = argv(["journalctl", vacuum.as_str()]);
                ctx.system.run_privileged_command(&cmd)?.into_result(&cmd)?;
                Ok(())
            })
        }),
        PlanStep::warn(CLEAR_THUMBNAILS, StepCategory::Cleanup, |ctx| {
            let dir = user_cache_dir()?.join("thumbnails");
            clear_user_dir(ctx, &dir)
        }),
    ];

    if ctx.config.flatpak && ctx.system.is_available("flatpak") {
        steps.push(PlanStep::warn(REMOVE_FLATPAK_UNUSED, StepCategory::Cleanup, |ctx| {
            let mut roots = vec![PathBuf::from(FLATPAK_SYSTEM_DIR)];
            if let Some(data) = dirs::data_dir() {
                roots.push(data.join("flatpak"));
            }
            ctx.measured(&roots, |ctx| {
                let cmd = argv(["flatpak", "uninstall", "--unused", "-y", "--noninteractive"]);
                ctx.system.run_action(&cmd)?.into_result(&cmd)?;
                Ok(())
            })
        }));
    }

    if ctx.config.fstrim && ctx.system.is_available("fstrim") {
        steps.push(PlanStep::warn(TRIM_SSD, StepCategory::Cleanup, |ctx| {
            let cmd = argv(["fstrim", "-av"]);
            ctx.system.run_privileged_command(&cmd)?.into_result(&cmd)?;
            Ok(None)
        }));
    }

    steps
}

fn user_cache_dir() -> Result<PathBuf> {
    dirs::cache_dir().context("Could not determine the user cache directory")
}

/// Delete everything below `dir` but keep the directory itself
fn clear_user_dir(ctx: &PlanContext<'_>, dir: &Path) -> Result<Option<i64>> {
    let empty = ctx
        .system
        .list_directory(dir)
        .map(|entries| entries.is_empty())
        .unwrap_or(true);
    if empty {
        tracing::debug!(dir = %dir.display(), "nothing to clear");
        return Ok(Some(0));
    }
    let target = dir.display().to_string();
    ctx.measured(&[dir.to_path_buf()], |ctx| {
        let cmd = argv(["find", target.as_str(), "-mindepth", "1", "-delete"]);
        ctx.system.run_action(&cmd)?.into_result(&cmd)?;
        Ok(())
    })
}

/// Module trees left behind by kernels that are no longer installed.
///
/// A directory under `/usr/lib/modules` is stale when no package owns it and
/// it does not belong to the running kernel.
pub fn stale_module_dirs(ctx: &PlanContext<'_>) -> Result<Vec<PathBuf>> {
    let uname = argv(["uname", "-r"]);
    let running = ctx.system.run_command(&uname)?.into_result(&uname)?;
    let running = running.stdout.trim().to_string();
    if running.is_empty() {
        anyhow::bail!("Could not determine the running kernel release");
    }

    let mut stale = Vec::new();
    for dir in ctx.system.list_directory(Path::new(MODULES_DIR))? {
        let name = match dir.file_name() {
            Some(n) => n.to_string_lossy().into_owned(),
            None => continue,
        };
        if name == running {
            continue;
        }
        let path = dir.display().to_string();
        let owner = argv(["pacman", "-Qqo", path.as_str()]);
        if ctx.system.run_command(&owner)?.success() {
            continue;
        }
        tracing::info!(dir = %dir.display(), "stale kernel module directory");
        stale.push(dir);
    }
    Ok(stale)
}
