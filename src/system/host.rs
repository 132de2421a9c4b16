use anyhow::{Context, Result};
use std::collections::HashSet;
use std::os::unix::fs::MetadataExt;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use walkdir::WalkDir;

use super::dialog;
use super::{selectors, CommandOutput, System};
use crate::common::config::{Config, ConfirmBackend};
use crate::common::errors::MaintenanceError;

/// The real machine: pacman, the AUR helper, coreutils and systemd.
///
/// Inspection commands have their output captured. Mutating commands inherit
/// the terminal so pacman and the AUR helper can prompt and show progress;
/// their `CommandOutput` carries only the exit code.
#[derive(Debug, Clone)]
pub struct HostSystem {
    elevate_with: Vec<String>,
    confirm_backend: ConfirmBackend,
    dry_run: bool,
    stdout_to_stderr: bool,
}

impl HostSystem {
    pub fn new(config: &Config) -> Self {
        Self {
            elevate_with: config
                .elevate_with
                .split_whitespace()
                .map(String::from)
                .collect(),
            confirm_backend: config.confirm_backend,
            dry_run: false,
            stdout_to_stderr: false,
        }
    }

    /// Log mutating commands and the reboot instead of executing them
    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Send child stdout to our stderr, keeping stdout clean for JSON reports
    pub fn stdout_to_stderr(mut self, enabled: bool) -> Self {
        self.stdout_to_stderr = enabled;
        self
    }

    fn capture(&self, argv: &[String]) -> Result<CommandOutput> {
        let (program, args) = split_argv(argv)?;
        tracing::debug!(command = %argv.join(" "), "inspect");
        let output = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .output()
            .with_context(|| format!("Failed to launch '{}'", program))?;
        Ok(CommandOutput {
            code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }

    fn passthrough(&self, argv: &[String]) -> Result<CommandOutput> {
        if self.dry_run {
            tracing::info!(command = %argv.join(" "), "dry run, not executing");
            return Ok(CommandOutput::ok(""));
        }

        let (program, args) = split_argv(argv)?;
        tracing::debug!(command = %argv.join(" "), "execute");
        let stdout = if self.stdout_to_stderr {
            Stdio::from(std::io::stderr())
        } else {
            Stdio::inherit()
        };
        let status = Command::new(program)
            .args(args)
            .stdout(stdout)
            .status()
            .with_context(|| format!("Failed to launch '{}'", program))?;
        Ok(CommandOutput {
            code: status.code(),
            stdout: String::new(),
            stderr: String::new(),
        })
    }

    fn query(&self, selector: &str, argv: &[String], allow_empty: bool) -> Result<Vec<String>, MaintenanceError> {
        let output = self
            .capture(argv)
            .map_err(|e| MaintenanceError::query(selector, format!("{:#}", e)))?;
        classify_query(selector, output, allow_empty)
    }
}

/// Interpret a pacman query's output.
///
/// With `allow_empty`, exit status 1 with no output at all is pacman's "no
/// results" answer. Any other non-zero exit is a failed read.
fn classify_query(selector: &str, output: CommandOutput, allow_empty: bool) -> Result<Vec<String>, MaintenanceError> {
    if output.success() {
        return Ok(output.lines());
    }
    let empty_answer =
        output.code == Some(1) && output.stdout.trim().is_empty() && output.stderr.trim().is_empty();
    if allow_empty && empty_answer {
        return Ok(Vec::new());
    }
    let detail = output.stderr.trim();
    let message = match output.code {
        Some(code) if detail.is_empty() => format!("exited with status {}", code),
        Some(code) => format!("exited with status {}: {}", code, detail),
        None => "terminated by signal".to_string(),
    };
    Err(MaintenanceError::query(selector, message))
}

fn split_argv(argv: &[String]) -> Result<(&str, &[String])> {
    match argv.split_first() {
        Some((program, args)) => Ok((program.as_str(), args)),
        None => anyhow::bail!("Empty command line"),
    }
}

impl System for HostSystem {
    fn query_named_set(&self, selector: &str) -> Result<Vec<String>, MaintenanceError> {
        let pacman = |args: &[&str]| -> Vec<String> {
            std::iter::once("pacman")
                .chain(args.iter().copied())
                .map(String::from)
                .collect()
        };
        match selector {
            selectors::KERNELS => self.query(selector, &pacman(&["-Qqo", "/usr/lib/modules"]), false),
            selectors::ORPHANS => self.query(selector, &pacman(&["-Qtdq"]), true),
            selectors::INSTALLED => self.query(selector, &pacman(&["-Qq"]), false),
            other => Err(MaintenanceError::query(other, "unknown selector")),
        }
    }

    fn run_command(&self, argv: &[String]) -> Result<CommandOutput> {
        self.capture(argv)
    }

    fn run_action(&self, argv: &[String]) -> Result<CommandOutput> {
        self.passthrough(argv)
    }

    fn run_privileged_command(&self, argv: &[String]) -> Result<CommandOutput> {
        let elevated: Vec<String> = self.elevate_with.iter().chain(argv).cloned().collect();
        self.passthrough(&elevated)
    }

    fn measure_directory_size(&self, path: &Path) -> u64 {
        // Hard links share one inode; count it once, like du
        let mut seen = HashSet::new();
        WalkDir::new(path)
            .follow_links(false)
            .same_file_system(true)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| !e.file_type().is_dir())
            .filter_map(|e| e.metadata().ok())
            .filter(|m| m.nlink() <= 1 || seen.insert((m.dev(), m.ino())))
            .map(|m| m.blocks() * 512)
            .sum()
    }

    fn list_directory(&self, path: &Path) -> Result<Vec<PathBuf>> {
        let entries = std::fs::read_dir(path)
            .with_context(|| format!("Failed to read directory: {}", path.display()))?;
        let mut children: Vec<PathBuf> = entries.filter_map(|e| e.ok()).map(|e| e.path()).collect();
        children.sort();
        Ok(children)
    }

    fn is_available(&self, program: &str) -> bool {
        which::which(program).is_ok()
    }

    fn confirmation_dialog(&self, title: &str, message: &str) -> Result<bool, MaintenanceError> {
        match self.confirm_backend {
            ConfirmBackend::Dialog => dialog::ask_graphical(title, message),
            ConfirmBackend::Terminal => dialog::ask_terminal(title, message),
        }
    }

    fn trigger_reboot(&self) -> Result<()> {
        let argv = super::argv(["systemctl", "reboot"]);
        if self.dry_run {
            tracing::info!("dry run, not rebooting");
            return Ok(());
        }
        let output = self.capture(&argv)?;
        output.into_result(&argv)?;
        Ok(())
    }
}
