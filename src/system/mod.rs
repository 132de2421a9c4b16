//! External collaborators consumed by maintenance plans.
//!
//! Everything that touches the package manager, the filesystem, the
//! confirmation dialog or the init system goes through [`System`], so plans
//! can be exercised against a scripted implementation in tests.

pub mod dialog;
pub mod host;

use anyhow::Result;
use std::path::{Path, PathBuf};

use crate::common::errors::MaintenanceError;

pub use host::HostSystem;

/// Selectors understood by [`System::query_named_set`]
pub mod selectors {
    /// Packages owning files under `/usr/lib/modules`
    pub const KERNELS: &str = "kernels";
    /// Packages installed as dependencies that nothing requires
    pub const ORPHANS: &str = "orphans";
    /// Every installed package
    pub const INSTALLED: &str = "installed";
}

/// Captured result of an external command
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    /// Exit code, `None` when terminated by a signal
    pub code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    pub fn ok(stdout: impl Into<String>) -> Self {
        Self {
            code: Some(0),
            stdout: stdout.into(),
            stderr: String::new(),
        }
    }

    pub fn failed(code: i32, stderr: impl Into<String>) -> Self {
        Self {
            code: Some(code),
            stdout: String::new(),
            stderr: stderr.into(),
        }
    }

    pub fn success(&self) -> bool {
        self.code == Some(0)
    }

    /// Turn a non-zero exit into a [`MaintenanceError::CommandFailed`]
    pub fn into_result(self, argv: &[String]) -> Result<Self, MaintenanceError> {
        if self.success() {
            return Ok(self);
        }
        Err(MaintenanceError::CommandFailed {
            program: argv.first().cloned().unwrap_or_default(),
            code: self.code,
            stderr: self.stderr.trim().to_string(),
        })
    }

    /// Non-empty trimmed stdout lines
    pub fn lines(&self) -> Vec<String> {
        self.stdout
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(String::from)
            .collect()
    }
}

/// Build an argv vector from string slices
pub fn argv<I, S>(parts: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    parts.into_iter().map(Into::into).collect()
}

/// The package/OS management layer as seen by the orchestrator
pub trait System {
    /// Read a named set of identifiers from external state.
    /// Fails with [`MaintenanceError::ExternalQuery`], never with an empty set.
    fn query_named_set(&self, selector: &str) -> Result<Vec<String>, MaintenanceError>;

    /// Run a read-only inspection command and capture its output.
    /// Executes even in dry-run mode.
    fn run_command(&self, argv: &[String]) -> Result<CommandOutput>;

    /// Run an unprivileged command that changes system state
    fn run_action(&self, argv: &[String]) -> Result<CommandOutput>;

    /// Run a command with elevated privileges and capture its output
    fn run_privileged_command(&self, argv: &[String]) -> Result<CommandOutput>;

    /// Allocated size of everything below `path`; 0 when missing
    fn measure_directory_size(&self, path: &Path) -> u64;

    /// Immediate children of a directory
    fn list_directory(&self, path: &Path) -> Result<Vec<PathBuf>>;

    /// Whether `program` can be found on PATH
    fn is_available(&self, program: &str) -> bool;

    /// Ask the operator a yes/no question.
    /// Fails with [`MaintenanceError::ConfirmationUnavailable`] when no backend can be shown.
    fn confirmation_dialog(&self, title: &str, message: &str) -> Result<bool, MaintenanceError>;

    /// Reboot the machine
    fn trigger_reboot(&self) -> Result<()>;
}
