use std::path::PathBuf;

use thiserror::Error;

use crate::runner::Severity;

/// Typed error taxonomy for maintenance runs.
/// We use `anyhow` at the top level for CLI error handling,
/// but these typed errors let the runner and the gate classify failures.
#[derive(Debug, Error)]
pub enum MaintenanceError {
    /// A read of external state failed. Always fatal: later diffs and
    /// decisions built on it would be unreliable.
    #[error("Query '{selector}' failed: {message}")]
    ExternalQuery { selector: String, message: String },

    /// An action step failed
    #[error("Step '{step}' failed ({severity}): {message}")]
    StepExecution {
        step: String,
        severity: Severity,
        message: String,
    },

    /// The optional follow-up confirmation could not be offered
    #[error("Confirmation unavailable: {message}")]
    ConfirmationUnavailable { message: String },

    /// An external command exited non-zero
    #[error("'{program}' exited with {}: {stderr}", exit_label(.code))]
    CommandFailed {
        program: String,
        code: Option<i32>,
        stderr: String,
    },

    /// Configuration file is invalid
    #[error("Config error in '{}': {message}", .path.display())]
    Config { path: PathBuf, message: String },
}

fn exit_label(code: &Option<i32>) -> String {
    match code {
        Some(c) => format!("status {c}"),
        None => "signal".to_string(),
    }
}

impl MaintenanceError {
    pub fn query(selector: &str, message: impl Into<String>) -> Self {
        MaintenanceError::ExternalQuery {
            selector: selector.to_string(),
            message: message.into(),
        }
    }

    pub fn unavailable(message: impl Into<String>) -> Self {
        MaintenanceError::ConfirmationUnavailable {
            message: message.into(),
        }
    }

    /// True for errors that must abort a run whatever the step's severity
    pub fn is_always_fatal(&self) -> bool {
        matches!(self, MaintenanceError::ExternalQuery { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_error_is_always_fatal() {
        assert!(MaintenanceError::query("kernels", "boom").is_always_fatal());
        assert!(!MaintenanceError::unavailable("no display").is_always_fatal());
    }

    #[test]
    fn test_command_failed_display() {
        let err = MaintenanceError::CommandFailed {
            program: "pacman".to_string(),
            code: Some(1),
            stderr: "error: target not found".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "'pacman' exited with status 1: error: target not found"
        );

        let killed = MaintenanceError::CommandFailed {
            program: "fstrim".to_string(),
            code: None,
            stderr: String::new(),
        };
        assert!(killed.to_string().contains("signal"));
    }
}
