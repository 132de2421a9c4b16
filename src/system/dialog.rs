use std::io::{BufRead, IsTerminal, Write};
use std::process::{Command, Stdio};

use crate::common::errors::MaintenanceError;

/// Graphical yes/no question via zenity, falling back to kdialog.
///
/// Both tools exit 0 for "yes" and 1 for "no"; any other status means the
/// dialog could not be shown.
pub fn ask_graphical(title: &str, message: &str) -> Result<bool, MaintenanceError> {
    if !has_display(
        std::env::var_os("DISPLAY").is_some(),
        std::env::var_os("WAYLAND_DISPLAY").is_some(),
    ) {
        return Err(MaintenanceError::unavailable(
            "no graphical session (DISPLAY/WAYLAND_DISPLAY unset)",
        ));
    }

    let (program, args): (&str, Vec<String>) = if which::which("zenity").is_ok() {
        (
            "zenity",
            vec![
                "--question".to_string(),
                format!("--title={}", title),
                format!("--text={}", message),
            ],
        )
    } else if which::which("kdialog").is_ok() {
        (
            "kdialog",
            vec![
                "--title".to_string(),
                title.to_string(),
                "--yesno".to_string(),
                message.to_string(),
            ],
        )
    } else {
        return Err(MaintenanceError::unavailable(
            "neither zenity nor kdialog is installed",
        ));
    };

    tracing::debug!(program, "showing confirmation dialog");
    let status = Command::new(program)
        .args(&args)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map_err(|e| MaintenanceError::unavailable(format!("failed to launch {}: {}", program, e)))?;

    interpret_dialog_status(program, status.code())
}

/// `[y/N]` question on the controlling terminal
pub fn ask_terminal(title: &str, message: &str) -> Result<bool, MaintenanceError> {
    let stdin = std::io::stdin();
    if !stdin.is_terminal() {
        return Err(MaintenanceError::unavailable("stdin is not a terminal"));
    }

    let mut stderr = std::io::stderr();
    write!(stderr, "\n  {}: {} [y/N] ", title, message)
        .and_then(|_| stderr.flush())
        .map_err(|e| MaintenanceError::unavailable(e.to_string()))?;

    let mut input = String::new();
    stdin
        .lock()
        .read_line(&mut input)
        .map_err(|e| MaintenanceError::unavailable(e.to_string()))?;
    Ok(parse_answer(&input))
}

fn has_display(x11: bool, wayland: bool) -> bool {
    x11 || wayland
}

fn interpret_dialog_status(program: &str, code: Option<i32>) -> Result<bool, MaintenanceError> {
    match code {
        Some(0) => Ok(true),
        Some(1) => Ok(false),
        Some(other) => Err(MaintenanceError::unavailable(format!(
            "{} exited with status {}",
            program, other
        ))),
        None => Err(MaintenanceError::unavailable(format!(
            "{} was terminated by a signal",
            program
        ))),
    }
}

fn parse_answer(input: &str) -> bool {
    matches!(input.trim().to_ascii_lowercase().as_str(), "y" | "yes")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_answer() {
        assert!(parse_answer("y\n"));
        assert!(parse_answer("YES"));
        assert!(!parse_answer(""));
        assert!(!parse_answer("n"));
        assert!(!parse_answer("maybe"));
    }

    #[test]
    fn test_dialog_status_mapping() {
        assert!(interpret_dialog_status("zenity", Some(0)).unwrap());
        assert!(!interpret_dialog_status("zenity", Some(1)).unwrap());
        // 5 is zenity's timeout status, -1 an internal error
        assert!(interpret_dialog_status("zenity", Some(5)).is_err());
        assert!(interpret_dialog_status("kdialog", None).is_err());
    }

    #[test]
    fn test_has_display() {
        assert!(!has_display(false, false));
        assert!(has_display(true, false));
        assert!(has_display(false, true));
    }
}
