use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use super::errors::MaintenanceError;

/// Global archtidy configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Config {
    /// AUR helper binary (yay, paru, ...)
    #[serde(default = "default_aur_helper")]
    pub aur_helper: String,

    /// Command used to elevate privileged steps; empty runs them directly
    #[serde(default = "default_elevate_with")]
    pub elevate_with: String,

    /// Pass --noconfirm to pacman and the AUR helper during upgrades
    #[serde(default)]
    pub noconfirm: bool,

    /// What to do when the installed kernel set changed
    #[serde(default)]
    pub reboot_policy: RebootPolicy,

    /// How the reboot confirmation is asked
    #[serde(default)]
    pub confirm_backend: ConfirmBackend,

    /// Cached versions paccache keeps per installed package
    #[serde(default = "default_paccache_keep")]
    pub paccache_keep: u32,

    /// Argument for journalctl --vacuum-time
    #[serde(default = "default_journal_retention")]
    pub journal_retention: String,

    /// Files in /tmp and /var/tmp not accessed for this many days are removed
    #[serde(default = "default_tmp_max_age_days")]
    pub tmp_max_age_days: u32,

    /// Update Flatpak apps and remove unused runtimes
    #[serde(default = "default_true")]
    pub flatpak: bool,

    /// Run fstrim on mounted filesystems that support it
    #[serde(default = "default_true")]
    pub fstrim: bool,

    /// Applications installed by `archtidy install` when none are given
    #[serde(default)]
    pub apps: Vec<String>,

    /// Also write logs to a daily rolling file in the logs directory
    #[serde(default)]
    pub log_to_file: bool,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RebootPolicy {
    /// Ask before rebooting
    #[default]
    Prompt,
    /// Reboot without asking
    Auto,
    /// Never offer a reboot
    Never,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ConfirmBackend {
    /// Graphical dialog (zenity or kdialog)
    #[default]
    Dialog,
    /// `[y/N]` prompt on the controlling terminal
    Terminal,
}

impl std::str::FromStr for RebootPolicy {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "prompt" => Ok(RebootPolicy::Prompt),
            "auto" => Ok(RebootPolicy::Auto),
            "never" => Ok(RebootPolicy::Never),
            _ => anyhow::bail!("Invalid reboot policy '{}' (expected prompt, auto or never)", s),
        }
    }
}

impl std::str::FromStr for ConfirmBackend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "dialog" => Ok(ConfirmBackend::Dialog),
            "terminal" => Ok(ConfirmBackend::Terminal),
            _ => anyhow::bail!("Invalid confirm backend '{}' (expected dialog or terminal)", s),
        }
    }
}

fn default_aur_helper() -> String {
    "yay".to_string()
}
fn default_elevate_with() -> String {
    "sudo".to_string()
}
fn default_paccache_keep() -> u32 {
    3
}
fn default_journal_retention() -> String {
    "2weeks".to_string()
}
fn default_tmp_max_age_days() -> u32 {
    10
}
fn default_true() -> bool {
    true
}

impl Default for Config {
    fn default() -> Self {
        Self {
            aur_helper: default_aur_helper(),
            elevate_with: default_elevate_with(),
            noconfirm: false,
            reboot_policy: RebootPolicy::default(),
            confirm_backend: ConfirmBackend::default(),
            paccache_keep: default_paccache_keep(),
            journal_retention: default_journal_retention(),
            tmp_max_age_days: default_tmp_max_age_days(),
            flatpak: true,
            fstrim: true,
            apps: Vec::new(),
            log_to_file: false,
        }
    }
}

impl Config {
    /// Get the archtidy config directory (~/.config/archtidy)
    pub fn config_dir() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("/tmp"))
            .join("archtidy")
    }

    /// Get the default config file path
    pub fn config_path() -> PathBuf {
        Self::config_dir().join("config.toml")
    }

    /// Get the logs directory (~/.local/state/archtidy/logs)
    pub fn logs_dir() -> PathBuf {
        dirs::state_dir()
            .or_else(dirs::data_local_dir)
            .unwrap_or_else(|| PathBuf::from("/tmp"))
            .join("archtidy")
            .join("logs")
    }

    /// Load config from a specific file, or defaults if it does not exist
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Config::default());
        }
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config: {}", path.display()))?;
        let config: Config = toml::from_str(&contents).map_err(|e| MaintenanceError::Config {
            path: path.to_path_buf(),
            message: e.message().to_string(),
        })?;
        config.validate(path)?;
        Ok(config)
    }

    /// Save config to a file, creating parent directories
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(dir) = path.parent() {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create config dir: {}", dir.display()))?;
        }
        let contents = toml::to_string_pretty(self).context("Failed to serialize config")?;
        std::fs::write(path, contents)
            .with_context(|| format!("Failed to write config: {}", path.display()))?;
        Ok(())
    }

    /// Set a single key from its string form, as used by `config set`
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        match key {
            "aur_helper" => self.aur_helper = required(key, value)?,
            "elevate_with" => self.elevate_with = value.to_string(),
            "noconfirm" => self.noconfirm = value.parse()?,
            "reboot_policy" => self.reboot_policy = value.parse()?,
            "confirm_backend" => self.confirm_backend = value.parse()?,
            "paccache_keep" => self.paccache_keep = value.parse()?,
            "journal_retention" => self.journal_retention = required(key, value)?,
            "tmp_max_age_days" => self.tmp_max_age_days = value.parse()?,
            "flatpak" => self.flatpak = value.parse()?,
            "fstrim" => self.fstrim = value.parse()?,
            "log_to_file" => self.log_to_file = value.parse()?,
            "apps" => {
                self.apps = value
                    .split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(String::from)
                    .collect()
            }
            _ => anyhow::bail!("Unknown config key: {}", key),
        }
        Ok(())
    }

    fn validate(&self, path: &Path) -> Result<(), MaintenanceError> {
        let invalid = |message: &str| MaintenanceError::Config {
            path: path.to_path_buf(),
            message: message.to_string(),
        };
        if self.aur_helper.trim().is_empty() {
            return Err(invalid("aur_helper must not be empty"));
        }
        if self.journal_retention.trim().is_empty() {
            return Err(invalid("journal_retention must not be empty"));
        }
        Ok(())
    }

    /// Flags appended to upgrade commands
    pub fn noconfirm_flag(&self) -> Option<&'static str> {
        self.noconfirm.then_some("--noconfirm")
    }
}

fn required(key: &str, value: &str) -> Result<String> {
    let value = value.trim();
    if value.is_empty() {
        anyhow::bail!("{} must not be empty", key);
    }
    Ok(value.to_string())
}
