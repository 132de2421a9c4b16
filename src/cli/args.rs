use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// archtidy: routine Arch/EndeavourOS maintenance
#[derive(Parser, Debug)]
#[command(
    name = "archtidy",
    version,
    about = "Routine Arch Linux maintenance: updates, app installs and disk cleanup",
    long_about = "archtidy upgrades official, AUR and Flatpak packages, offers a reboot only\n\
                  when the installed kernels changed, installs applications in bulk and\n\
                  reclaims disk space from package caches, orphans, logs and temp files.",
    after_help = "EXAMPLES:\n  \
        archtidy                               Update, then clean (full maintenance)\n  \
        archtidy update                        Upgrade packages, prompt for reboot if kernels changed\n  \
        archtidy clean --dry-run               Show the cleanup commands without running them\n  \
        archtidy install firefox vlc           Install applications with the AUR helper\n  \
        archtidy clean --format json           Machine-readable report\n  \
        archtidy config set aur_helper paru    Use paru instead of yay\n  \
        archtidy completions zsh               Generate shell completions"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Output format
    #[arg(long, global = true, default_value = "human")]
    pub format: OutputFormat,

    /// Print what would run without changing the system
    #[arg(long, global = true)]
    pub dry_run: bool,

    /// Config file to use instead of ~/.config/archtidy/config.toml
    #[arg(long, global = true, value_name = "PATH", env = "ARCHTIDY_CONFIG")]
    pub config: Option<PathBuf>,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Verbose output
    #[arg(long, short, global = true)]
    pub verbose: bool,

    /// Quiet mode, minimal output
    #[arg(long, short, global = true)]
    pub quiet: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Upgrade official, AUR and Flatpak packages
    Update,

    /// Reclaim disk space
    Clean,

    /// Install applications through the AUR helper
    Install {
        /// Applications to install (defaults to `apps` from the config)
        apps: Vec<String>,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: CompletionShell,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Print the config file location
    Path,

    /// Write the default configuration if none exists
    Init,

    /// Reset to default configuration
    Reset,

    /// Set a configuration value
    Set {
        /// Configuration key
        key: String,
        /// Configuration value
        value: String,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq)]
pub enum OutputFormat {
    Human,
    Json,
    Quiet,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum CompletionShell {
    Bash,
    Zsh,
    Fish,
}
