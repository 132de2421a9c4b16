use anyhow::Result;
use clap::Parser;
use colored::Colorize;
use std::path::Path;

use archtidy::cli::args::{Cli, Commands, ConfigAction, OutputFormat};
use archtidy::cli::output::{self, TerminalObserver};
use archtidy::common::config::Config;
use archtidy::common::logging;
use archtidy::plans::{self, Plan};
use archtidy::system::HostSystem;

fn main() {
    let cli = Cli::parse();

    if cli.no_color {
        colored::control::set_override(false);
    }

    match run(cli) {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            eprintln!("{} {:#}", "Error:".red().bold(), e);
            std::process::exit(1);
        }
    }
}

fn run(cli: Cli) -> Result<i32> {
    let config_path = cli.config.clone().unwrap_or_else(Config::config_path);

    match cli.command {
        None => cmd_run(&cli, &config_path, Plan::Maintain),
        Some(Commands::Update) => cmd_run(&cli, &config_path, Plan::Update),
        Some(Commands::Clean) => cmd_run(&cli, &config_path, Plan::Clean),
        Some(Commands::Install { ref apps }) => {
            let apps = if apps.is_empty() {
                Config::load_from(&config_path)?.apps
            } else {
                apps.clone()
            };
            if apps.is_empty() {
                anyhow::bail!(
                    "No applications given. Pass names or set them with: archtidy config set apps firefox,vlc"
                );
            }
            cmd_run(&cli, &config_path, Plan::Install(apps))
        }
        Some(Commands::Config { ref action }) => {
            cmd_config(action, &config_path)?;
            Ok(0)
        }
        Some(Commands::Completions { ref shell }) => {
            use clap::CommandFactory;
            let mut cmd = Cli::command();
            let shell = match shell {
                archtidy::cli::args::CompletionShell::Bash => clap_complete::Shell::Bash,
                archtidy::cli::args::CompletionShell::Zsh => clap_complete::Shell::Zsh,
                archtidy::cli::args::CompletionShell::Fish => clap_complete::Shell::Fish,
            };
            clap_complete::generate(shell, &mut cmd, "archtidy", &mut std::io::stdout());
            Ok(0)
        }
    }
}

// ─── Maintenance runs ─────────────────────────────────────────────────────────

fn cmd_run(cli: &Cli, config_path: &Path, plan: Plan) -> Result<i32> {
    let config = Config::load_from(config_path)?;
    let _log_guard = logging::init(cli.verbose, config.log_to_file)?;
    tracing::debug!(config = %config_path.display(), plan = plan.name(), "loaded config");

    let system = HostSystem::new(&config)
        .dry_run(cli.dry_run)
        .stdout_to_stderr(cli.format != OutputFormat::Human);

    if cli.format == OutputFormat::Human && !cli.quiet {
        output::print_plan_header(plan.name(), cli.dry_run);
    }

    let mut observer = TerminalObserver::new(cli.format, cli.quiet);
    match plans::execute(&plan, &system, &config, &mut observer) {
        Ok(report) => {
            output::print_report(&report, cli.format);
            Ok(0)
        }
        Err(aborted) => {
            tracing::error!(step = %aborted.step, code = aborted.exit_code(), "run aborted");
            output::print_aborted(&aborted, cli.format);
            Ok(aborted.exit_code())
        }
    }
}

// ─── Config ───────────────────────────────────────────────────────────────────

fn cmd_config(action: &ConfigAction, path: &Path) -> Result<()> {
    match action {
        ConfigAction::Show => {
            let config = Config::load_from(path)?;
            println!("{}", toml::to_string_pretty(&config)?);
            Ok(())
        }
        ConfigAction::Path => {
            println!("{}", path.display());
            Ok(())
        }
        ConfigAction::Init => {
            if path.exists() {
                println!("  {} Config already exists at {}", "ℹ️", path.display());
                return Ok(());
            }
            Config::default().save_to(path)?;
            println!("  {} Created {}", "✓".green(), path.display());
            Ok(())
        }
        ConfigAction::Reset => {
            Config::default().save_to(path)?;
            println!("  {} Configuration reset to defaults", "✓".green());
            Ok(())
        }
        ConfigAction::Set { key, value } => {
            let mut config = Config::load_from(path)?;
            config.set(key, value)?;
            config.save_to(path)?;
            println!("  {} Set {} = {}", "✓".green(), key, value);
            Ok(())
        }
    }
}
