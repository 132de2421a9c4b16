use anyhow::{Context, Result};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter, Layer};

use super::config::Config;

/// Install the global tracing subscriber.
///
/// Terminal output goes to stderr so it never mixes with JSON reports on
/// stdout. `RUST_LOG` overrides the level chosen from `verbose`. When
/// `to_file` is set, a daily rolling file in [`Config::logs_dir`] receives
/// debug-level events as well; keep the returned guard alive until exit so
/// buffered lines are flushed.
pub fn init(verbose: bool, to_file: bool) -> Result<Option<WorkerGuard>> {
    let default_level = if verbose { "archtidy=debug" } else { "archtidy=warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let terminal = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .with_filter(filter);

    if !to_file {
        tracing_subscriber::registry().with(terminal).try_init()?;
        return Ok(None);
    }

    let dir = Config::logs_dir();
    std::fs::create_dir_all(&dir)
        .with_context(|| format!("Failed to create logs dir: {}", dir.display()))?;
    let appender = tracing_appender::rolling::daily(&dir, "archtidy.log");
    let (writer, guard) = tracing_appender::non_blocking(appender);

    let file = fmt::layer()
        .with_writer(writer)
        .with_ansi(false)
        .with_filter(EnvFilter::new("archtidy=debug"));

    tracing_subscriber::registry()
        .with(terminal)
        .with(file)
        .try_init()?;

    Ok(Some(guard))
}
