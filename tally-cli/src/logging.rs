use anyhow::{Context, Result};
use std::fs::OpenOptions;
use std::path::PathBuf;
use std::sync::Mutex;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::state::logs_dir;

// Matches every `tally_*` crate by target prefix
fn env_filter(verbose: bool) -> EnvFilter {
    EnvFilter::try_from_env("TALLY_LOG").unwrap_or_else(|_| {
        let directive = if verbose { "tally=debug" } else { "tally=info" };
        directive.into()
    })
}

/// Log to stderr (plain commands).
pub fn init_stderr(verbose: bool) {
    tracing_subscriber::registry()
        .with(env_filter(verbose))
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false),
        )
        .init();
}

/// Log to `~/.tally/logs/<YYYY-MM-DD>.log` so the TUI screen stays clean.
pub fn init_file(verbose: bool) -> Result<PathBuf> {
    let today = chrono::Local::now().format("%Y-%m-%d").to_string();
    let path = logs_dir()?.join(format!("{today}.log"));
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .with_context(|| format!("open {}", path.display()))?;

    tracing_subscriber::registry()
        .with(env_filter(verbose))
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(Mutex::new(file))
                .with_ansi(false),
        )
        .init();
    Ok(path)
}
