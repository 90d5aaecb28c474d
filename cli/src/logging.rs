//! File logging for the `keyprompt` binary.
//!
//! The dialog owns the terminal, so logs never go to stdout/stderr. Filter priority:
//!
//! 1. `KEYPROMPT_LOG`
//! 2. `RUST_LOG`
//! 3. `--verbose` (debug), otherwise `warn`
//!
//! An unparseable directive falls through to the next source.

use std::fs::OpenOptions;
use std::path::Path;
use std::path::PathBuf;
use std::sync::Mutex;

use anyhow::Context;
use tracing_subscriber::EnvFilter;

const LOG_ENV_VAR: &str = "KEYPROMPT_LOG";

pub fn default_log_path(home: &Path) -> PathBuf {
    home.join(".keyprompt").join("log").join("keyprompt.log")
}

pub fn init_file_logging(path: &Path, verbose: bool) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).with_context(|| format!("create {}", parent.display()))?;
    }
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("open log file {}", path.display()))?;

    let filter = build_env_filter(
        std::env::var(LOG_ENV_VAR).ok().as_deref(),
        std::env::var(EnvFilter::DEFAULT_ENV).ok().as_deref(),
        verbose,
    );

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .compact()
        .try_init()
        .map_err(|err| anyhow::anyhow!("install tracing subscriber: {err}"))
}

fn build_env_filter(project: Option<&str>, rust_log: Option<&str>, verbose: bool) -> EnvFilter {
    for directives in [project, rust_log].into_iter().flatten() {
        if let Ok(filter) = EnvFilter::try_new(directives) {
            return filter;
        }
    }
    EnvFilter::new(if verbose { "debug" } else { "warn" })
}
