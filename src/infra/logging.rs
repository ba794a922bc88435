// ============================================================
// Layer 6 — Logging Setup
// ============================================================
// Every line goes to two places:
//   - stdout, for the person watching the run
//   - <outf>/<file_name>, plain text without colour codes
//
// The file writer is non-blocking; the returned guard flushes
// it on drop, so main must hold it until the process exits.
//
// tracing_appender::rolling::never panics if it cannot create
// its file, so the file is opened once up front and a failure
// becomes an ordinary error.

use anyhow::{Context, Result};
use std::{
    fs,
    path::{Path, PathBuf},
};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const DEFAULT_FILTER: &str = "warn,cifar_trainer=info";

pub fn init(dir: &Path, file_name: &str) -> Result<WorkerGuard> {
    let log_path = ensure_log_file(dir, file_name)?;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    let file_appender = tracing_appender::rolling::never(dir, file_name);
    let (file_writer, guard) = tracing_appender::non_blocking(file_appender);

    let console_layer = tracing_subscriber::fmt::layer()
        .with_target(false);

    let file_layer = tracing_subscriber::fmt::layer()
        .with_writer(file_writer)
        .with_ansi(false)
        .with_target(false);

    tracing_subscriber::registry()
        .with(filter)
        .with(console_layer)
        .with(file_layer)
        .try_init()
        .context("A global tracing subscriber is already installed")?;

    tracing::info!("Logging to '{}'", log_path.display());
    Ok(guard)
}

/// Create `dir` and check that `file_name` can be appended to.
fn ensure_log_file(dir: &Path, file_name: &str) -> Result<PathBuf> {
    fs::create_dir_all(dir)
        .with_context(|| format!("Cannot create output directory '{}'", dir.display()))?;

    let path = dir.join(file_name);
    fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .with_context(|| format!("Cannot open log file '{}'", path.display()))?;
    Ok(path)
}
