use std::io;
use std::path::Path;

use anyhow::{Context, Result};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::fmt;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::prelude::*;
use tracing_subscriber::EnvFilter;

const STDERR_FILTER: &str = "info,dedup=info,cluster=info,config=warn";
const FILE_FILTER: &str = "info,dedup=debug,cluster=debug,config=info";

/// Installs the global subscriber: a compact stderr layer and a daily rolling
/// file under `log_dir`. `RUST_LOG`, when set, replaces both filters.
///
/// stdout is left alone because the CLI writes its JSON result there. Keep
/// the returned guard alive until exit so buffered file lines get flushed.
pub fn configure_logging(log_dir: &Path) -> Result<WorkerGuard> {
    let file_appender = daily_appender(log_dir)?;
    let (file_writer, guard) = tracing_appender::non_blocking(file_appender);

    let stderr_log = fmt::layer()
        .with_writer(io::stderr)
        .with_target(true)
        .with_filter(env_filter_or(STDERR_FILTER));
    let file_log = fmt::layer()
        .with_writer(file_writer)
        .with_ansi(false)
        .with_filter(env_filter_or(FILE_FILTER));

    tracing_subscriber::Registry::default()
        .with(stderr_log)
        .with(file_log)
        .try_init()
        .context("Failed to install the tracing subscriber")?;

    Ok(guard)
}

/// `herald.<date>.log` files under `log_dir`, created if missing.
fn daily_appender(log_dir: &Path) -> Result<RollingFileAppender> {
    RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .filename_prefix("herald")
        .filename_suffix("log")
        .build(log_dir)
        .with_context(|| format!("Failed to open log directory {}", log_dir.display()))
}

fn env_filter_or(default: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default))
}
