//! Tracing setup: stdout plus a per-run log file under logs/.

use std::path::Path;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::prelude::*;

/// Initialize logging. The returned guard must be held for the lifetime of
/// the process or buffered file output is lost.
pub fn init(config_path: &Path, debug: bool) -> WorkerGuard {
    let level = if debug {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };

    // One log file per run, named after the config so parallel bots with
    // different configs don't interleave.
    let stem = config_path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "scout".to_string());
    let now = chrono::Local::now().format("%Y-%m-%d_%H-%M-%S");

    std::fs::create_dir_all("logs").ok();
    let log_file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(format!("logs/scout-{stem}_{now}.log"))
        .expect("Failed to open log file");
    let (non_blocking, guard) = tracing_appender::non_blocking(log_file);

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stdout)
                .with_filter(
                    tracing_subscriber::EnvFilter::from_default_env()
                        .add_directive(level.into()),
                ),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(non_blocking)
                .with_ansi(false)
                .with_filter(
                    tracing_subscriber::EnvFilter::from_default_env()
                        .add_directive(level.into()),
                ),
        )
        .init();

    guard
}
