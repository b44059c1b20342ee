//! Application logging functionality
//!
//! Diagnostics go to stderr, and optionally to a dated file in
//! ~/.config/mfvec/logs/.

use crate::core::config::ConfigFile;
use std::fs;
use std::path::PathBuf;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Get the path to the logs directory
pub fn logs_dir() -> PathBuf {
    ConfigFile::config_dir().join("logs")
}

fn log_file_name() -> String {
    let timestamp = chrono::Local::now().format("%Y-%m-%d");
    format!("mfvec-{timestamp}.log")
}

/// Get the path to the current log file
pub fn current_log_file() -> PathBuf {
    logs_dir().join(log_file_name())
}

/// Filter used when RUST_LOG isn't set
fn default_directive(verbosity: u8) -> &'static str {
    match verbosity {
        0 => "mfvec=warn",
        1 => "mfvec=info",
        2 => "mfvec=debug",
        _ => "mfvec=trace",
    }
}

/// Install the global subscriber.
///
/// The returned guard flushes the log file when dropped, so the caller
/// keeps it alive for the whole run.
pub fn init(verbosity: u8, log_to_file: bool) -> anyhow::Result<Option<WorkerGuard>> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive(verbosity)));
    let stderr_layer = fmt::layer().with_writer(std::io::stderr).with_target(false);

    let (file_layer, guard) = if log_to_file {
        let dir = logs_dir();
        fs::create_dir_all(&dir)?;
        let appender = tracing_appender::rolling::never(&dir, log_file_name());
        let (writer, guard) = tracing_appender::non_blocking(appender);
        let layer = fmt::layer().with_writer(writer).with_ansi(false);
        (Some(layer), Some(guard))
    } else {
        (None, None)
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(stderr_layer)
        .with(file_layer)
        .try_init()?;

    if guard.is_some() {
        tracing::info!("logging to {:?}", current_log_file());
    }
    Ok(guard)
}
