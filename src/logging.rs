//! Console and file logging.
//!
//! Both sinks share one `EnvFilter`; `RUST_LOG` overrides the level picked on
//! the command line. The file sink goes through a non-blocking writer whose
//! guard lives in [`Logger`].

use crate::error::Error;
use std::fs::File;
use std::path::Path;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::fmt::layer;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

/// Keeps the file writer alive. Dropping it flushes pending log lines.
#[must_use = "Dropping this handle stops the background log writer."]
#[derive(Debug)]
pub struct Logger {
    guard: Option<WorkerGuard>,
}

/// Installs the global subscriber.
///
/// The log file is truncated on every run.
///
/// # Errors
/// Fails when the log file cannot be created or a global subscriber is
/// already installed.
pub fn init(level: LevelFilter, log_file: Option<&Path>) -> Result<Logger, Error> {
    let env_filter = EnvFilter::builder()
        .with_default_directive(level.into())
        .from_env_lossy();

    let mut layers = vec![
        layer()
            .with_writer(std::io::stderr)
            .with_target(false)
            .boxed(),
    ];

    let guard = match log_file {
        Some(path) => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent).map_err(|e| {
                    Error::Logging(format!("failed to create {}: {e}", parent.display()))
                })?;
            }
            let file = File::create(path)
                .map_err(|e| Error::Logging(format!("failed to create {}: {e}", path.display())))?;
            let (non_blocking, guard) = tracing_appender::non_blocking(file);
            layers.push(
                layer()
                    .with_writer(non_blocking)
                    .with_ansi(false)
                    .with_target(false)
                    .boxed(),
            );
            Some(guard)
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(layers)
        .try_init()
        .map_err(|e| Error::Logging(e.to_string()))?;

    Ok(Logger { guard })
}
