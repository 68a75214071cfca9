// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Log configuration: verbose-level filtering, optional file tee, runtime
//! verbosity raise, and the startup buffer replayed once the subscriber is
//! installed.

use std::path::Path;

use parking_lot::Mutex;
use thiserror::Error;
use tracing::info;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{reload, EnvFilter, Layer, Registry};

use lookout_core::Config;

#[derive(Debug, Error)]
pub enum LoggingError {
    #[error("invalid log filter: {0}")]
    Filter(String),

    #[error("cannot install log subscriber: {0}")]
    Init(String),
}

/// Records emitted before the subscriber exists; replayed right after.
#[derive(Default)]
pub struct StartupBuffer {
    lines: Mutex<Vec<String>>,
}

impl StartupBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, line: impl Into<String>) {
        self.lines.lock().push(line.into());
    }

    /// Emit every buffered line through the installed subscriber.
    pub fn replay(&self) {
        for line in self.lines.lock().drain(..) {
            info!(target: "startup", "{line}");
        }
    }
}

/// Keeps the file writer flushing and the filter reloadable.
pub struct LogControl {
    reload: reload::Handle<EnvFilter, Registry>,
    _file_guard: Option<tracing_appender::non_blocking::WorkerGuard>,
}

impl LogControl {
    /// Runtime verbosity raise, wired to the `EnableVerboseLogging`
    /// control message.
    pub fn raise_verbosity(&self) {
        if let Ok(filter) = EnvFilter::try_new("debug") {
            // Fails only when the subscriber is already torn down.
            let _ = self.reload.reload(filter);
        }
    }
}

fn filter_directive(verbose: u8) -> &'static str {
    match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    }
}

/// Install the global subscriber per configuration: stdout always, teeing
/// to `log_file` when set, text or JSON per `log_format`.
pub fn init(config: &Config) -> Result<LogControl, LoggingError> {
    let filter = EnvFilter::try_new(filter_directive(config.verbose))
        .map_err(|e| LoggingError::Filter(e.to_string()))?;
    let (filter, reload_handle) = reload::Layer::new(filter);

    let mut layers: Vec<BoxedLayer> = Vec::new();
    layers.push(filter.boxed());
    layers.push(stdout_layer(&config.log_format));

    let mut file_guard = None;
    if let Some(path) = &config.log_file {
        let (layer, guard) = file_layer(path, &config.log_format);
        layers.push(layer);
        file_guard = Some(guard);
    }

    tracing_subscriber::registry()
        .with(layers)
        .try_init()
        .map_err(|e| LoggingError::Init(e.to_string()))?;

    Ok(LogControl { reload: reload_handle, _file_guard: file_guard })
}

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync>;

fn stdout_layer(format: &str) -> BoxedLayer {
    if format == "json" {
        tracing_subscriber::fmt::layer().json().boxed()
    } else {
        tracing_subscriber::fmt::layer().boxed()
    }
}

fn file_layer(
    path: &Path,
    format: &str,
) -> (BoxedLayer, tracing_appender::non_blocking::WorkerGuard) {
    let directory = path.parent().unwrap_or_else(|| Path::new("."));
    let file_name = path.file_name().unwrap_or_else(|| std::ffi::OsStr::new("lookout.log"));
    let appender = tracing_appender::rolling::never(directory, file_name);
    let (writer, guard) = tracing_appender::non_blocking(appender);
    let layer = if format == "json" {
        tracing_subscriber::fmt::layer()
            .json()
            .with_ansi(false)
            .with_writer(writer)
            .boxed()
    } else {
        tracing_subscriber::fmt::layer().with_ansi(false).with_writer(writer).boxed()
    };
    (layer, guard)
}

#[cfg(test)]
#[path = "logging_tests.rs"]
mod tests;
