//! Subscriber setup: an append-only `system.log` plus console echo of storage failures.

use std::{
    fmt,
    fs::{self, File, OpenOptions},
    path::Path,
    sync::Mutex,
};

use anyhow::{Context, Result};
use chrono::Local;
use tracing::{Event, Level, Subscriber};
use fleetrent_core::storage::PERSISTENCE_TARGET;
use tracing_subscriber::{
    filter::Targets,
    fmt::{format::Writer, FmtContext, FormatEvent, FormatFields, MakeWriter},
    prelude::*,
    registry::LookupSpan,
    EnvFilter, Layer,
};

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Renders events as `[timestamp] LABEL: message`.
#[derive(Debug, Clone, Copy)]
pub struct SystemLogFormat {
    timestamps: bool,
}

impl SystemLogFormat {
    pub fn timestamped() -> Self {
        Self { timestamps: true }
    }

    pub fn bare() -> Self {
        Self { timestamps: false }
    }
}

fn label(level: Level) -> &'static str {
    match level {
        Level::ERROR => "ERROR",
        Level::WARN => "WARNING",
        Level::INFO => "ACTION",
        Level::DEBUG => "DEBUG",
        Level::TRACE => "TRACE",
    }
}

impl<S, N> FormatEvent<S, N> for SystemLogFormat
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        ctx: &FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &Event<'_>,
    ) -> fmt::Result {
        if self.timestamps {
            write!(writer, "[{}] ", Local::now().format(TIMESTAMP_FORMAT))?;
        }
        write!(writer, "{}: ", label(*event.metadata().level()))?;
        ctx.field_format().format_fields(writer.by_ref(), event)?;
        writeln!(writer)
    }
}

fn open_log(log_path: &Path) -> Result<File> {
    if let Some(parent) = log_path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create log directory {}", parent.display()))?;
    }
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_path)
        .with_context(|| format!("failed to open log file {}", log_path.display()))
}

fn file_layer<S>(file: File, filter: EnvFilter) -> impl Layer<S>
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    tracing_subscriber::fmt::layer()
        .event_format(SystemLogFormat::timestamped())
        .with_ansi(false)
        .with_writer(Mutex::new(file))
        .with_filter(filter)
}

/// Menus already print domain errors, so only storage failures are echoed.
fn console_layer<S, W>(writer: W) -> impl Layer<S>
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    tracing_subscriber::fmt::layer()
        .event_format(SystemLogFormat::bare())
        .with_ansi(false)
        .with_writer(writer)
        .with_filter(Targets::new().with_target(PERSISTENCE_TARGET, Level::ERROR))
}

/// Install the global subscriber. `RUST_LOG` tunes the file level (default `info`).
pub fn init_logging(log_path: &Path) -> Result<()> {
    let file = open_log(log_path)?;
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(file_layer(file, env_filter))
        .with(console_layer(std::io::stdout))
        .try_init()
        .context("failed to install tracing subscriber")?;

    Ok(())
}
