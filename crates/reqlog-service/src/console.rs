//! Console logger printing `timestamp [level]: message` lines.
//!
//! [`ConsoleLogger`] emits `tracing` events on the [`CONSOLE_TARGET`] target
//! carrying the caller's free-form level label. [`console_layer`] prints
//! those events with [`ConsoleFormat`] regardless of the main log format;
//! pair it with [`without_console_target`] on the main layer so each line is
//! printed once.

use std::fmt;

use chrono::{DateTime, SecondsFormat, Utc};
use tracing::field::{Field, Visit};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::Layer;
use tracing_subscriber::filter::{LevelFilter, Targets};
use tracing_subscriber::fmt::format::Writer;
use tracing_subscriber::fmt::{FmtContext, FormatEvent, FormatFields, MakeWriter};
use tracing_subscriber::registry::LookupSpan;

/// Target of every event emitted by [`ConsoleLogger`].
pub const CONSOLE_TARGET: &str = "reqlog::console";

/// Format one console line.
pub fn format_line(timestamp: DateTime<Utc>, level: &str, message: &str) -> String {
    format!(
        "{} [{}]: {}",
        timestamp.to_rfc3339_opts(SecondsFormat::Millis, true),
        level,
        message
    )
}

/// Map a free-form level label to the closest `tracing` level.
fn tracing_level(label: &str) -> Level {
    match label.to_ascii_lowercase().as_str() {
        "error" | "fatal" | "crit" | "critical" | "emerg" | "alert" => Level::ERROR,
        "warn" | "warning" => Level::WARN,
        "debug" | "verbose" => Level::DEBUG,
        "trace" | "silly" => Level::TRACE,
        _ => Level::INFO,
    }
}

/// Structured console logger.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConsoleLogger;

impl ConsoleLogger {
    /// Create a console logger.
    pub fn new() -> Self {
        Self
    }

    /// Log at `info`.
    pub fn info(&self, message: &str) {
        self.log("info", message);
    }

    /// Log at `error`.
    pub fn error(&self, message: &str) {
        self.log("error", message);
    }

    /// Log with an arbitrary level label.
    pub fn log(&self, level: &str, message: &str) {
        let mapped = tracing_level(level);
        if mapped == Level::ERROR {
            tracing::error!(target: CONSOLE_TARGET, label = level, "{message}");
        } else if mapped == Level::WARN {
            tracing::warn!(target: CONSOLE_TARGET, label = level, "{message}");
        } else if mapped == Level::DEBUG {
            tracing::debug!(target: CONSOLE_TARGET, label = level, "{message}");
        } else if mapped == Level::TRACE {
            tracing::trace!(target: CONSOLE_TARGET, label = level, "{message}");
        } else {
            tracing::info!(target: CONSOLE_TARGET, label = level, "{message}");
        }
    }
}

/// Event formatter producing `timestamp [level]: message` lines.
///
/// Uses the event's `label` field as the level when present, otherwise the
/// lowercase `tracing` level. Other fields follow the message as `key=value`.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConsoleFormat;

impl<S, N> FormatEvent<S, N> for ConsoleFormat
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        _ctx: &FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &Event<'_>,
    ) -> fmt::Result {
        let mut visitor = LineVisitor::default();
        event.record(&mut visitor);

        let level = visitor
            .label
            .take()
            .unwrap_or_else(|| event.metadata().level().as_str().to_ascii_lowercase());

        writeln!(
            writer,
            "{}",
            format_line(Utc::now(), &level, &visitor.render())
        )
    }
}

/// Layer printing [`ConsoleLogger`] events, and only those, as console lines.
pub fn console_layer<S, W>(make_writer: W) -> impl Layer<S>
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    tracing_subscriber::fmt::layer()
        .event_format(ConsoleFormat)
        .with_writer(make_writer)
        .with_filter(Targets::new().with_target(CONSOLE_TARGET, LevelFilter::TRACE))
}

/// Filter for the main log layer that leaves [`ConsoleLogger`] events to
/// [`console_layer`].
pub fn without_console_target() -> Targets {
    Targets::new()
        .with_default(LevelFilter::TRACE)
        .with_target(CONSOLE_TARGET, LevelFilter::OFF)
}

#[derive(Default)]
struct LineVisitor {
    message: String,
    label: Option<String>,
    fields: Vec<String>,
}

impl LineVisitor {
    fn render(&self) -> String {
        if self.fields.is_empty() {
            self.message.clone()
        } else {
            format!("{} {}", self.message, self.fields.join(" "))
        }
    }
}

impl Visit for LineVisitor {
    fn record_str(&mut self, field: &Field, value: &str) {
        match field.name() {
            "message" => self.message = value.to_string(),
            "label" => self.label = Some(value.to_string()),
            name => self.fields.push(format!("{name}={value}")),
        }
    }

    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        match field.name() {
            "message" => self.message = format!("{value:?}"),
            "label" => self.label = Some(format!("{value:?}")),
            name => self.fields.push(format!("{name}={value:?}")),
        }
    }
}
