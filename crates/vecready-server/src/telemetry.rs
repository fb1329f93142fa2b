//! Process-wide log sink.
//!
//! A single [`LogSink`] owns the output handlers, the line formatter and the
//! severity threshold of the `tracing` subscriber. It is built once at
//! startup and re-configured in place; re-configuring detaches every output
//! handler before attaching the new one, so repeated calls never duplicate
//! log lines.

use std::fmt;
use std::io::{self, Write};
use std::str::FromStr;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::Utc;
use tracing::field::{Field, Visit};
use tracing::{Dispatch, Event, Level, Subscriber};
use tracing_subscriber::filter::{LevelFilter, Targets};
use tracing_subscriber::fmt::format::Writer;
use tracing_subscriber::fmt::{FmtContext, FormatEvent, FormatFields, MakeWriter};
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::{Registry, prelude::*, reload};

/// Timestamp layout of the text formatter.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Dependency namespaces whose chatter is capped at WARNING whatever the
/// requested level is.
pub const QUIET_TARGETS: &[&str] = &[
    "hyper",
    "hyper_util",
    "h2",
    "reqwest",
    "rustls",
    "tower",
    "tower_http",
    "axum",
    "qdrant_client",
];

/// Severity names accepted by [`LogSink::initialize`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Severity {
    Debug,
    #[default]
    Info,
    Warning,
    Error,
    Critical,
}

impl Severity {
    /// Parse a severity name, case-insensitively. `WARN` and `FATAL` are
    /// accepted as aliases.
    pub fn parse(name: &str) -> Option<Self> {
        match name.trim().to_ascii_uppercase().as_str() {
            "DEBUG" => Some(Severity::Debug),
            "INFO" => Some(Severity::Info),
            "WARNING" | "WARN" => Some(Severity::Warning),
            "ERROR" => Some(Severity::Error),
            "CRITICAL" | "FATAL" => Some(Severity::Critical),
            _ => None,
        }
    }

    /// Parse a severity name, falling back to INFO for anything unknown.
    pub fn parse_or_default(name: &str) -> Self {
        Self::parse(name).unwrap_or_default()
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Severity::Debug => "DEBUG",
            Severity::Info => "INFO",
            Severity::Warning => "WARNING",
            Severity::Error => "ERROR",
            Severity::Critical => "CRITICAL",
        }
    }

    /// `tracing` has no level above ERROR, so CRITICAL shares its filter.
    pub fn level_filter(self) -> LevelFilter {
        match self {
            Severity::Debug => LevelFilter::DEBUG,
            Severity::Info => LevelFilter::INFO,
            Severity::Warning => LevelFilter::WARN,
            Severity::Error | Severity::Critical => LevelFilter::ERROR,
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Line layout of the sink.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    /// `timestamp - logger_name - level - message`
    #[default]
    Text,
    /// One JSON object per event.
    Json,
}

impl LogFormat {
    /// Read `LOG_FORMAT`; anything other than `json` selects text.
    pub fn from_env() -> Self {
        std::env::var("LOG_FORMAT")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or_default()
    }
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "text" | "plain" => Ok(LogFormat::Text),
            "json" => Ok(LogFormat::Json),
            other => Err(format!("unknown log format {other:?}")),
        }
    }
}

/// Where an output handler writes.
pub enum LogOutput {
    Stdout,
    Stderr,
    Writer(Box<dyn Write + Send>),
}

impl LogOutput {
    fn into_writer(self) -> Box<dyn Write + Send> {
        match self {
            LogOutput::Stdout => Box::new(io::stdout()),
            LogOutput::Stderr => Box::new(io::stderr()),
            LogOutput::Writer(w) => w,
        }
    }
}

impl fmt::Debug for LogOutput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogOutput::Stdout => f.write_str("Stdout"),
            LogOutput::Stderr => f.write_str("Stderr"),
            LogOutput::Writer(_) => f.write_str("Writer(..)"),
        }
    }
}

/// The process-wide log sink.
pub struct LogSink {
    filter: reload::Handle<Targets, Registry>,
    outputs: SharedOutputs,
    severity: Mutex<Severity>,
}

impl LogSink {
    /// Build a sink and the subscriber it controls, without installing it.
    ///
    /// No output handler is attached yet; call [`LogSink::initialize`] or
    /// [`LogSink::reconfigure`] before expecting any output.
    pub fn new(format: LogFormat) -> (Self, Dispatch) {
        let severity = Severity::default();
        let (filter, handle) = reload::Layer::new(filter_for(severity));
        let outputs = SharedOutputs::default();

        let text = (format == LogFormat::Text).then(|| {
            tracing_subscriber::fmt::layer()
                .event_format(LineFormat)
                .with_writer(outputs.clone())
        });
        let json = (format == LogFormat::Json).then(|| {
            tracing_subscriber::fmt::layer()
                .json()
                .with_writer(outputs.clone())
        });

        let subscriber = tracing_subscriber::registry()
            .with(filter)
            .with(text)
            .with(json);

        let sink = Self {
            filter: handle,
            outputs,
            severity: Mutex::new(severity),
        };
        (sink, Dispatch::new(subscriber))
    }

    /// Build the sink, install it as the global subscriber and attach stdout
    /// at INFO.
    pub fn install(format: LogFormat) -> anyhow::Result<Self> {
        let (sink, dispatch) = Self::new(format);
        dispatch.try_init()?;
        sink.initialize(Severity::default().as_str());
        Ok(sink)
    }

    /// Set the threshold and attach stdout as the only output handler.
    ///
    /// Unknown level names fall back to INFO.
    pub fn initialize(&self, level: &str) {
        self.reconfigure(level, LogOutput::Stdout);
    }

    /// Older entry point kept for existing callers; same as [`LogSink::initialize`].
    pub fn setup_log(&self, level: &str) {
        self.initialize(level);
    }

    /// Detach every output handler, attach `output`, and apply `level`.
    pub fn reconfigure(&self, level: &str, output: LogOutput) {
        let severity = Severity::parse_or_default(level);

        {
            let mut outputs = self.outputs.lock();
            outputs.clear();
            outputs.push(output.into_writer());
        }

        // Fails only once the subscriber has been dropped, and then there is
        // nothing left to filter.
        let _ = self.filter.reload(filter_for(severity));

        *self.severity.lock().unwrap_or_else(PoisonError::into_inner) = severity;
    }

    /// Number of attached output handlers.
    pub fn handler_count(&self) -> usize {
        self.outputs.lock().len()
    }

    /// The active severity threshold.
    pub fn severity(&self) -> Severity {
        *self.severity.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl fmt::Debug for LogSink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LogSink")
            .field("severity", &self.severity())
            .field("handlers", &self.handler_count())
            .finish()
    }
}

fn filter_for(severity: Severity) -> Targets {
    QUIET_TARGETS.iter().fold(
        Targets::new().with_default(severity.level_filter()),
        |targets, target| targets.with_target(*target, LevelFilter::WARN),
    )
}

/// Output handlers shared between the sink and the fmt layers.
///
/// The fmt layer renders a whole event into one buffer before writing, so
/// each `write` call carries one complete line.
#[derive(Clone, Default)]
struct SharedOutputs(Arc<Mutex<Vec<Box<dyn Write + Send>>>>);

impl SharedOutputs {
    fn lock(&self) -> MutexGuard<'_, Vec<Box<dyn Write + Send>>> {
        self.0.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<'a> MakeWriter<'a> for SharedOutputs {
    type Writer = SharedOutputs;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

impl Write for SharedOutputs {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        for output in self.lock().iter_mut() {
            output.write_all(buf)?;
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        for output in self.lock().iter_mut() {
            output.flush()?;
        }
        Ok(())
    }
}

/// Text formatter: `timestamp - logger_name - level - message`.
///
/// The logger name is the event's `logger` field when present (set by
/// [`crate::logger::Logger`]) and the event target otherwise.
pub struct LineFormat;

impl<S, N> FormatEvent<S, N> for LineFormat
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
        let mut fields = LineFields::default();
        event.record(&mut fields);

        let meta = event.metadata();
        let name = fields.logger.as_deref().unwrap_or(meta.target());
        write!(
            writer,
            "{} - {} - {} - {}",
            Utc::now().format(TIMESTAMP_FORMAT),
            name,
            level_name(meta.level()),
            fields.message
        )?;
        for (key, value) in &fields.extra {
            write!(writer, " {key}={value}")?;
        }
        writeln!(writer)
    }
}

fn level_name(level: &Level) -> &'static str {
    match *level {
        Level::TRACE => "TRACE",
        Level::DEBUG => "DEBUG",
        Level::INFO => "INFO",
        Level::WARN => "WARNING",
        Level::ERROR => "ERROR",
    }
}

#[derive(Default)]
struct LineFields {
    logger: Option<String>,
    message: String,
    extra: Vec<(&'static str, String)>,
}

impl LineFields {
    fn put(&mut self, field: &Field, value: String) {
        match field.name() {
            "logger" => self.logger = Some(value),
            "message" => self.message = value,
            name => self.extra.push((name, value)),
        }
    }
}

impl Visit for LineFields {
    fn record_str(&mut self, field: &Field, value: &str) {
        self.put(field, value.to_string());
    }

    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        self.put(field, format!("{value:?}"));
    }
}
