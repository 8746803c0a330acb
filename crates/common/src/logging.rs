//! Declarative logging configuration and its installation as a `tracing` subscriber.
//!
//! A [`LoggingConfig`] is a tree of named formatters, named handlers (sinks bound
//! to a formatter) and named loggers (routing rules with a level). Logger names are
//! dotted namespaces; the root logger is the empty name.

use crate::errors::LoggingError;
use crate::filter::LoggerFilter;
use crate::pattern::PatternFormatter;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::{Layer, Registry, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Name of the root logger.
pub const ROOT_LOGGER: &str = "";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Formatter {
    pub pattern: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FileMode {
    Append,
    Truncate,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase", tag = "kind")]
pub enum Sink {
    Stdout,
    File { path: PathBuf, mode: FileMode },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Handler {
    pub formatter: String,
    pub sink: Sink,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Logger {
    pub handlers: Vec<String>,
    pub level: String,
    pub propagate: bool,
}

impl Logger {
    pub fn routes_to(&self, handler: &str) -> bool {
        self.handlers.iter().any(|h| h == handler)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LoggingConfig {
    pub disable_existing_loggers: bool,
    pub formatters: BTreeMap<String, Formatter>,
    pub handlers: BTreeMap<String, Handler>,
    pub loggers: BTreeMap<String, Logger>,
}

impl LoggingConfig {
    pub fn root(&self) -> Option<&Logger> {
        self.loggers.get(ROOT_LOGGER)
    }

    pub fn logger(&self, name: &str) -> Option<&Logger> {
        self.loggers.get(name)
    }

    /// Check that every handler names a known formatter and every logger names
    /// known handlers.
    pub fn validate(&self) -> Result<(), LoggingError> {
        for (name, handler) in &self.handlers {
            if !self.formatters.contains_key(&handler.formatter) {
                return Err(LoggingError::UnknownFormatter {
                    handler: name.clone(),
                    formatter: handler.formatter.clone(),
                });
            }
        }

        for (name, logger) in &self.loggers {
            if let Some(missing) = logger
                .handlers
                .iter()
                .find(|h| !self.handlers.contains_key(*h))
            {
                return Err(LoggingError::UnknownHandler {
                    logger: name.clone(),
                    handler: missing.clone(),
                });
            }
            parse_level(&logger.level)?;
        }

        Ok(())
    }

    /// Per-target filter deciding which events reach `handler`.
    ///
    /// A logger routed to the handler enables its target at its own level. A
    /// non-propagating logger that is not routed to the handler silences its
    /// target, so its events never fall through to an ancestor's entry.
    pub fn handler_filter(&self, handler: &str) -> Result<LoggerFilter, LoggingError> {
        let default = match self.root() {
            Some(root) if root.routes_to(handler) => parse_level(&root.level)?,
            _ => LevelFilter::OFF,
        };

        let mut filter = LoggerFilter::new(default);
        for (name, logger) in &self.loggers {
            if name == ROOT_LOGGER {
                continue;
            }

            let level = if logger.routes_to(handler) {
                parse_level(&logger.level)?
            } else if !logger.propagate {
                LevelFilter::OFF
            } else {
                continue;
            };

            filter = filter.with_target(target_for(name), level);
        }

        Ok(filter)
    }
}

/// Map a dotted logger name onto a `tracing` target.
pub fn target_for(logger: &str) -> String {
    logger.replace('.', "::")
}

/// Parse a level name. Accepts the usual aliases (`WARNING`, `CRITICAL`, `NOTSET`)
/// in any case.
pub fn parse_level(level: &str) -> Result<LevelFilter, LoggingError> {
    match level.trim().to_ascii_uppercase().as_str() {
        "TRACE" | "NOTSET" => Ok(LevelFilter::TRACE),
        "DEBUG" => Ok(LevelFilter::DEBUG),
        "INFO" => Ok(LevelFilter::INFO),
        "WARN" | "WARNING" => Ok(LevelFilter::WARN),
        "ERROR" | "CRITICAL" | "FATAL" => Ok(LevelFilter::ERROR),
        "OFF" => Ok(LevelFilter::OFF),
        _ => Err(LoggingError::UnknownLevel(level.to_string())),
    }
}

fn open_sink(path: &Path, mode: FileMode) -> Result<File, LoggingError> {
    let mut options = OpenOptions::new();
    options.create(true);
    match mode {
        FileMode::Append => options.append(true),
        FileMode::Truncate => options.write(true).truncate(true),
    };

    options.open(path).map_err(|source| LoggingError::OpenSink {
        path: path.to_path_buf(),
        source,
    })
}

/// Install `config` as the global subscriber: one formatting layer per handler,
/// each filtered by the loggers routed to it.
pub fn setup_logging(config: &LoggingConfig) -> Result<(), LoggingError> {
    config.validate()?;

    let mut layers: Vec<Box<dyn Layer<Registry> + Send + Sync>> =
        Vec::with_capacity(config.handlers.len());

    for (name, handler) in &config.handlers {
        let formatter = config
            .formatters
            .get(&handler.formatter)
            .ok_or_else(|| LoggingError::UnknownFormatter {
                handler: name.clone(),
                formatter: handler.formatter.clone(),
            })?;
        let event_format = PatternFormatter::new(&formatter.pattern);
        let filter = config.handler_filter(name)?;

        let layer = match &handler.sink {
            Sink::Stdout => fmt::layer()
                .with_ansi(false)
                .event_format(event_format)
                .with_writer(std::io::stdout)
                .with_filter(filter)
                .boxed(),
            Sink::File { path, mode } => {
                let file = open_sink(path, *mode)?;
                fmt::layer()
                    .with_ansi(false)
                    .event_format(event_format)
                    .with_writer(Mutex::new(file))
                    .with_filter(filter)
                    .boxed()
            }
        };
        layers.push(layer);
    }

    tracing_subscriber::registry().with(layers).try_init()?;

    Ok(())
}
