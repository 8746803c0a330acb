//! Logging layout for the inference server.
//!
//! Routing table:
//!
//! | logger           | handlers        | level         | propagate |
//! |------------------|-----------------|---------------|-----------|
//! | root             | default, file   | caller's      | -         |
//! | `uvicorn`        | uvicorn         | INFO          | no        |
//! | `uvicorn.error`  | uvicorn         | INFO          | no        |
//! | `uvicorn.access` | uvicorn         | INFO          | no        |
//! | `docling`        | default, file   | INFO          | no        |
//!
//! Only the root level follows the requested level. The server and application
//! loggers stay at INFO whatever the caller asks for.

use crate::config::InferenceConfig;
use crate::errors::ConfigError;
use common::{FileMode, Formatter, Handler, Logger, LoggingConfig, ROOT_LOGGER, Sink};
use std::collections::BTreeMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

/// Log file location, relative to the working directory.
pub const LOG_FILE: &str = "logs/docling-inference.log";

pub const LINE_PATTERN: &str = "{time} - {name} - {level} - {message}";

pub const SERVER_LOGGERS: [&str; 3] = ["uvicorn", "uvicorn.error", "uvicorn.access"];
pub const APP_LOGGER: &str = "docling";

const FIXED_LEVEL: &str = "INFO";

/// Build the logging configuration rooted at the current working directory.
pub fn build_log_config(log_level: &str) -> Result<LoggingConfig, ConfigError> {
    let cwd = env::current_dir().map_err(ConfigError::WorkingDirectory)?;
    build_log_config_in(&cwd, log_level)
}

/// Build the logging configuration with the log file under `base`, creating the
/// log directory if needed.
pub fn build_log_config_in(base: &Path, log_level: &str) -> Result<LoggingConfig, ConfigError> {
    let log_file = base.join(LOG_FILE);
    ensure_parent_dir(&log_file)?;

    let formatters = BTreeMap::from([
        ("default".to_string(), line_formatter()),
        ("uvicorn".to_string(), line_formatter()),
    ]);

    let handlers = BTreeMap::from([
        ("default".to_string(), handler("default", Sink::Stdout)),
        (
            "file".to_string(),
            handler(
                "default",
                Sink::File {
                    path: log_file,
                    mode: FileMode::Append,
                },
            ),
        ),
        ("uvicorn".to_string(), handler("uvicorn", Sink::Stdout)),
    ]);

    let mut loggers = BTreeMap::new();
    loggers.insert(
        ROOT_LOGGER.to_string(),
        Logger {
            handlers: names(&["default", "file"]),
            level: log_level.to_string(),
            propagate: true,
        },
    );
    for name in SERVER_LOGGERS {
        loggers.insert(name.to_string(), isolated(&["uvicorn"]));
    }
    loggers.insert(APP_LOGGER.to_string(), isolated(&["default", "file"]));

    Ok(LoggingConfig {
        disable_existing_loggers: false,
        formatters,
        handlers,
        loggers,
    })
}

/// Build the logging configuration and install it as the global subscriber.
pub fn setup_logging(config: &InferenceConfig) -> Result<LoggingConfig, ConfigError> {
    let log_config = build_log_config(&config.log_level)?;
    common::setup_logging(&log_config)?;
    Ok(log_config)
}

fn ensure_parent_dir(path: &Path) -> Result<(), ConfigError> {
    let Some(dir) = path.parent() else {
        return Ok(());
    };

    fs::create_dir_all(dir).map_err(|source| ConfigError::LogDirectory {
        path: PathBuf::from(dir),
        source,
    })
}

fn line_formatter() -> Formatter {
    Formatter {
        pattern: LINE_PATTERN.to_string(),
    }
}

fn handler(formatter: &str, sink: Sink) -> Handler {
    Handler {
        formatter: formatter.to_string(),
        sink,
    }
}

fn names(handlers: &[&str]) -> Vec<String> {
    handlers.iter().map(|h| h.to_string()).collect()
}

fn isolated(handlers: &[&str]) -> Logger {
    Logger {
        handlers: names(handlers),
        level: FIXED_LEVEL.to_string(),
        propagate: false,
    }
}
