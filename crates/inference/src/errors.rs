use common::LoggingError;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid configuration: {0}")]
    Load(#[from] config::ConfigError),

    #[error("Invalid configuration: value of {field} is not valid UTF-8")]
    NonUnicode { field: &'static str },

    #[error("Failed to create log directory {}: {source}", .path.display())]
    LogDirectory {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to resolve working directory: {0}")]
    WorkingDirectory(#[source] io::Error),

    #[error("Logging setup failed: {0}")]
    Logging(#[from] LoggingError),
}
