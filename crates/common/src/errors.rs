use std::io;
use std::path::PathBuf;
use thiserror::Error;
use tracing_subscriber::util::TryInitError;

#[derive(Error, Debug)]
pub enum LoggingError {
    #[error("Unknown log level: {0}")]
    UnknownLevel(String),

    #[error("Handler `{handler}` references unknown formatter `{formatter}`")]
    UnknownFormatter { handler: String, formatter: String },

    #[error("Logger `{logger}` references unknown handler `{handler}`")]
    UnknownHandler { logger: String, handler: String },

    #[error("Failed to open log file {}: {source}", .path.display())]
    OpenSink {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to install subscriber: {0}")]
    Init(#[from] TryInitError),
}
