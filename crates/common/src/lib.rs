pub mod errors;
pub mod filter;
pub mod logging;
pub mod pattern;

pub use errors::LoggingError;
pub use filter::LoggerFilter;
pub use logging::{
    FileMode, Formatter, Handler, Logger, LoggingConfig, ROOT_LOGGER, Sink, parse_level,
    setup_logging,
};
pub use pattern::PatternFormatter;
