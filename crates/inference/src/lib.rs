pub mod config;
pub mod errors;
pub mod logging;
pub mod workers;

// Re-export commonly used types for convenience
pub use config::InferenceConfig;
pub use errors::ConfigError;
pub use logging::{build_log_config, build_log_config_in};
pub use workers::{WorkerSpec, resolve_worker_count};
