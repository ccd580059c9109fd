use thiserror::Error;

/// Startup-time configuration failures. These are the only errors in
/// the system that abort the process.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingVar(String),
}
