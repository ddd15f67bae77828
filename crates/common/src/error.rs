//! Configuration error types for the BugLens upload client

/// Errors raised while loading configuration or wiring up services.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("configuration error: {0}")]
    Invalid(String),

    #[error("unknown upload provider: {0}. Supported providers: http, mock")]
    UnknownProvider(String),
}
