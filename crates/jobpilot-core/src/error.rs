//! Central error types for JobPilot.

use thiserror::Error;

/// Configuration-specific errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Config directory could not be determined from the platform.
    #[error("could not determine config directory")]
    NoConfigDir,

    /// Reading or writing the config file failed.
    #[error("config I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The config file contents are not valid TOML.
    #[error("config parse error: {0}")]
    Parse(#[from] toml::de::Error),

    /// Serializing the config to TOML failed.
    #[error("config serialize error: {0}")]
    Serialize(#[from] toml::ser::Error),

    /// A config field holds an unusable value.
    #[error("invalid value for {field}: {reason}")]
    InvalidValue {
        /// Name of the offending field.
        field: String,
        /// Why the value was rejected.
        reason: String,
    },
}

/// Result type alias for configuration operations.
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;
