//! Error types for profile configuration operations.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Primary error type for profile configuration operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Reading or writing the profile file failed.
    #[error("failed to access profile file {}", path.display())]
    Io {
        /// Path of the file that could not be accessed.
        path: PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: io::Error,
    },
    /// The profile file was not valid TOML.
    #[error("malformed profile file {}", path.display())]
    Parse {
        /// Path of the file that failed to parse.
        path: PathBuf,
        /// Underlying TOML parse failure.
        #[source]
        source: toml::de::Error,
    },
    /// Encoding the in-memory configuration back to TOML failed.
    #[error("failed to encode profile file")]
    Encode {
        /// Underlying TOML serialisation failure.
        #[source]
        source: toml::ser::Error,
    },
    /// The requested profile does not exist in the file.
    #[error("unknown profile '{name}'")]
    UnknownProfile {
        /// Name of the missing profile.
        name: String,
    },
    /// A profile carried a server address that is not a valid URL.
    #[error("invalid server address '{value}'")]
    InvalidAddress {
        /// Offending address value.
        value: String,
        /// Underlying URL parse failure.
        #[source]
        source: url::ParseError,
    },
    /// The platform user configuration directory could not be determined.
    #[error("could not determine the user configuration directory")]
    NoConfigDir,
}

/// Convenience alias for results carrying a [`ConfigError`].
pub type ConfigResult<T> = Result<T, ConfigError>;

impl ConfigError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
