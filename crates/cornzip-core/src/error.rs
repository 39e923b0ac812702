//! Error types for option validation and configuration.

use thiserror::Error;

/// A violated option invariant.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OptionsError {
    /// The archive name is empty.
    #[error("Archive name cannot be empty")]
    EmptyArchiveName,

    /// The archive name contains a path separator.
    #[error("Archive name cannot contain '{separator}'")]
    ArchiveNameHasSeparator { separator: char },

    /// Compression level is above the maximum.
    #[error("Compression level {level} is out of range (0-9)")]
    LevelOutOfRange { level: u8 },

    /// Encryption was requested with an empty password.
    #[error("Password cannot be empty when encryption is enabled")]
    EmptyPassword,

    /// Split size is zero.
    #[error("Split size must be a positive integer")]
    NonPositiveSplitSize,

    /// A format string is empty.
    #[error("{field} format is required")]
    MissingFormat { field: &'static str },

    /// A format string names no known format.
    #[error("Unknown archive format: '{value}'")]
    UnknownFormat { value: String },

    /// The format cannot be produced by compression.
    #[error("Cannot create {format} archives")]
    NotWritable { format: String },
}

/// Errors loading pipeline configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The TOML document could not be parsed.
    #[error("Invalid configuration file: {0}")]
    Parse(#[from] toml::de::Error),

    /// A value is out of range.
    #[error("Invalid configuration: {message}")]
    Invalid { message: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_options_error_messages() {
        let err = OptionsError::ArchiveNameHasSeparator { separator: '/' };
        assert_eq!(err.to_string(), "Archive name cannot contain '/'");

        let err = OptionsError::MissingFormat { field: "Target" };
        assert_eq!(err.to_string(), "Target format is required");
    }
}
