//! Configuration error types

use thiserror::Error;

use crate::features::filter::FilterParseError;

/// Configuration error type
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Missing version field in YAML
    #[error("Missing 'version' field in configuration file. Add 'version: 1' to the top of your YAML file.")]
    MissingVersion,

    /// Unsupported version
    #[error("Unsupported configuration version {found}. Supported versions: {}", supported.iter().map(|v| v.to_string()).collect::<Vec<_>>().join(", "))]
    UnsupportedVersion { found: u64, supported: Vec<u64> },

    /// Unknown converter name in a document map
    #[error("Unknown converter '{name}' in profile '{profile}'. Valid converters: {valid}")]
    UnknownConverter {
        profile: String,
        name: String,
        valid: String,
    },

    /// Filter query outside the supported dialect
    #[error("Invalid filter in profile '{profile}': {source}")]
    InvalidFilter {
        profile: String,
        #[source]
        source: FilterParseError,
    },

    /// Profile failed validation
    #[error("Invalid profile '{profile}': {reason}")]
    InvalidProfile { profile: String, reason: String },

    /// Lookup of a profile that is not registered
    #[error("Unknown profile '{name}'. Known profiles: {known}")]
    UnknownProfile { name: String, known: String },

    /// Same profile registered twice
    #[error("Profile '{0}' is already registered")]
    DuplicateProfile(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML parsing error
    #[error("YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

impl ConfigError {
    pub fn invalid_profile(profile: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidProfile {
            profile: profile.into(),
            reason: reason.into(),
        }
    }
}

/// Configuration result type
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;
