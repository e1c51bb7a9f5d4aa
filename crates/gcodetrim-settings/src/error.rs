//! Error types for the settings crate.

use std::io;

use gcodetrim_core::ConfigError;
use thiserror::Error;

/// Errors that can occur while loading, saving or validating settings.
#[derive(Error, Debug)]
pub enum SettingsError {
    /// The configuration file could not be loaded.
    #[error("Failed to load settings from {path}: {reason}")]
    LoadError { path: String, reason: String },

    /// The configuration file could not be saved.
    #[error("Failed to save settings: {0}")]
    SaveError(String),

    /// I/O error during file operations.
    #[error("I/O error: {0}")]
    IoError(#[from] io::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// TOML deserialization error.
    #[error("TOML error: {0}")]
    TomlError(#[from] toml::de::Error),

    /// TOML serialization error.
    #[error("TOML error: {0}")]
    TomlSerError(#[from] toml::ser::Error),

    /// A setting failed validation.
    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl SettingsError {
    /// Whether the error is a validation problem rather than an I/O one
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Config(_))
    }

    /// Whether the settings file itself is unreadable or invalid
    ///
    /// Save failures and other I/O are runtime problems, not bad input.
    pub fn is_bad_input(&self) -> bool {
        matches!(
            self,
            Self::LoadError { .. } | Self::JsonError(_) | Self::TomlError(_) | Self::Config(_)
        )
    }
}

/// Result type alias for settings operations.
pub type SettingsResult<T> = Result<T, SettingsError>;
