//! Optimizer settings
//!
//! Settings come from three layers, later ones winning: built-in defaults,
//! an optional config file (`.toml` or `.json`), then command-line flags.

use std::path::{Path, PathBuf};

use gcodetrim_core::ConfigError;
use gcodetrim_optimizer::{
    validate_allowance, CrossingStrategy, EngineConfig, MultiAxisStrategy, StrategyEngine,
    DEFAULT_PROGRESS_INTERVAL,
};
use serde::{Deserialize, Serialize};

use crate::error::{SettingsError, SettingsResult};

/// Directory name under the platform config directory
pub const CONFIG_DIR_NAME: &str = "gcodetrim";

/// Default config file name
pub const CONFIG_FILE_NAME: &str = "config.toml";

/// Config file format, chosen by extension
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Format {
    Json,
    Toml,
}

impl Format {
    fn of(path: &Path) -> Result<Self, ConfigError> {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => Ok(Self::Json),
            Some(ext) if ext.eq_ignore_ascii_case("toml") => Ok(Self::Toml),
            _ => Err(ConfigError::UnsupportedFormat(format!(
                "{} (config file must be .json or .toml)",
                path.display()
            ))),
        }
    }
}

/// Everything that configures one optimization run
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case", deny_unknown_fields)]
pub struct OptimizerSettings {
    /// Material left by the roughing pass
    pub allowance: f64,
    pub crossing_strategy: CrossingStrategy,
    pub multi_axis_strategy: MultiAxisStrategy,
    /// Lines between progress updates
    pub progress_interval: u64,
}

impl Default for OptimizerSettings {
    fn default() -> Self {
        Self {
            allowance: 0.0,
            crossing_strategy: CrossingStrategy::default(),
            multi_axis_strategy: MultiAxisStrategy::default(),
            progress_interval: DEFAULT_PROGRESS_INTERVAL,
        }
    }
}

impl OptimizerSettings {
    /// Create settings with defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Load settings from a `.toml` or `.json` file
    pub fn load_from_file(path: &Path) -> SettingsResult<Self> {
        let format = Format::of(path)?;
        let content = std::fs::read_to_string(path).map_err(|e| SettingsError::LoadError {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;

        let settings: Self = match format {
            Format::Json => serde_json::from_str(&content)?,
            Format::Toml => toml::from_str(&content)?,
        };

        settings.validate()?;
        tracing::debug!("Loaded settings from {}", path.display());
        Ok(settings)
    }

    /// Save settings to a `.toml` or `.json` file
    pub fn save_to_file(&self, path: &Path) -> SettingsResult<()> {
        self.validate()?;
        let format = Format::of(path)?;

        let content = match format {
            Format::Json => serde_json::to_string_pretty(self)?,
            Format::Toml => toml::to_string_pretty(self)?,
        };

        std::fs::write(path, content)
            .map_err(|e| SettingsError::SaveError(format!("{}: {}", path.display(), e)))?;
        Ok(())
    }

    /// Load the given file, else the default config file if it exists,
    /// else the defaults
    pub fn load_or_default(path: Option<&Path>) -> SettingsResult<Self> {
        if let Some(path) = path {
            return Self::load_from_file(path);
        }
        match default_config_path() {
            Some(path) if path.is_file() => Self::load_from_file(&path),
            _ => Ok(Self::default()),
        }
    }

    /// Check every value
    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_allowance(self.allowance)?;
        if self.progress_interval == 0 {
            return Err(ConfigError::InvalidSetting {
                key: "progress-interval".to_string(),
                reason: "must be greater than zero".to_string(),
            });
        }
        Ok(())
    }

    pub fn with_allowance(mut self, allowance: f64) -> Self {
        self.allowance = allowance;
        self
    }

    /// Apply command-line overrides; `None` keeps the current value
    pub fn with_overrides(
        mut self,
        crossing: Option<CrossingStrategy>,
        multi_axis: Option<MultiAxisStrategy>,
    ) -> Self {
        if let Some(crossing) = crossing {
            self.crossing_strategy = crossing;
        }
        if let Some(multi_axis) = multi_axis {
            self.multi_axis_strategy = multi_axis;
        }
        self
    }

    /// Engine configuration for these settings
    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig {
            allowance: self.allowance,
            strategy: StrategyEngine::new(self.crossing_strategy, self.multi_axis_strategy),
            progress_interval: self.progress_interval,
        }
    }
}

/// Platform config directory for gcodetrim
pub fn config_dir() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join(CONFIG_DIR_NAME))
}

/// Default config file location, e.g. `~/.config/gcodetrim/config.toml`
pub fn default_config_path() -> Option<PathBuf> {
    config_dir().map(|dir| dir.join(CONFIG_FILE_NAME))
}
