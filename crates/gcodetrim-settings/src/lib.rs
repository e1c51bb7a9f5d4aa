//! # gcodetrim-settings
//!
//! Loads, validates and saves optimizer settings. Files may be TOML or JSON;
//! the format is chosen by extension.

pub mod config;
pub mod error;

pub use config::{
    config_dir, default_config_path, OptimizerSettings, CONFIG_DIR_NAME, CONFIG_FILE_NAME,
};
pub use error::{SettingsError, SettingsResult};
