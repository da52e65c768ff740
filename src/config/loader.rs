//! Configuration file loading.

use std::path::Path;

use super::{
    ConfigError,
    I18nSettings,
};

/// Name of the configuration file looked up by [`load_from_dir`].
pub const CONFIG_FILE_NAME: &str = ".i18n.json";

/// Loads settings from `.i18n.json` in `dir`.
///
/// # Returns
/// - `Ok(Some(settings))`: file found, parsed and valid
/// - `Ok(None)`: no configuration file in `dir`
///
/// # Errors
/// - File read error
/// - JSON parse error
/// - Validation failure
pub fn load_from_dir(dir: &Path) -> Result<Option<I18nSettings>, ConfigError> {
    let config_path = dir.join(CONFIG_FILE_NAME);

    if !config_path.exists() {
        tracing::debug!("Configuration file not found: {:?}", config_path);
        return Ok(None);
    }

    load_from_file(&config_path).map(Some)
}

/// Loads and validates settings from an explicit path.
///
/// # Errors
/// - File read error
/// - JSON parse error
/// - Validation failure
pub fn load_from_file(path: &Path) -> Result<I18nSettings, ConfigError> {
    tracing::debug!("Loading configuration from: {:?}", path);

    let content = std::fs::read_to_string(path)?;
    let settings: I18nSettings = serde_json::from_str(&content)?;
    settings.validate().map_err(ConfigError::ValidationErrors)?;

    Ok(settings)
}
