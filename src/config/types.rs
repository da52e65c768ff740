use std::collections::HashMap;
use std::path::PathBuf;

use serde::{
    Deserialize,
    Serialize,
};
use thiserror::Error;

use crate::cache::StorageKind;
use crate::tree::TranslationTree;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Configuration error in '{field_path}': {message}")]
pub struct ValidationError {
    /// JSON path to the field (e.g., "locales[0]")
    pub field_path: String,
    pub message: String,
}

impl ValidationError {
    #[must_use]
    pub fn new(field_path: impl Into<String>, message: impl Into<String>) -> Self {
        Self { field_path: field_path.into(), message: message.into() }
    }
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Configuration validation failed:\n{}", format_validation_errors(.0))]
    ValidationErrors(Vec<ValidationError>),

    #[error("Failed to load configuration file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Failed to parse configuration: {0}")]
    ParseError(#[from] serde_json::Error),
}

fn format_validation_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .enumerate()
        .map(|(i, err)| format!("  {}. {} - {}", i + 1, err.field_path, err.message))
        .collect::<Vec<_>>()
        .join("\n")
}

/// What `translate` returns when a key resolves in neither the current nor
/// the default locale.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FallbackBehavior {
    /// The key itself.
    #[default]
    Key,
    /// An empty string.
    Empty,
    /// Retry the default locale, then the key.
    Default,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct I18nSettings {
    pub default_locale: String,
    /// Registered locales, in order. Duplicates are ignored.
    pub locales: Vec<String>,
    /// Initial translation data per locale.
    pub translations: HashMap<String, TranslationTree>,
    pub date_format: DateFormat,
    pub number_format: NumberFormat,
    pub fallback_behavior: FallbackBehavior,
    /// HTML-escape interpolated values.
    pub escape_html: bool,
    pub enable_cache: bool,
    pub cache_max_size: usize,
    /// Pick the initial locale from the environment.
    pub auto_detect: bool,
    pub persistent_cache: PersistentCacheConfig,
}

/// Patterns built from the tokens `YYYY MM DD HH mm ss`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DateFormat {
    pub date: String,
    pub time: String,
    pub datetime: String,
}

impl Default for DateFormat {
    fn default() -> Self {
        Self {
            date: "YYYY-MM-DD".to_string(),
            time: "HH:mm:ss".to_string(),
            datetime: "YYYY-MM-DD HH:mm:ss".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NumberFormat {
    /// Digits after the decimal separator.
    pub decimals: usize,
    pub thousands_separator: String,
    pub decimal_separator: String,
}

impl Default for NumberFormat {
    fn default() -> Self {
        Self {
            decimals: 2,
            thousands_separator: ",".to_string(),
            decimal_separator: ".".to_string(),
        }
    }
}

/// Durable bundle cache settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PersistentCacheConfig {
    pub enabled: bool,
    pub storage: StorageKind,
    /// Key prefix shared by every entry this cache writes.
    pub prefix: String,
    pub max_entries: usize,
    /// Entry lifetime in milliseconds.
    pub ttl: u64,
    /// Directory for `localStorage`. Defaults to the user cache directory.
    pub directory: Option<PathBuf>,
}

impl Default for PersistentCacheConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            storage: StorageKind::Local,
            prefix: "i18n_cache_".to_string(),
            max_entries: 10,
            ttl: 24 * 60 * 60 * 1000,
            directory: None,
        }
    }
}

/// Upper bound for `numberFormat.decimals`; `f64` carries no more.
const MAX_DECIMALS: usize = 17;

impl I18nSettings {
    /// # Errors
    /// - Required field is empty
    /// - Cache enabled with zero capacity
    /// - Decimal count out of range
    pub fn validate(&self) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();

        if self.default_locale.is_empty() {
            errors.push(ValidationError::new(
                "defaultLocale",
                "The locale cannot be empty. Example: \"zh-CN\"",
            ));
        }

        for (index, locale) in self.locales.iter().enumerate() {
            if locale.is_empty() {
                errors.push(ValidationError::new(
                    format!("locales[{index}]"),
                    "The locale cannot be empty",
                ));
            }
        }

        if self.enable_cache && self.cache_max_size == 0 {
            errors.push(ValidationError::new(
                "cacheMaxSize",
                "Must be at least 1 while enableCache is true. Set enableCache to false instead",
            ));
        }

        if self.number_format.decimals > MAX_DECIMALS {
            errors.push(ValidationError::new(
                "numberFormat.decimals",
                format!("At most {MAX_DECIMALS} decimals are supported"),
            ));
        }

        if self.number_format.decimal_separator.is_empty() {
            errors.push(ValidationError::new(
                "numberFormat.decimalSeparator",
                "The separator cannot be empty. Example: \".\"",
            ));
        }

        for (field, pattern) in [
            ("dateFormat.date", &self.date_format.date),
            ("dateFormat.time", &self.date_format.time),
            ("dateFormat.datetime", &self.date_format.datetime),
        ] {
            if pattern.is_empty() {
                errors.push(ValidationError::new(
                    field,
                    "The pattern cannot be empty. Example: \"YYYY-MM-DD\"",
                ));
            }
        }

        let persistent = &self.persistent_cache;
        if persistent.enabled {
            if persistent.prefix.is_empty() {
                errors.push(ValidationError::new(
                    "persistentCache.prefix",
                    "The prefix cannot be empty while the persistent cache is enabled",
                ));
            }
            if persistent.max_entries == 0 {
                errors.push(ValidationError::new(
                    "persistentCache.maxEntries",
                    "Must be at least 1 while the persistent cache is enabled",
                ));
            }
        }

        if errors.is_empty() { Ok(()) } else { Err(errors) }
    }
}

impl Default for I18nSettings {
    fn default() -> Self {
        Self {
            default_locale: "zh-CN".to_string(),
            locales: vec!["zh-CN".to_string(), "en-US".to_string()],
            translations: HashMap::new(),
            date_format: DateFormat::default(),
            number_format: NumberFormat::default(),
            fallback_behavior: FallbackBehavior::Key,
            escape_html: false,
            enable_cache: true,
            cache_max_size: 1000,
            auto_detect: false,
            persistent_cache: PersistentCacheConfig::default(),
        }
    }
}
