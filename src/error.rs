//! Error types shared across the crate.

use thiserror::Error;

/// Errors surfaced by bundle loading.
///
/// Resolution misses, unsupported locales and storage failures are not
/// represented here: they degrade to fallback strings, `false` returns, or
/// silent loss of persistence.
#[derive(Error, Debug)]
pub enum I18nError {
    /// The server answered with a non-success status.
    #[error("Failed to fetch translations: {status} {status_text}")]
    Network { status: u16, status_text: String },

    /// The request never produced a response.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The response body was not valid JSON.
    #[error("Failed to parse translation bundle: {0}")]
    Parse(#[from] serde_json::Error),

    /// The response body was valid JSON but not an object.
    #[error("Translation bundle must be a JSON object, found {0}")]
    InvalidBundle(&'static str),
}

/// Errors raised by a [`KeyValueStorage`](crate::cache::KeyValueStorage) backend.
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Storage I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("Storage quota exceeded: {needed} bytes needed, {limit} bytes allowed")]
    QuotaExceeded { needed: usize, limit: usize },
}
