//! Bundle transport.

use async_trait::async_trait;

use crate::error::I18nError;
use crate::tree::TranslationTree;

/// A raw response from a [`BundleFetcher`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchResponse {
    pub status: u16,
    pub status_text: String,
    pub body: String,
}

impl FetchResponse {
    /// 2xx status.
    #[must_use]
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Parses a successful response into a translation tree.
    ///
    /// # Errors
    /// - [`I18nError::Network`] for a non-success status
    /// - [`I18nError::Parse`] / [`I18nError::InvalidBundle`] for a body that
    ///   is not a JSON object
    pub fn into_tree(self) -> Result<TranslationTree, I18nError> {
        if !self.is_success() {
            return Err(I18nError::Network { status: self.status, status_text: self.status_text });
        }
        TranslationTree::from_json_str(&self.body)
    }
}

/// Issues a GET for a bundle URL.
///
/// Timeouts and retries are the implementation's concern; the engine applies
/// neither.
#[async_trait]
pub trait BundleFetcher: Send + Sync + std::fmt::Debug {
    async fn fetch(&self, url: &str) -> Result<FetchResponse, I18nError>;
}

/// [`BundleFetcher`] over `reqwest`.
#[derive(Debug, Clone, Default)]
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Uses a preconfigured client (timeouts, proxies, headers).
    #[must_use]
    pub const fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl BundleFetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<FetchResponse, I18nError> {
        tracing::debug!(url, "Fetching translation bundle");

        let response = self.client.get(url).send().await?;
        let status = response.status();
        let body = response.text().await?;

        Ok(FetchResponse {
            status: status.as_u16(),
            status_text: status.canonical_reason().unwrap_or_default().to_string(),
            body,
        })
    }
}
