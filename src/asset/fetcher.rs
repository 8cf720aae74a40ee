//! Network transport for icon source documents

use std::time::Duration;

use async_trait::async_trait;
use url::Url;

use crate::config::PipelineConfig;

use super::types::AssetError;

/// Resolve an icon identifier to an absolute URI
pub fn resolve_uri(source: &str) -> Result<Url, AssetError> {
    Url::parse(source.trim()).map_err(|e| AssetError::InvalidUri {
        uri: source.to_string(),
        reason: e.to_string(),
    })
}

/// Fetches the raw bytes of a source document.
///
/// Timeouts and retries belong to the implementation's transport.
#[async_trait]
pub trait AssetFetcher: Send + Sync {
    async fn fetch(&self, uri: &Url) -> Result<Vec<u8>, AssetError>;
}

/// HTTP(S) fetcher backed by reqwest
pub struct HttpFetcher {
    client: reqwest::Client,
    max_bytes: usize,
}

impl HttpFetcher {
    /// Create a fetcher using the transport settings from configuration
    pub fn new(settings: &PipelineConfig) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(settings.http_timeout_secs))
            .user_agent(settings.user_agent.clone())
            .build()?;
        Ok(Self::with_client(client, settings.max_fetch_bytes))
    }

    /// Create a fetcher around an existing client
    pub fn with_client(client: reqwest::Client, max_bytes: usize) -> Self {
        Self { client, max_bytes }
    }

    fn error(uri: &Url, reason: impl Into<String>) -> AssetError {
        AssetError::Fetch {
            uri: uri.to_string(),
            reason: reason.into(),
        }
    }
}

#[async_trait]
impl AssetFetcher for HttpFetcher {
    async fn fetch(&self, uri: &Url) -> Result<Vec<u8>, AssetError> {
        if !matches!(uri.scheme(), "http" | "https") {
            return Err(Self::error(
                uri,
                format!("unsupported scheme '{}'", uri.scheme()),
            ));
        }

        let mut response = self
            .client
            .get(uri.clone())
            .send()
            .await
            .map_err(|e| Self::error(uri, e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(Self::error(uri, format!("HTTP status {}", status)));
        }

        if let Some(length) = response.content_length() {
            if length > self.max_bytes as u64 {
                return Err(Self::error(
                    uri,
                    format!("body of {} bytes exceeds limit of {}", length, self.max_bytes),
                ));
            }
        }

        let mut body = Vec::new();
        while let Some(chunk) = response
            .chunk()
            .await
            .map_err(|e| Self::error(uri, e.to_string()))?
        {
            if body.len() + chunk.len() > self.max_bytes {
                return Err(Self::error(
                    uri,
                    format!("body exceeds limit of {} bytes", self.max_bytes),
                ));
            }
            body.extend_from_slice(&chunk);
        }

        tracing::debug!(uri = %uri, bytes = body.len(), "Fetched icon source");
        Ok(body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_uri() {
        let uri = resolve_uri(" https://cloud.example.com/img/a.svg ").unwrap();
        assert_eq!(uri.as_str(), "https://cloud.example.com/img/a.svg");
    }

    #[test]
    fn test_resolve_rejects_relative() {
        assert!(matches!(
            resolve_uri("/img/a.svg"),
            Err(AssetError::InvalidUri { .. })
        ));
    }

    #[tokio::test]
    async fn test_http_fetcher_rejects_other_schemes() {
        let fetcher = HttpFetcher::new(&PipelineConfig::default()).unwrap();
        let uri = Url::parse("file:///etc/passwd").unwrap();

        let err = fetcher.fetch(&uri).await.unwrap_err();
        assert_eq!(err.stage(), "fetch");
    }
}
