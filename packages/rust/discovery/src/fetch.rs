//! HTTP retrieval of sitemap documents.

use std::future::Future;
use std::time::Duration;

use indexnow_shared::{ClientConfig, IndexNowError, Result};
use reqwest::Client;
use tracing::debug;

/// Maximum number of redirects to follow on any request.
const MAX_REDIRECTS: usize = 10;

/// Largest sitemap accepted (the sitemap protocol's 50 MB uncompressed limit).
pub const MAX_SITEMAP_SIZE: u64 = 50 * 1024 * 1024;

/// Source of raw sitemap bytes.
///
/// The aggregator only depends on this trait, so traversal can be exercised
/// against in-memory documents.
pub trait SitemapFetcher {
    /// Fetch the document at `url`. Transport failures and non-2xx statuses
    /// are [`IndexNowError::Fetch`] errors naming the URL.
    fn fetch(&self, url: &str) -> impl Future<Output = Result<Vec<u8>>>;
}

/// Build the reqwest client shared by every request in a run.
pub fn build_client(config: &ClientConfig) -> Result<Client> {
    Client::builder()
        .user_agent(config.user_agent.as_str())
        .redirect(reqwest::redirect::Policy::limited(MAX_REDIRECTS))
        .timeout(Duration::from_secs(config.timeout_secs))
        .build()
        .map_err(|e| IndexNowError::config(format!("failed to build HTTP client: {e}")))
}

/// [`SitemapFetcher`] backed by a plain HTTP GET.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
    max_size: u64,
}

impl HttpFetcher {
    pub fn new(client: Client) -> Self {
        Self {
            client,
            max_size: MAX_SITEMAP_SIZE,
        }
    }

    /// Override the response size limit.
    pub fn with_max_size(mut self, max_size: u64) -> Self {
        self.max_size = max_size;
        self
    }

    fn too_large(&self, url: &str, len: u64) -> IndexNowError {
        IndexNowError::fetch(
            url,
            format!("response too large ({len} bytes, max {})", self.max_size),
        )
    }
}

impl SitemapFetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| IndexNowError::fetch(url, e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(IndexNowError::fetch(url, format!("HTTP {status}")));
        }

        if let Some(len) = response.content_length() {
            if len > self.max_size {
                return Err(self.too_large(url, len));
            }
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| IndexNowError::fetch(url, format!("failed to read body: {e}")))?;

        // Chunked responses carry no length up front.
        if body.len() as u64 > self.max_size {
            return Err(self.too_large(url, body.len() as u64));
        }

        debug!(url, bytes = body.len(), "fetched sitemap");
        Ok(body.to_vec())
    }
}
