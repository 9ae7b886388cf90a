//! Registry tag listings.
//!
//! Provides the [`TagSource`] seam used by image searchers and an HTTP
//! implementation for Docker Hub-compatible tag listing endpoints.

use reqwest::blocking::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

use crate::error::{AilessError, Result};

/// Default registry API base URL.
pub const DEFAULT_REGISTRY_URL: &str = "https://hub.docker.com";

/// Number of tags requested per listing.
pub const PAGE_SIZE: usize = 100;

/// Lists published tags of an image repository.
pub trait TagSource {
    /// List tag names of `repository` (e.g. `pytorch/pytorch`), optionally
    /// restricted server-side to names containing `name_filter`.
    ///
    /// Tags are returned in the order the registry reports them.
    fn list_tags(&self, repository: &str, name_filter: Option<&str>) -> Result<Vec<String>>;
}

/// One page of a tag listing.
#[derive(Debug, Deserialize)]
struct TagPage {
    results: Vec<TagEntry>,
}

#[derive(Debug, Deserialize)]
struct TagEntry {
    name: String,
}

/// Fetches tag listings over HTTP/HTTPS.
pub struct HttpTagSource {
    client: Client,
    base_url: String,
    timeout: Duration,
}

impl HttpTagSource {
    /// Create a source for Docker Hub with the default 30-second timeout.
    pub fn new() -> Result<Self> {
        Self::with_options(DEFAULT_REGISTRY_URL, Duration::from_secs(30))
    }

    /// Create a source for a custom registry URL and timeout.
    pub fn with_options(base_url: &str, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .user_agent(concat!("ailess/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()
            .map_err(|e| AilessError::Other(e.into()))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            timeout,
        })
    }

    /// Get the registry base URL.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Get the configured timeout.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// The listing URL for `repository`.
    pub fn tags_url(&self, repository: &str, name_filter: Option<&str>) -> String {
        let mut url = format!(
            "{}/v2/repositories/{}/tags/?page_size={}",
            self.base_url, repository, PAGE_SIZE
        );
        if let Some(filter) = name_filter {
            url.push_str("&name=");
            url.push_str(filter);
        }
        url
    }
}

impl TagSource for HttpTagSource {
    fn list_tags(&self, repository: &str, name_filter: Option<&str>) -> Result<Vec<String>> {
        let url = self.tags_url(repository, name_filter);
        let unavailable = |message: String| AilessError::RegistryUnavailable {
            repository: repository.to_string(),
            message,
        };

        debug!("Fetching tags from {}", url);
        let response = self
            .client
            .get(&url)
            .send()
            .map_err(|e| unavailable(e.to_string()))?;

        if !response.status().is_success() {
            return Err(unavailable(format!(
                "HTTP {} fetching {}",
                response.status(),
                url
            )));
        }

        let page: TagPage = response
            .json()
            .map_err(|e| unavailable(format!("invalid tag listing: {}", e)))?;

        debug!("Registry returned {} tags for {}", page.results.len(), repository);
        Ok(page.results.into_iter().map(|entry| entry.name).collect())
    }
}
