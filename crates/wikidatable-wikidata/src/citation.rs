//! Citation metadata: title, language and site name for a source URL.
//!
//! Looked up once per URL per run. A failed lookup is cached as empty
//! metadata and never retried.

use crate::cache::CitationCache;
use crate::types::CitationRecord;
use async_trait::async_trait;
use reqwest::Client;
use std::sync::Arc;
use tracing::{debug, warn};
use url::Url;
use wikidatable_core::{non_empty, Reference};

const CITATION_URL: &str = "https://en.wikipedia.org/api/rest_v1/data/citation/mediawiki";

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CitationMetadata {
    pub title: Option<String>,
    pub language: Option<String>,
    pub website: Option<String>,
}

impl CitationMetadata {
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.language.is_none() && self.website.is_none()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum MetadataLookupError {
    #[error("request failed: {0}")]
    RequestFailed(String),

    #[error("invalid response: {0}")]
    InvalidResponse(String),

    #[error("network error: {0}")]
    NetworkError(#[from] reqwest::Error),
}

/// Where citation metadata comes from. The citation service in production,
/// in-memory fakes in tests.
#[async_trait]
pub trait MetadataSource: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<CitationMetadata, MetadataLookupError>;
}

/// Client for the MediaWiki citation REST endpoint.
pub struct CitoidClient {
    client: Client,
    endpoint: String,
}

impl Default for CitoidClient {
    fn default() -> Self {
        Self::new()
    }
}

impl CitoidClient {
    pub fn new() -> Self {
        Self {
            client: Client::new(),
            endpoint: CITATION_URL.to_string(),
        }
    }

    pub fn with_endpoint(mut self, url: impl Into<String>) -> Self {
        self.endpoint = url.into();
        self
    }

    pub fn with_client(mut self, client: Client) -> Self {
        self.client = client;
        self
    }

    /// Endpoint with the source URL appended as one escaped path segment.
    pub fn lookup_url(&self, source: &str) -> Result<Url, MetadataLookupError> {
        let mut url = Url::parse(&self.endpoint)
            .map_err(|e| MetadataLookupError::RequestFailed(format!("bad endpoint: {}", e)))?;
        url.path_segments_mut()
            .map_err(|_| MetadataLookupError::RequestFailed("endpoint cannot be a base".into()))?
            .pop_if_empty()
            .push(source);
        Ok(url)
    }
}

#[async_trait]
impl MetadataSource for CitoidClient {
    async fn fetch(&self, url: &str) -> Result<CitationMetadata, MetadataLookupError> {
        let lookup = self.lookup_url(url)?;
        debug!("Citation lookup: {}", lookup);

        let response = self.client.get(lookup).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(MetadataLookupError::RequestFailed(status.to_string()));
        }

        let records: Vec<CitationRecord> = response
            .json()
            .await
            .map_err(|e| MetadataLookupError::InvalidResponse(e.to_string()))?;
        let first = records
            .into_iter()
            .next()
            .ok_or_else(|| MetadataLookupError::InvalidResponse("empty result array".into()))?;

        Ok(CitationMetadata {
            title: first.title.and_then(non_empty),
            language: first.language.and_then(non_empty),
            website: first.website_title.and_then(non_empty),
        })
    }
}

/// Memoizing front for a [`MetadataSource`].
pub struct CitationMetadataResolver {
    source: Arc<dyn MetadataSource>,
    cache: Arc<CitationCache>,
}

impl CitationMetadataResolver {
    pub fn new(source: Arc<dyn MetadataSource>, cache: Arc<CitationCache>) -> Self {
        Self { source, cache }
    }

    /// Metadata for `url`; hits the network only the first time a URL is seen.
    pub async fn resolve(&self, url: &str) -> CitationMetadata {
        if let Some(hit) = self.cache.get(url) {
            debug!("Citation cache hit: {}", url);
            return hit;
        }

        let metadata = match self.source.fetch(url).await {
            Ok(metadata) => metadata,
            Err(e) => {
                warn!("Citation metadata lookup failed for {}: {}", url, e);
                CitationMetadata::default()
            }
        };
        self.cache.insert(url.to_string(), metadata)
    }

    /// Fills title, language and site on `reference` where they are still
    /// empty. No-op without a URL or when all three are already known.
    pub async fn fill(&self, reference: &mut Reference) {
        if reference.has_metadata() {
            return;
        }
        let Some(url) = reference.url.clone() else { return };

        let metadata = self.resolve(&url).await;
        if reference.title.is_none() {
            reference.title = metadata.title;
        }
        if reference.language.is_none() {
            reference.language = metadata.language;
        }
        if reference.website.is_none() {
            reference.website = metadata.website;
        }
    }
}
