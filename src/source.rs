//! Fetching glossary payloads from remote sources.
//!
//! Uses reqwest for fetching. Sources are fetched concurrently, each with its
//! own timeout; a source that fails contributes nothing (or its last cached
//! payload) and never holds up the others.

use crate::aggregator::{merge, GlossaryTable, SourcePayload};
use crate::cache::PayloadCache;
use crate::config::{Config, DEFAULT_ENDPOINT};
use futures::future::join_all;
use reqwest::header::ACCEPT;
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, warn};

/// User-Agent string identifying this client
const USER_AGENT: &str = concat!(
    "glosstip/",
    env!("CARGO_PKG_VERSION"),
    " (https://github.com/cladam/glosstip)"
);

#[derive(Error, Debug)]
pub enum SourceError {
    #[error("source unavailable: {0}")]
    Unavailable(#[from] reqwest::Error),
    #[error("source timed out after {0:?}")]
    Timeout(Duration),
    #[error("source answered with HTTP {0}")]
    Status(u16),
    #[error("malformed glossary payload: {0}")]
    Malformed(String),
    #[error("failed to build HTTP client: {0}")]
    Client(String),
}

/// How sources are fetched
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchOptions {
    /// Path appended to each source base URL
    pub endpoint: String,
    /// Per-source timeout
    pub timeout: Duration,
    /// Age below which a cached payload is used without fetching
    pub cache_ttl: Duration,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            timeout: Duration::from_secs(10),
            cache_ttl: Duration::from_secs(3600),
        }
    }
}

impl FetchOptions {
    pub fn from_config(config: &Config) -> Self {
        Self {
            endpoint: config.sources.endpoint.clone(),
            timeout: config.fetch.timeout(),
            cache_ttl: config.cache.ttl(),
        }
    }
}

/// Create a configured HTTP client for fetching glossaries
fn create_client(timeout: Duration) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(USER_AGENT)
        .timeout(timeout)
        .build()
}

/// The glossary listing URL for a source site
pub fn glossary_endpoint(base: &str, endpoint: &str) -> String {
    let base = base.trim();
    if endpoint.is_empty() {
        return base.to_string();
    }
    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        endpoint.trim_start_matches('/')
    )
}

/// Fetch one glossary listing and check that it is a JSON array
pub async fn fetch_payload(client: &Client, url: &str) -> Result<SourcePayload, SourceError> {
    let response = client
        .get(url)
        .header(ACCEPT, "application/json")
        .send()
        .await?;

    let status = response.status();
    if !status.is_success() {
        return Err(SourceError::Status(status.as_u16()));
    }

    let text = response.text().await?;
    let body: Value =
        serde_json::from_str(&text).map_err(|e| SourceError::Malformed(e.to_string()))?;
    if !body.is_array() {
        return Err(SourceError::Malformed("expected a JSON array".to_string()));
    }

    Ok(SourcePayload::new(url, body))
}

/// Fetch every source concurrently, in configuration order.
///
/// Fresh cache entries are used without touching the network. Successful
/// fetches refresh the cache; failed ones fall back to whatever the cache
/// holds, however old, or are dropped.
pub async fn fetch_all(
    urls: &[String],
    options: &FetchOptions,
    cache: Option<&PayloadCache>,
) -> Vec<SourcePayload> {
    if urls.is_empty() {
        info!("no glossary sources configured");
        return Vec::new();
    }

    let client = create_client(options.timeout);
    let fetches = urls.iter().map(|base| {
        let endpoint = glossary_endpoint(base, &options.endpoint);
        let client = client.as_ref();
        async move {
            let result = match client {
                Ok(client) => fetch_with_timeout(client, &endpoint, options, cache).await,
                Err(e) => Err(SourceError::Client(e.to_string())),
            };
            settle(endpoint, result, cache)
        }
    });

    let payloads: Vec<SourcePayload> = join_all(fetches).await.into_iter().flatten().collect();
    info!(
        sources = urls.len(),
        fetched = payloads.len(),
        "glossary sources loaded"
    );
    payloads
}

/// Fetch and merge the configured sources into a table
pub async fn fetch_glossary(config: &Config, cache: Option<&PayloadCache>) -> GlossaryTable {
    let options = FetchOptions::from_config(config);
    let payloads = fetch_all(&config.sources.urls, &options, cache).await;
    merge(&payloads)
}

async fn fetch_with_timeout(
    client: &Client,
    endpoint: &str,
    options: &FetchOptions,
    cache: Option<&PayloadCache>,
) -> Result<SourcePayload, SourceError> {
    if let Some(cache) = cache {
        match cache.get_fresh(endpoint, options.cache_ttl) {
            Ok(Some(cached)) => {
                debug!(source = endpoint, fetched_at = %cached.fetched_at, "using cached glossary");
                return Ok(SourcePayload::new(endpoint, cached.body));
            }
            Ok(None) => {}
            Err(e) => warn!(source = endpoint, "cache lookup failed: {}", e),
        }
    }

    match tokio::time::timeout(options.timeout, fetch_payload(client, endpoint)).await {
        Ok(Err(SourceError::Unavailable(e))) if e.is_timeout() => {
            Err(SourceError::Timeout(options.timeout))
        }
        Ok(result) => result,
        Err(_) => Err(SourceError::Timeout(options.timeout)),
    }
}

/// Turn a fetch outcome into a payload, consulting the cache on failure
fn settle(
    endpoint: String,
    result: Result<SourcePayload, SourceError>,
    cache: Option<&PayloadCache>,
) -> Option<SourcePayload> {
    match result {
        Ok(payload) => {
            if let Some(cache) = cache {
                if let Err(e) = cache.store(&endpoint, &payload.body) {
                    warn!(source = %endpoint, "failed to cache glossary: {}", e);
                }
            }
            Some(payload)
        }
        Err(e) => {
            warn!(source = %endpoint, "skipping glossary source: {}", e);
            let stale = cache.and_then(|cache| cache.get(&endpoint).ok().flatten())?;
            info!(source = %endpoint, fetched_at = %stale.fetched_at, "falling back to cached glossary");
            Some(SourcePayload::new(endpoint, stale.body))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_joins_base_and_path() {
        assert_eq!(
            glossary_endpoint("https://books.example/example-book/", DEFAULT_ENDPOINT),
            "https://books.example/example-book/wp-json/custom/v1/glossary"
        );
        assert_eq!(
            glossary_endpoint(" https://books.example ", "wp-json/custom/v1/glossary"),
            "https://books.example/wp-json/custom/v1/glossary"
        );
    }

    #[test]
    fn empty_endpoint_uses_url_verbatim() {
        assert_eq!(
            glossary_endpoint("https://cdn.example/glossary.json", ""),
            "https://cdn.example/glossary.json"
        );
    }

    #[test]
    fn options_follow_config() {
        let mut config = Config::default();
        config.sources.endpoint = String::new();
        config.fetch.timeout_secs = 3;
        config.cache.ttl_secs = 9;
        let options = FetchOptions::from_config(&config);
        assert_eq!(options.endpoint, "");
        assert_eq!(options.timeout, Duration::from_secs(3));
        assert_eq!(options.cache_ttl, Duration::from_secs(9));
    }

    #[tokio::test]
    async fn no_sources_yield_no_payloads() {
        let payloads = fetch_all(&[], &FetchOptions::default(), None).await;
        assert!(payloads.is_empty());
    }
}
