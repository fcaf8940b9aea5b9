//! HTTP transport with an on-disk response cache and retrying GETs.
//!
//! Both service clients depend only on the [`Transport`] trait ("perform a
//! GET, get parsed JSON or an error"), so tests can substitute an in-memory
//! fake. [`HttpTransport`] is the production implementation: a reqwest
//! client wrapped with a named disk cache (one-hour expiry) and a
//! fixed-count exponential backoff retry policy.

use async_trait::async_trait;
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::hash_map::DefaultHasher;
use std::fmt::Debug;
use std::fs;
use std::hash::{Hash, Hasher};
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

const REQUEST_TIMEOUT_SECS: u64 = 10;
const USER_AGENT: &str = concat!("routeweather/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("failed to build HTTP client: {0}")]
    Build(#[from] reqwest::Error),

    #[error("request to {url} failed: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{url} returned status {status}: {body}")]
    Status {
        url: String,
        status: StatusCode,
        body: String,
    },

    #[error("failed to parse response from {url}: {source}")]
    Json {
        url: String,
        #[source]
        source: serde_json::Error,
    },
}

impl TransportError {
    /// Raw service error text, when the failure came with a response body.
    pub fn body(&self) -> Option<&str> {
        match self {
            Self::Status { body, .. } => Some(body),
            _ => None,
        }
    }

    fn is_retryable(&self) -> bool {
        match self {
            Self::Request { .. } => true,
            Self::Status { status, .. } => {
                status.is_server_error() || *status == StatusCode::TOO_MANY_REQUESTS
            }
            _ => false,
        }
    }
}

/// The one capability the pipeline needs from HTTP: issue a GET and get
/// parsed JSON back, or an error.
#[async_trait]
pub trait Transport: Send + Sync + Debug {
    async fn get_json(&self, url: &str, query: &[(&str, String)])
        -> Result<Value, TransportError>;
}

/// Fixed retry count with exponential backoff: attempt `n` (0-based) sleeps
/// `backoff * 2^n` before retrying.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub retries: u32,
    pub backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            retries: 5,
            backoff: Duration::from_millis(200),
        }
    }
}

#[derive(Debug)]
pub struct HttpTransport {
    http: Client,
    cache: Option<ResponseCache>,
    retry: RetryPolicy,
}

impl HttpTransport {
    /// Plain transport: no cache, default retry policy. Callers opt into
    /// caching with [`HttpTransport::with_cache`].
    pub fn new() -> Result<Self, TransportError> {
        let http = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .user_agent(USER_AGENT)
            .build()?;

        Ok(Self {
            http,
            cache: None,
            retry: RetryPolicy::default(),
        })
    }

    pub fn with_cache(mut self, dir: PathBuf, expiry: ChronoDuration) -> Self {
        self.cache = Some(ResponseCache { dir, expiry });
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    async fn fetch_once(
        &self,
        url: &str,
        query: &[(&str, String)],
    ) -> Result<Value, TransportError> {
        let res = self
            .http
            .get(url)
            .query(query)
            .send()
            .await
            .map_err(|source| TransportError::Request {
                url: url.to_string(),
                source,
            })?;

        let status = res.status();
        let body = res.text().await.map_err(|source| TransportError::Request {
            url: url.to_string(),
            source,
        })?;

        if !status.is_success() {
            return Err(TransportError::Status {
                url: url.to_string(),
                status,
                body: truncate_body(&body),
            });
        }

        serde_json::from_str(&body).map_err(|source| TransportError::Json {
            url: url.to_string(),
            source,
        })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn get_json(
        &self,
        url: &str,
        query: &[(&str, String)],
    ) -> Result<Value, TransportError> {
        let key = request_key(url, query);

        if let Some(cache) = &self.cache {
            if let Some(body) = cache.lookup(&key) {
                tracing::debug!(url, "serving response from cache");
                return Ok(body);
            }
        }

        tracing::debug!(url, "GET");

        let mut attempt = 0u32;
        let value = loop {
            match self.fetch_once(url, query).await {
                Ok(value) => break value,
                Err(err) if attempt < self.retry.retries && err.is_retryable() => {
                    let delay = self.retry.backoff * 2u32.saturating_pow(attempt);
                    tracing::debug!(url, attempt, ?delay, %err, "retrying after backoff");
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(err) => return Err(err),
            }
        };

        if let Some(cache) = &self.cache {
            cache.store(&key, &value);
        }

        Ok(value)
    }
}

/// Full request identity: URL plus query pairs in order.
fn request_key(url: &str, query: &[(&str, String)]) -> String {
    let mut key = url.to_string();
    for (i, (name, value)) in query.iter().enumerate() {
        key.push(if i == 0 { '?' } else { '&' });
        key.push_str(name);
        key.push('=');
        key.push_str(value);
    }
    key
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    if body.len() > MAX {
        format!("{}...", &body[..MAX])
    } else {
        body.to_string()
    }
}

/// Named on-disk response cache: one JSON file per request, keyed by a hash
/// of the full request URL. Unreadable or expired entries are treated as
/// misses and refetched.
#[derive(Debug)]
struct ResponseCache {
    dir: PathBuf,
    expiry: ChronoDuration,
}

#[derive(Debug, Serialize, Deserialize)]
struct CacheEntry {
    fetched_at: DateTime<Utc>,
    body: Value,
}

impl ResponseCache {
    fn entry_path(&self, key: &str) -> PathBuf {
        let mut hasher = DefaultHasher::new();
        key.hash(&mut hasher);
        self.dir.join(format!("{:016x}.json", hasher.finish()))
    }

    fn lookup(&self, key: &str) -> Option<Value> {
        let path = self.entry_path(key);
        let contents = fs::read_to_string(&path).ok()?;

        let entry: CacheEntry = match serde_json::from_str(&contents) {
            Ok(entry) => entry,
            Err(err) => {
                tracing::debug!(path = %path.display(), %err, "discarding unreadable cache entry");
                return None;
            }
        };

        if Utc::now() - entry.fetched_at > self.expiry {
            return None;
        }

        Some(entry.body)
    }

    fn store(&self, key: &str, body: &Value) {
        let entry = CacheEntry {
            fetched_at: Utc::now(),
            body: body.clone(),
        };

        let path = self.entry_path(key);
        let result = fs::create_dir_all(&self.dir)
            .and_then(|()| fs::write(&path, serde_json::to_string(&entry).unwrap_or_default()));

        if let Err(err) = result {
            // A broken cache must not fail the request itself.
            tracing::warn!(path = %path.display(), %err, "failed to write cache entry");
        }
    }
}
