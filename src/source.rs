//! Where catalog JSON comes from.
//!
//! The loader, the category views and instant search all read through the
//! [`DataSource`] trait, so the same pipeline runs against the deployed
//! `/data/` directory over HTTP, a local checkout, or an in-memory fixture.
//!
//! | Implementation | Backing |
//! |----------------|---------|
//! | [`HttpSource`] | `reqwest` GET relative to a base URL |
//! | [`FsSource`] | files under a root directory |
//! | [`MemorySource`] | a `HashMap` of pre-parsed documents |

use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::config::DataConfig;
use crate::error::{CatalogError, Result};

/// A read-only store of JSON documents addressed by relative path
/// (e.g. `"index.json"`, `"roland.json"`).
#[async_trait]
pub trait DataSource: Send + Sync {
    /// Human-readable location, used in logs and CLI output.
    fn describe(&self) -> String;

    /// Fetch and parse one document.
    async fn fetch(&self, path: &str) -> Result<Value>;

    /// Local directory backing this source, if any. Only filesystem sources
    /// can be watched for changes.
    fn local_root(&self) -> Option<&Path> {
        None
    }
}

/// Build the source described by `[data]`: HTTP when `base` is a URL,
/// filesystem otherwise.
pub fn source_from_config(config: &DataConfig) -> anyhow::Result<Arc<dyn DataSource>> {
    if config.is_remote() {
        let timeout = config.timeout_secs.map(Duration::from_secs);
        Ok(Arc::new(HttpSource::new(&config.base, timeout)?))
    } else {
        Ok(Arc::new(FsSource::new(&config.base)))
    }
}

fn parse_body(path: &str, bytes: &[u8]) -> Result<Value> {
    serde_json::from_slice(bytes).map_err(|e| CatalogError::parse(path, e))
}

// ============ HTTP ============

pub struct HttpSource {
    client: reqwest::Client,
    base: String,
}

impl HttpSource {
    /// No timeout is applied unless one is given; a hung request blocks
    /// only the caller awaiting it.
    pub fn new(base: &str, timeout: Option<Duration>) -> anyhow::Result<Self> {
        let mut builder = reqwest::Client::builder();
        if let Some(t) = timeout {
            builder = builder.timeout(t);
        }
        Ok(Self {
            client: builder.build()?,
            base: base.trim_end_matches('/').to_string(),
        })
    }

    fn url_for(&self, path: &str) -> String {
        format!("{}/{}", self.base, path.trim_start_matches('/'))
    }
}

#[async_trait]
impl DataSource for HttpSource {
    fn describe(&self) -> String {
        self.base.clone()
    }

    async fn fetch(&self, path: &str) -> Result<Value> {
        let url = self.url_for(path);
        log::debug!("GET {}", url);

        let resp = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| CatalogError::network(path, e))?;

        if !resp.status().is_success() {
            let status = resp.status();
            return Err(CatalogError::network(path, format!("HTTP {}", status)));
        }

        let bytes = resp
            .bytes()
            .await
            .map_err(|e| CatalogError::network(path, e))?;
        parse_body(path, &bytes)
    }
}

// ============ Filesystem ============

pub struct FsSource {
    root: PathBuf,
}

impl FsSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

#[async_trait]
impl DataSource for FsSource {
    fn describe(&self) -> String {
        self.root.display().to_string()
    }

    async fn fetch(&self, path: &str) -> Result<Value> {
        let full = self.root.join(path.trim_start_matches('/'));
        log::debug!("read {}", full.display());

        let bytes = tokio::fs::read(&full)
            .await
            .map_err(|e| CatalogError::network(path, format!("{}: {}", full.display(), e)))?;
        parse_body(path, &bytes)
    }

    fn local_root(&self) -> Option<&Path> {
        Some(&self.root)
    }
}

// ============ In-memory ============

/// Pre-parsed documents keyed by path. Counts fetches so callers can check
/// cache behavior.
#[derive(Default)]
pub struct MemorySource {
    docs: HashMap<String, Value>,
    fetches: Mutex<HashMap<String, usize>>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, path: &str, doc: Value) -> Self {
        self.docs.insert(path.to_string(), doc);
        self
    }

    pub fn insert(&mut self, path: &str, doc: Value) {
        self.docs.insert(path.to_string(), doc);
    }

    /// How many times `path` has been fetched.
    pub fn fetch_count(&self, path: &str) -> usize {
        self.fetches
            .lock()
            .map(|m| m.get(path).copied().unwrap_or(0))
            .unwrap_or(0)
    }
}

#[async_trait]
impl DataSource for MemorySource {
    fn describe(&self) -> String {
        format!("memory ({} documents)", self.docs.len())
    }

    async fn fetch(&self, path: &str) -> Result<Value> {
        if let Ok(mut counts) = self.fetches.lock() {
            *counts.entry(path.to_string()).or_insert(0) += 1;
        }
        self.docs
            .get(path)
            .cloned()
            .ok_or_else(|| CatalogError::network(path, "HTTP 404 Not Found"))
    }
}
