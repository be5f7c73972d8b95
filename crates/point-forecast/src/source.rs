//! Named resource sources.
//!
//! Every input of a forecast query (coordinate arrays, raster archives,
//! timestamp arrays) is a named resource fetched as raw bytes. The core only
//! talks to [`ResourceSource`]; where the bytes come from is up to the
//! implementation:
//!
//! - [`ObjectStoreSource`]: a local directory or any `object_store` backend
//! - [`HttpSource`]: files served under a base URL
//! - [`MemorySource`]: in-memory resources for tests and demos

use std::collections::HashMap;
use std::path::Path as FsPath;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use object_store::{local::LocalFileSystem, path::Path, ObjectStore};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, instrument};

use crate::error::{ForecastError, Result};
use crate::raster::{decode_f32_le, encode_f32_le};

/// Fetches named resources as bytes.
#[async_trait]
pub trait ResourceSource: Send + Sync {
    /// Fetch the full contents of a resource.
    ///
    /// Missing or unreadable resources fail with `DataUnavailable`.
    async fn fetch(&self, name: &str) -> Result<Bytes>;

    /// Short description for logs (e.g. a directory or base URL).
    fn describe(&self) -> String;
}

#[async_trait]
impl<S: ResourceSource + ?Sized> ResourceSource for Arc<S> {
    async fn fetch(&self, name: &str) -> Result<Bytes> {
        (**self).fetch(name).await
    }

    fn describe(&self) -> String {
        (**self).describe()
    }
}

/// Fetch a resource and parse it as JSON.
pub async fn fetch_json<T, S>(source: &S, name: &str) -> Result<T>
where
    T: DeserializeOwned,
    S: ResourceSource + ?Sized,
{
    let bytes = source.fetch(name).await?;
    serde_json::from_slice(&bytes).map_err(|e| ForecastError::unavailable(name, e))
}

/// Fetch a resource and decode it as little-endian `f32` values.
pub async fn fetch_f32_le<S>(source: &S, name: &str) -> Result<Vec<f32>>
where
    S: ResourceSource + ?Sized,
{
    let bytes = source.fetch(name).await?;
    decode_f32_le(&bytes).map_err(|e| match e {
        ForecastError::DataUnavailable { reason, .. } => ForecastError::unavailable(name, reason),
        other => other,
    })
}

// ============================================================================
// Object store
// ============================================================================

/// Resources read from an `object_store` backend.
pub struct ObjectStoreSource {
    store: Arc<dyn ObjectStore>,
    label: String,
}

impl ObjectStoreSource {
    /// Wrap an existing store.
    pub fn new(store: Arc<dyn ObjectStore>, label: impl Into<String>) -> Self {
        Self {
            store,
            label: label.into(),
        }
    }

    /// Resources read from files below a local directory.
    pub fn local(root: impl AsRef<FsPath>) -> Result<Self> {
        let root = root.as_ref();
        let store = LocalFileSystem::new_with_prefix(root)
            .map_err(|e| ForecastError::unavailable(root.display().to_string(), e))?;
        Ok(Self::new(Arc::new(store), root.display().to_string()))
    }
}

#[async_trait]
impl ResourceSource for ObjectStoreSource {
    #[instrument(skip(self), fields(store = %self.label))]
    async fn fetch(&self, name: &str) -> Result<Bytes> {
        let location = Path::from(name);

        let result = self.store.get(&location).await.map_err(|e| match e {
            object_store::Error::NotFound { .. } => ForecastError::unavailable(name, "not found"),
            other => ForecastError::unavailable(name, other),
        })?;

        let bytes = result
            .bytes()
            .await
            .map_err(|e| ForecastError::unavailable(name, e))?;

        debug!(size = bytes.len(), "Read resource");
        Ok(bytes)
    }

    fn describe(&self) -> String {
        self.label.clone()
    }
}

// ============================================================================
// HTTP
// ============================================================================

/// Resources served below a base URL.
pub struct HttpSource {
    client: reqwest::Client,
    base_url: String,
}

impl HttpSource {
    /// Create a source with a per-request timeout.
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let base_url = base_url.into();
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ForecastError::unavailable(base_url.clone(), e))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Full URL of a resource.
    pub fn url_for(&self, name: &str) -> String {
        format!("{}/{}", self.base_url, name.trim_start_matches('/'))
    }
}

#[async_trait]
impl ResourceSource for HttpSource {
    #[instrument(skip(self), fields(base_url = %self.base_url))]
    async fn fetch(&self, name: &str) -> Result<Bytes> {
        let url = self.url_for(name);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| ForecastError::unavailable(name, e))?;

        let bytes = response
            .bytes()
            .await
            .map_err(|e| ForecastError::unavailable(name, e))?;

        debug!(size = bytes.len(), url = %url, "Downloaded resource");
        Ok(bytes)
    }

    fn describe(&self) -> String {
        self.base_url.clone()
    }
}

// ============================================================================
// In-memory
// ============================================================================

/// In-memory resources, counting fetches per name.
#[derive(Default)]
pub struct MemorySource {
    resources: HashMap<String, Bytes>,
    fetches: Mutex<HashMap<String, usize>>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store raw bytes under a name.
    pub fn insert(&mut self, name: impl Into<String>, bytes: impl Into<Bytes>) {
        self.resources.insert(name.into(), bytes.into());
    }

    /// Store a value serialized as JSON.
    pub fn insert_json<T: Serialize + ?Sized>(&mut self, name: impl Into<String>, value: &T) -> Result<()> {
        let json = serde_json::to_vec(value)?;
        self.insert(name, json);
        Ok(())
    }

    /// Store values encoded as little-endian `f32`.
    pub fn insert_f32(&mut self, name: impl Into<String>, values: &[f32]) {
        self.insert(name, encode_f32_le(values));
    }

    /// Builder form of [`MemorySource::insert`].
    pub fn with(mut self, name: impl Into<String>, bytes: impl Into<Bytes>) -> Self {
        self.insert(name, bytes);
        self
    }

    /// How many times a resource has been fetched.
    pub fn fetch_count(&self, name: &str) -> usize {
        self.fetches
            .lock()
            .map(|f| f.get(name).copied().unwrap_or(0))
            .unwrap_or(0)
    }
}

#[async_trait]
impl ResourceSource for MemorySource {
    async fn fetch(&self, name: &str) -> Result<Bytes> {
        if let Ok(mut fetches) = self.fetches.lock() {
            *fetches.entry(name.to_string()).or_insert(0) += 1;
        }

        self.resources
            .get(name)
            .cloned()
            .ok_or_else(|| ForecastError::unavailable(name, "not found"))
    }

    fn describe(&self) -> String {
        format!("memory ({} resources)", self.resources.len())
    }
}
