//! Resource fetchers — HTTP and local directory behind one trait.
//!
//! The poll loops only see [`ResourceSource`]; which transport is used is
//! decided once at start-up from the configured resource base.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

use dump1090_core::{ParseError, Resource};

use crate::config::ResourceBase;
use crate::error::{ConfigError, FetchError, PollError};

/// Something that can produce the current JSON document for a resource.
#[async_trait]
pub trait ResourceSource: Send + Sync {
    /// Fetch and decode the resource.
    async fn fetch(&self, resource: Resource) -> Result<Value, PollError>;

    /// Human-readable location of the resource, for logs.
    fn location(&self, resource: Resource) -> String;
}

/// Decode a fetched body. A malformed body is a parse error, not a fetch error.
fn decode(resource: Resource, body: &[u8]) -> Result<Value, PollError> {
    serde_json::from_slice(body)
        .map_err(|source| PollError::Parse(ParseError::Json { resource, source }))
}

// ---------------------------------------------------------------------------
// HTTP
// ---------------------------------------------------------------------------

/// Fetches `<base>/<resource>.json` over HTTP.
pub struct HttpSource {
    client: reqwest::Client,
    base: String,
    timeout: Duration,
}

impl HttpSource {
    pub fn new(base: impl Into<String>, timeout: Duration) -> Result<Self, ConfigError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ConfigError::HttpClient(e.to_string()))?;
        Ok(HttpSource {
            client,
            base: base.into().trim_end_matches('/').to_string(),
            timeout,
        })
    }

    fn classify(&self, location: String, err: reqwest::Error) -> FetchError {
        if err.is_timeout() {
            FetchError::Timeout {
                location,
                timeout: self.timeout,
            }
        } else {
            FetchError::Connection {
                location,
                reason: err.to_string(),
            }
        }
    }
}

#[async_trait]
impl ResourceSource for HttpSource {
    async fn fetch(&self, resource: Resource) -> Result<Value, PollError> {
        let url = self.location(resource);
        tracing::trace!(%url, "fetching");

        let resp = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| self.classify(url.clone(), e))?;

        let status = resp.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(FetchError::NotFound { location: url }.into());
        }
        if !status.is_success() {
            return Err(FetchError::Status {
                location: url,
                status: status.as_u16(),
            }
            .into());
        }

        let body = resp
            .bytes()
            .await
            .map_err(|e| self.classify(url.clone(), e))?;
        decode(resource, &body)
    }

    fn location(&self, resource: Resource) -> String {
        format!("{}/{}", self.base, resource.file_name())
    }
}

// ---------------------------------------------------------------------------
// Filesystem
// ---------------------------------------------------------------------------

/// Reads `<dir>/<resource>.json` from disk.
pub struct FileSource {
    dir: PathBuf,
    timeout: Duration,
}

impl FileSource {
    pub fn new(dir: impl Into<PathBuf>, timeout: Duration) -> Self {
        FileSource {
            dir: dir.into(),
            timeout,
        }
    }
}

#[async_trait]
impl ResourceSource for FileSource {
    async fn fetch(&self, resource: Resource) -> Result<Value, PollError> {
        let path = self.dir.join(resource.file_name());
        let location = path.display().to_string();

        let read = tokio::time::timeout(self.timeout, tokio::fs::read(&path))
            .await
            .map_err(|_| FetchError::Timeout {
                location: location.clone(),
                timeout: self.timeout,
            })?;

        let body = read.map_err(|source| {
            if source.kind() == std::io::ErrorKind::NotFound {
                FetchError::NotFound { location }
            } else {
                FetchError::Io { location, source }
            }
        })?;

        decode(resource, &body)
    }

    fn location(&self, resource: Resource) -> String {
        self.dir.join(resource.file_name()).display().to_string()
    }
}

/// Build the source matching the configured resource base.
pub fn open_source(
    base: &ResourceBase,
    timeout: Duration,
) -> Result<Arc<dyn ResourceSource>, ConfigError> {
    Ok(match base {
        ResourceBase::Url(url) => Arc::new(HttpSource::new(url.clone(), timeout)?),
        ResourceBase::Dir(dir) => Arc::new(FileSource::new(dir.clone(), timeout)),
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
