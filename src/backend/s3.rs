//! Object storage backend
//!
//! Wraps the object_store crate: AmazonS3 in production, InMemory in tests.
//! Credentials are static and live in the client, so `authorize` has
//! nothing to negotiate.

use async_trait::async_trait;
use axum::http::{HeaderMap, HeaderValue, StatusCode, header};
use bytes::Bytes;
use chrono::{DateTime, Utc};
use futures::{StreamExt, TryStreamExt};
use object_store::aws::AmazonS3Builder;
use object_store::{Attribute, GetResult, ObjectStore, path::Path as StoragePath};
use std::sync::Arc;
use tracing::debug;

use super::traits::FileBackend;
use super::types::{FetchError, UpstreamFile, UpstreamReply, store_status};
use crate::config::{StorageConfig, StorageProvider};

#[derive(Clone)]
pub struct ObjectStoreBackend {
    store: Arc<dyn ObjectStore>,
}

impl ObjectStoreBackend {
    pub fn new(store: Arc<dyn ObjectStore>) -> Self {
        Self { store }
    }

    /// In-memory store for tests and local development.
    pub fn in_memory() -> Self {
        Self::new(Arc::new(object_store::memory::InMemory::new()))
    }

    pub fn from_config(config: &StorageConfig) -> Result<Self, FetchError> {
        match config.provider {
            StorageProvider::Memory => Ok(Self::in_memory()),
            StorageProvider::S3 => {
                let mut builder = AmazonS3Builder::new()
                    .with_bucket_name(&config.bucket)
                    .with_region(&config.region);
                if let Some(ref access_key) = config.access_key {
                    builder = builder.with_access_key_id(access_key);
                }
                if let Some(ref secret_key) = config.secret_key {
                    builder = builder.with_secret_access_key(secret_key);
                }
                if let Some(ref endpoint) = config.endpoint {
                    builder = builder.with_endpoint(endpoint).with_allow_http(true);
                }
                Ok(Self::new(Arc::new(builder.build()?)))
            }
        }
    }
}

#[async_trait]
impl FileBackend for ObjectStoreBackend {
    async fn authorize(&self, _locator: &str) -> Result<HeaderMap, FetchError> {
        Ok(HeaderMap::new())
    }

    async fn fetch_stream(&self, locator: &str) -> Result<UpstreamReply, FetchError> {
        // The key is used verbatim; key semantics belong to the store.
        let path = StoragePath::from(locator);

        let result = match self.store.get(&path).await {
            Ok(result) => result,
            Err(err) => {
                // NotFound/PermissionDenied/Unauthenticated/Precondition are
                // upstream HTTP failures and keep their status; everything
                // else is a transport error.
                if let Some(status) = store_status(&err) {
                    debug!(key = locator, %status, "Store rejected the request");
                    return Ok(UpstreamReply::Failed {
                        status,
                        payload: Bytes::new(),
                    });
                }
                return Err(err.into());
            }
        };

        let headers = object_headers(&result);
        let body = result.into_stream().map_err(FetchError::from).boxed();

        Ok(UpstreamReply::File(UpstreamFile {
            status: StatusCode::OK,
            headers,
            body,
        }))
    }
}

/// Object metadata expressed as the response headers an S3 GET would carry.
fn object_headers(result: &GetResult) -> HeaderMap {
    let mut headers = HeaderMap::new();

    let content_type = result
        .attributes
        .get(&Attribute::ContentType)
        .map(|value| value.to_string())
        .unwrap_or_else(|| mime::APPLICATION_OCTET_STREAM.to_string());
    if let Ok(value) = HeaderValue::from_str(&content_type) {
        headers.insert(header::CONTENT_TYPE, value);
    }

    headers.insert(header::CONTENT_LENGTH, HeaderValue::from(result.meta.size));

    if let Ok(value) = HeaderValue::from_str(&http_date(result.meta.last_modified)) {
        headers.insert(header::LAST_MODIFIED, value);
    }

    headers
}

fn http_date(at: DateTime<Utc>) -> String {
    at.format("%a, %d %b %Y %H:%M:%S GMT").to_string()
}
