use async_trait::async_trait;
use axum::http::HeaderMap;

use super::types::{FetchError, UpstreamReply};

/// One capability interface for both upstream backends, so the relay and
/// the normalizer are written once.
///
/// `authorize` resolves per-request authorization material for the locator;
/// `fetch_stream` issues the upstream GET with it and classifies the reply.
/// Implementations must abort the upstream connection when the returned
/// body stream is dropped.
#[async_trait]
pub trait FileBackend: Send + Sync {
    async fn authorize(&self, locator: &str) -> Result<HeaderMap, FetchError>;

    async fn fetch_stream(&self, locator: &str) -> Result<UpstreamReply, FetchError>;
}
