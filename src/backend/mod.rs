//! Upstream fetchers
//!
//! Both backends implement [`FileBackend`]: resolve per-request
//! authorization, issue the upstream GET, classify the reply. The streaming
//! path hands body chunks through as the client drains them; the buffered
//! path below collects the whole body instead.

mod s3;
mod sharepoint;
mod traits;
mod types;

pub use s3::ObjectStoreBackend;
pub use sharepoint::SharePointBackend;
pub use traits::FileBackend;
pub use types::{BodyStream, FetchError, UpstreamFile, UpstreamReply};

use bytes::{Bytes, BytesMut};
use futures::StreamExt;
use tracing::warn;

use crate::normalize::{NormalizedError, normalize};

/// Buffered variant of the fetch: resolves the entire body in memory.
///
/// Intended for payloads that are consumed as a value (re-upload, parsing),
/// not relayed. There is no size cap; memory-boundedness is traded away and
/// the caller is responsible for using this only on small/medium files.
///
/// Any status of 300 or above, and any transport failure, yields a
/// [`NormalizedError`]; success never does.
pub async fn fetch_buffer(
    backend: &dyn FileBackend,
    locator: &str,
) -> Result<Bytes, NormalizedError> {
    let reply = match backend.fetch_stream(locator).await {
        Ok(reply) => reply,
        Err(err) => {
            warn!(locator, error = %err, "Buffered fetch failed before response headers");
            return Err(err.into_normalized());
        }
    };

    match reply {
        UpstreamReply::File(file) => {
            let mut buffer = BytesMut::new();
            let mut body = file.body;
            while let Some(chunk) = body.next().await {
                match chunk {
                    Ok(bytes) => buffer.extend_from_slice(&bytes),
                    Err(err) => {
                        warn!(locator, error = %err, "Buffered fetch failed mid-body");
                        return Err(err.into_normalized());
                    }
                }
            }
            Ok(buffer.freeze())
        }
        UpstreamReply::Failed { status, payload } => {
            Err(normalize(&payload, status.as_u16()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use axum::http::{HeaderMap, StatusCode};
    use futures::stream;

    enum FakeReply {
        Chunks(Vec<&'static [u8]>),
        Failed(StatusCode, &'static [u8]),
    }

    struct FakeBackend(FakeReply);

    #[async_trait]
    impl FileBackend for FakeBackend {
        async fn authorize(&self, _locator: &str) -> Result<HeaderMap, FetchError> {
            Ok(HeaderMap::new())
        }

        async fn fetch_stream(&self, _locator: &str) -> Result<UpstreamReply, FetchError> {
            match &self.0 {
                FakeReply::Chunks(chunks) => {
                    let items: Vec<Result<Bytes, FetchError>> = chunks
                        .iter()
                        .map(|chunk| Ok(Bytes::from_static(chunk)))
                        .collect();
                    Ok(UpstreamReply::File(UpstreamFile {
                        status: StatusCode::OK,
                        headers: HeaderMap::new(),
                        body: stream::iter(items).boxed(),
                    }))
                }
                FakeReply::Failed(status, payload) => Ok(UpstreamReply::Failed {
                    status: *status,
                    payload: Bytes::from_static(payload),
                }),
            }
        }
    }

    #[tokio::test]
    async fn buffers_all_chunks_in_order() {
        let backend = FakeBackend(FakeReply::Chunks(vec![b"alpha ", b"beta ", b"gamma"]));
        let buffer = fetch_buffer(&backend, "doc").await.unwrap();
        assert_eq!(&buffer[..], b"alpha beta gamma");
    }

    #[tokio::test]
    async fn empty_body_resolves_empty() {
        let backend = FakeBackend(FakeReply::Chunks(vec![]));
        let buffer = fetch_buffer(&backend, "doc").await.unwrap();
        assert!(buffer.is_empty());
    }

    #[tokio::test]
    async fn upstream_failure_always_rejects() {
        let backend = FakeBackend(FakeReply::Failed(
            StatusCode::NOT_FOUND,
            br#"{"odata.error":{"message":{"value":"File not found"}}}"#,
        ));
        let err = fetch_buffer(&backend, "doc").await.unwrap_err();
        assert_eq!(err.status, 404);
        assert_eq!(err.error.as_deref(), Some("File not found"));
    }

    #[tokio::test]
    async fn unparseable_failure_payload_degrades() {
        let backend = FakeBackend(FakeReply::Failed(StatusCode::BAD_GATEWAY, b"<html>"));
        let err = fetch_buffer(&backend, "doc").await.unwrap_err();
        assert_eq!(err.status, 502);
        assert_eq!(err.error, None);
    }
}
