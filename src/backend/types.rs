use axum::http::{HeaderMap, StatusCode};
use bytes::Bytes;
use futures::stream::BoxStream;
use thiserror::Error;

use crate::auth::AuthError;
use crate::normalize::NormalizedError;

/// Upstream body chunks, pulled only as fast as the outbound sink drains.
pub type BodyStream = BoxStream<'static, Result<Bytes, FetchError>>;

/// A live upstream file: headers are fixed before the first body byte can
/// be read, so head-before-body ordering holds by construction.
pub struct UpstreamFile {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: BodyStream,
}

/// Classified upstream reply. A status below 300 streams through as a file;
/// anything else is an error payload, collected in full and never relayed
/// as file content.
pub enum UpstreamReply {
    File(UpstreamFile),
    Failed { status: StatusCode, payload: Bytes },
}

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("authorization failed: {0}")]
    Authorization(#[from] AuthError),

    #[error("transport failure: {0}")]
    Transport(reqwest::Error),

    #[error("object store failure: {0}")]
    ObjectStore(#[from] object_store::Error),
}

impl FetchError {
    /// Reduce a pre-response failure to the normalized shape. Authorization
    /// detail never leaves the process; callers log it instead.
    pub fn into_normalized(self) -> NormalizedError {
        match self {
            FetchError::Authorization(_) => NormalizedError::transport(None),
            FetchError::Transport(err) => NormalizedError::transport(io_error_kind(&err)),
            FetchError::ObjectStore(err) => match store_status(&err) {
                Some(status) => NormalizedError {
                    error: None,
                    status: status.as_u16(),
                },
                None => NormalizedError::transport(None),
            },
        }
    }
}

/// Upstream HTTP statuses the object store surfaces as typed errors. These
/// are real upstream failures and keep their status; anything else is a
/// transport-level problem.
pub(crate) fn store_status(err: &object_store::Error) -> Option<StatusCode> {
    match err {
        object_store::Error::NotFound { .. } => Some(StatusCode::NOT_FOUND),
        object_store::Error::PermissionDenied { .. } => Some(StatusCode::FORBIDDEN),
        object_store::Error::Unauthenticated { .. } => Some(StatusCode::UNAUTHORIZED),
        object_store::Error::Precondition { .. } => Some(StatusCode::PRECONDITION_FAILED),
        _ => None,
    }
}

/// Walks the source chain for an io error and reports its kind, the closest
/// analogue to a low-level transport error code.
fn io_error_kind(err: &(dyn std::error::Error + 'static)) -> Option<String> {
    let mut source = err.source();
    while let Some(inner) = source {
        if let Some(io) = inner.downcast_ref::<std::io::Error>() {
            return Some(format!("{:?}", io.kind()));
        }
        source = inner.source();
    }
    None
}
