use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use std::sync::Arc;
use tracing::debug;

use super::{error::ApiError, models::DocumentQuery, state::AppState};
use crate::backend::{FetchError, FileBackend, UpstreamReply};
use crate::normalize::normalize;
use crate::relay;

/// Object download endpoint (GET /s3download/{*key})
///
/// The wildcard remainder of the path is the object key, used verbatim.
/// Key semantics (including anything path-like in it) belong to the store.
pub async fn download_object(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Response, ApiError> {
    serve(&state, state.objects.clone(), &key, None).await
}

/// Document download endpoint (GET /getspfile/{id}?filename=...)
///
/// `id` is the document GUID. The outbound `content-disposition` is always
/// gateway-chosen: `attachment; filename="..."` when the query parameter is
/// present, bare `attachment` otherwise.
pub async fn download_document(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(query): Query<DocumentQuery>,
) -> Result<Response, ApiError> {
    let disposition = content_disposition(query.filename.as_deref());
    serve(&state, state.documents.clone(), &id, Some(disposition)).await
}

pub async fn health() -> impl IntoResponse {
    (StatusCode::OK, "ok")
}

/// Shared pipeline tail: fetch, then relay the stream or normalize the
/// failure. Identical for both backends.
async fn serve(
    state: &AppState,
    backend: Arc<dyn FileBackend>,
    locator: &str,
    disposition: Option<HeaderValue>,
) -> Result<Response, ApiError> {
    match backend.fetch_stream(locator).await {
        Ok(UpstreamReply::File(file)) => {
            state.metrics.file_served();
            debug!(locator, status = %file.status, "Relaying upstream file");

            let mut overrides = HeaderMap::new();
            if let Some(value) = disposition {
                overrides.insert(header::CONTENT_DISPOSITION, value);
            }
            Ok(relay::relay(file, overrides))
        }
        Ok(UpstreamReply::Failed { status, payload }) => {
            state.metrics.upstream_failure();
            debug!(locator, %status, "Upstream reported failure");
            Err(ApiError::Upstream(normalize(&payload, status.as_u16())))
        }
        Err(err) => {
            match err {
                FetchError::Authorization(_) => state.metrics.auth_failure(),
                _ => state.metrics.upstream_failure(),
            }
            Err(err.into())
        }
    }
}

fn content_disposition(filename: Option<&str>) -> HeaderValue {
    match filename {
        Some(name) => HeaderValue::from_str(&format!("attachment; filename=\"{name}\""))
            .unwrap_or_else(|_| HeaderValue::from_static("attachment")),
        None => HeaderValue::from_static("attachment"),
    }
}
