//! Response relay
//!
//! Copies the allow-listed upstream headers onto the outbound response and
//! streams the body through verbatim. Nothing outside the allow-list ever
//! crosses the boundary, which keeps upstream infrastructure headers
//! (request ids, server banners, cookies) from leaking to clients.

use axum::body::Body;
use axum::http::{HeaderMap, HeaderName, header};
use axum::response::Response;

use crate::backend::UpstreamFile;

/// Headers permitted to cross from upstream to the outbound response.
pub const ALLOWED_HEADERS: [HeaderName; 4] = [
    header::CONTENT_TYPE,
    header::CONTENT_LENGTH,
    header::LAST_MODIFIED,
    header::CONTENT_DISPOSITION,
];

/// Build the outbound response for an upstream file.
///
/// Allow-listed headers are copied first, then `overrides` are inserted on
/// top, so overrides win. The header set is complete before the body is
/// attached and is never touched again once streaming starts.
pub fn relay(file: UpstreamFile, overrides: HeaderMap) -> Response {
    let mut headers = HeaderMap::new();
    for name in &ALLOWED_HEADERS {
        if let Some(value) = file.headers.get(name) {
            headers.insert(name.clone(), value.clone());
        }
    }
    for (name, value) in overrides.iter() {
        headers.insert(name.clone(), value.clone());
    }

    let mut response = Response::new(Body::from_stream(file.body));
    *response.status_mut() = file.status;
    *response.headers_mut() = headers;
    response
}
