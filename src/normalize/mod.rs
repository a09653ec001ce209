//! Upstream error normalization
//!
//! SharePoint (and S3-compatible frontends) return error bodies whose shape
//! is backend-specific and not guaranteed to be valid JSON. Every failure
//! leaving the gateway core is first converted into [`NormalizedError`]:
//! the status is always present, the message only when the payload matches
//! the known `odata.error` envelope.

use serde::{Deserialize, Serialize};

/// Sentinel status for failures with no HTTP status at all
/// (connection refused, DNS, TLS).
pub const TRANSPORT_SENTINEL_STATUS: u16 = 500;

/// The shape all upstream failures are reduced to before leaving the core.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NormalizedError {
    /// Human-readable message extracted from the payload, when recognized.
    pub error: Option<String>,
    /// Upstream HTTP status, or the 500 sentinel for transport failures.
    pub status: u16,
}

impl NormalizedError {
    /// Normalization for statusless transport failures. `code` carries the
    /// lower-level error code (io error kind) when one is available.
    pub fn transport(code: Option<String>) -> Self {
        Self {
            error: code,
            status: TRANSPORT_SENTINEL_STATUS,
        }
    }
}

/// Best-effort classification of an upstream error payload.
#[derive(Debug, PartialEq, Eq)]
enum ErrorShape {
    Recognized { message: String },
    Unrecognized,
}

#[derive(Deserialize)]
struct ODataEnvelope {
    #[serde(rename = "odata.error")]
    error: Option<ODataError>,
}

#[derive(Deserialize)]
struct ODataError {
    message: ODataMessage,
}

#[derive(Deserialize)]
struct ODataMessage {
    value: String,
}

fn parse_shape(payload: &[u8]) -> ErrorShape {
    match serde_json::from_slice::<ODataEnvelope>(payload) {
        Ok(ODataEnvelope { error: Some(err) }) => ErrorShape::Recognized {
            message: err.message.value,
        },
        _ => ErrorShape::Unrecognized,
    }
}

/// Reduce an upstream error payload to `{error, status}`.
///
/// Pure and total: malformed payloads degrade to `error: None`, the status
/// is surfaced regardless.
pub fn normalize(payload: &[u8], status: u16) -> NormalizedError {
    let error = match parse_shape(payload) {
        ErrorShape::Recognized { message } => Some(message),
        ErrorShape::Unrecognized => None,
    };
    NormalizedError { error, status }
}
