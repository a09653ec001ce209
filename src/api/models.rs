use serde::Deserialize;

/// Query parameters accepted by the document download route
#[derive(Debug, Deserialize)]
pub struct DocumentQuery {
    /// Filename to advertise in the outbound `content-disposition`.
    /// Not needed by machine callers, but lets a browser save the file
    /// under a sensible name.
    pub filename: Option<String>,
}
