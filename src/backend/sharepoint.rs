//! SharePoint document backend
//!
//! Locators are document GUIDs; the file lives behind
//! `{site}/_api/web/GetFileById('{id}')/$value` and every request carries
//! freshly negotiated claims cookies.

use async_trait::async_trait;
use axum::http::{HeaderMap, HeaderValue, header};
use bytes::Bytes;
use futures::{StreamExt, TryStreamExt};
use std::sync::Arc;
use tracing::{debug, warn};

use super::traits::FileBackend;
use super::types::{FetchError, UpstreamFile, UpstreamReply};
use crate::auth::{CredentialProvider, Identity};

/// Forced on every upstream request so failure bodies come back as JSON the
/// normalizer can read.
const ACCEPT_JSON_ERRORS: &str = "application/json;odata=nometadata";

pub struct SharePointBackend {
    client: reqwest::Client,
    site_url: String,
    identity: Identity,
    provider: Arc<dyn CredentialProvider>,
}

impl SharePointBackend {
    pub fn new(
        site_url: impl Into<String>,
        identity: Identity,
        provider: Arc<dyn CredentialProvider>,
    ) -> Self {
        let site_url = site_url.into().trim_end_matches('/').to_string();
        Self {
            // No request timeout: downloads may legitimately run long and
            // the client aborts by dropping the stream.
            client: reqwest::Client::new(),
            site_url,
            identity,
            provider,
        }
    }

    fn document_url(&self, id: &str) -> String {
        format!("{}/_api/web/GetFileById('{}')/$value", self.site_url, id)
    }
}

#[async_trait]
impl FileBackend for SharePointBackend {
    async fn authorize(&self, locator: &str) -> Result<HeaderMap, FetchError> {
        let url = self.document_url(locator);
        let mut headers = self
            .provider
            .obtain_authorization(&url, &self.identity)
            .await?;
        headers.insert(header::ACCEPT, HeaderValue::from_static(ACCEPT_JSON_ERRORS));
        Ok(headers)
    }

    async fn fetch_stream(&self, locator: &str) -> Result<UpstreamReply, FetchError> {
        let headers = self.authorize(locator).await?;
        let url = self.document_url(locator);

        debug!(%url, "Fetching document");
        let response = self
            .client
            .get(&url)
            .headers(headers)
            .send()
            .await
            .map_err(FetchError::Transport)?;

        let status = response.status();
        if status.as_u16() < 300 {
            let headers = response.headers().clone();
            let body = response
                .bytes_stream()
                .map_err(FetchError::Transport)
                .boxed();
            Ok(UpstreamReply::File(UpstreamFile {
                status,
                headers,
                body,
            }))
        } else {
            // The body is an error payload; collect it for the normalizer. A
            // read failure here still surfaces the upstream status, just
            // without a message to extract.
            let payload = match response.bytes().await {
                Ok(payload) => payload,
                Err(err) => {
                    warn!(%status, error = %err, "Could not read upstream error payload");
                    Bytes::new()
                }
            };
            Ok(UpstreamReply::Failed { status, payload })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::AuthError;

    struct NoopProvider;

    #[async_trait]
    impl CredentialProvider for NoopProvider {
        async fn obtain_authorization(
            &self,
            _resource_url: &str,
            _identity: &Identity,
        ) -> Result<HeaderMap, AuthError> {
            Ok(HeaderMap::new())
        }
    }

    fn backend(site_url: &str) -> SharePointBackend {
        SharePointBackend::new(
            site_url,
            Identity {
                username: "svc@contoso.com".into(),
                password: "secret".into(),
            },
            Arc::new(NoopProvider),
        )
    }

    #[test]
    fn builds_document_url_from_guid() {
        let backend = backend("https://contoso.sharepoint.com/sites/ohub");
        assert_eq!(
            backend.document_url("f3a1"),
            "https://contoso.sharepoint.com/sites/ohub/_api/web/GetFileById('f3a1')/$value"
        );
    }

    #[test]
    fn trailing_slash_is_trimmed() {
        let backend = backend("https://contoso.sharepoint.com/");
        assert_eq!(
            backend.document_url("f3a1"),
            "https://contoso.sharepoint.com/_api/web/GetFileById('f3a1')/$value"
        );
    }

    #[tokio::test]
    async fn authorize_forces_json_error_format() {
        let backend = backend("https://contoso.sharepoint.com");
        let headers = backend.authorize("f3a1").await.unwrap();
        assert_eq!(
            headers[header::ACCEPT],
            "application/json;odata=nometadata"
        );
    }
}
