//! Per-request upstream credential negotiation
//!
//! SharePoint Online does not accept basic auth on file endpoints. Each
//! request negotiates a short-lived claims token: a WS-Trust envelope goes
//! to the security token service, the returned binary token is posted to
//! the site's sign-in form, and the resulting `FedAuth`/`rtFa` cookies are
//! the authorization material. Nothing is cached across requests.

use async_trait::async_trait;
use axum::http::{HeaderMap, HeaderValue, header};
use thiserror::Error;
use tracing::debug;

/// Microsoft Online security token service, overridable for tests.
pub const DEFAULT_STS_URL: &str = "https://login.microsoftonline.com/extSTS.srf";

const SIGN_IN_PATH: &str = "/_forms/default.aspx?wctx=Login";

/// Static upstream credential pair, loaded once at startup and shared
/// read-only across requests.
#[derive(Debug, Clone)]
pub struct Identity {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("token service request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("token service rejected the credentials: {0}")]
    Rejected(String),

    #[error("security token missing from token service response")]
    MissingToken,

    #[error("authentication cookies missing from sign-in response")]
    MissingCookies,
}

/// Produces per-request authorization headers for an upstream resource.
///
/// `resource_url` must already be a syntactically valid upstream URL;
/// constructing it is the caller's job.
#[async_trait]
pub trait CredentialProvider: Send + Sync {
    async fn obtain_authorization(
        &self,
        resource_url: &str,
        identity: &Identity,
    ) -> Result<HeaderMap, AuthError>;
}

/// WS-Trust (SAML 1.1) negotiation against SharePoint Online.
pub struct SamlCredentialProvider {
    client: reqwest::Client,
    sts_url: String,
}

impl SamlCredentialProvider {
    pub fn new(sts_url: impl Into<String>) -> Result<Self, AuthError> {
        // The sign-in POST answers with the cookies on a 302; following it
        // would drop them.
        let client = reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .build()?;

        Ok(Self {
            client,
            sts_url: sts_url.into(),
        })
    }

    fn sign_in_url(resource_url: &str) -> Result<String, AuthError> {
        let url = reqwest::Url::parse(resource_url)
            .map_err(|_| AuthError::Rejected(format!("invalid resource url: {resource_url}")))?;
        let origin = url.origin().ascii_serialization();
        Ok(format!("{origin}{SIGN_IN_PATH}"))
    }
}

#[async_trait]
impl CredentialProvider for SamlCredentialProvider {
    async fn obtain_authorization(
        &self,
        resource_url: &str,
        identity: &Identity,
    ) -> Result<HeaderMap, AuthError> {
        let envelope = saml_request(&self.sts_url, resource_url, identity);

        debug!(sts = %self.sts_url, "Requesting security token");
        let sts_response = self
            .client
            .post(&self.sts_url)
            .header(header::CONTENT_TYPE, "application/soap+xml; charset=utf-8")
            .body(envelope)
            .send()
            .await?
            .text()
            .await?;

        if let Some(fault) = extract_between(&sts_response, "<psf:text>", "</psf:text>") {
            return Err(AuthError::Rejected(fault.trim().to_string()));
        }

        let token = extract_security_token(&sts_response).ok_or(AuthError::MissingToken)?;

        let sign_in_url = Self::sign_in_url(resource_url)?;
        debug!(url = %sign_in_url, "Posting security token to sign-in form");
        let sign_in = self
            .client
            .post(&sign_in_url)
            .body(token.to_string())
            .send()
            .await?;

        let fed_auth =
            cookie_value(sign_in.headers(), "FedAuth").ok_or(AuthError::MissingCookies)?;
        let rt_fa = cookie_value(sign_in.headers(), "rtFa").ok_or(AuthError::MissingCookies)?;

        let mut headers = HeaderMap::new();
        headers.insert(
            header::COOKIE,
            HeaderValue::from_str(&format!("FedAuth={fed_auth}; rtFa={rt_fa}"))
                .map_err(|_| AuthError::MissingCookies)?,
        );
        Ok(headers)
    }
}

/// WS-Trust RequestSecurityToken envelope scoped to the resource URL.
fn saml_request(sts_url: &str, endpoint: &str, identity: &Identity) -> String {
    let username = xml_escape(&identity.username);
    let password = xml_escape(&identity.password);
    let endpoint = xml_escape(endpoint);
    let sts = xml_escape(sts_url);

    format!(
        r#"<s:Envelope xmlns:s="http://www.w3.org/2003/05/soap-envelope" xmlns:a="http://www.w3.org/2005/08/addressing" xmlns:u="http://docs.oasis-open.org/wss/2004/01/oasis-200401-wss-wssecurity-utility-1.0.xsd">
  <s:Header>
    <a:Action s:mustUnderstand="1">http://schemas.xmlsoap.org/ws/2005/02/trust/RST/Issue</a:Action>
    <a:ReplyTo><a:Address>http://www.w3.org/2005/08/addressing/anonymous</a:Address></a:ReplyTo>
    <a:To s:mustUnderstand="1">{sts}</a:To>
    <o:Security s:mustUnderstand="1" xmlns:o="http://docs.oasis-open.org/wss/2004/01/oasis-200401-wss-wssecurity-secext-1.0.xsd">
      <o:UsernameToken>
        <o:Username>{username}</o:Username>
        <o:Password>{password}</o:Password>
      </o:UsernameToken>
    </o:Security>
  </s:Header>
  <s:Body>
    <t:RequestSecurityToken xmlns:t="http://schemas.xmlsoap.org/ws/2005/02/trust">
      <wsp:AppliesTo xmlns:wsp="http://schemas.xmlsoap.org/ws/2004/09/policy">
        <a:EndpointReference><a:Address>{endpoint}</a:Address></a:EndpointReference>
      </wsp:AppliesTo>
      <t:KeyType>http://schemas.xmlsoap.org/ws/2005/05/identity/NoProofKey</t:KeyType>
      <t:RequestType>http://schemas.xmlsoap.org/ws/2005/02/trust/Issue</t:RequestType>
      <t:TokenType>urn:oasis:names:tc:SAML:1.0:assertion</t:TokenType>
    </t:RequestSecurityToken>
  </s:Body>
</s:Envelope>"#
    )
}

fn xml_escape(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            other => escaped.push(other),
        }
    }
    escaped
}

/// Pulls the text content of the `BinarySecurityToken` element. The STS
/// response namespace prefix varies, so this matches on the local name.
fn extract_security_token(body: &str) -> Option<&str> {
    let start = body.find("BinarySecurityToken")?;
    let rest = &body[start..];
    let open = rest.find('>')?;
    let rest = &rest[open + 1..];
    let close = rest.find("</")?;
    let token = &rest[..close];
    if token.is_empty() { None } else { Some(token) }
}

fn extract_between<'a>(body: &'a str, open: &str, close: &str) -> Option<&'a str> {
    let start = body.find(open)? + open.len();
    let end = body[start..].find(close)? + start;
    Some(&body[start..end])
}

/// First `name=value` pair named `name` across all `Set-Cookie` headers,
/// attributes stripped.
fn cookie_value(headers: &HeaderMap, name: &str) -> Option<String> {
    for value in headers.get_all(header::SET_COOKIE) {
        let raw = value.to_str().ok()?;
        let pair = raw.split(';').next()?.trim();
        if let Some((key, val)) = pair.split_once('=') {
            if key == name {
                return Some(val.to_string());
            }
        }
    }
    None
}
