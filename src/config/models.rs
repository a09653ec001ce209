use serde::{Deserialize, Serialize};
use std::net::SocketAddr;

use crate::auth::DEFAULT_STS_URL;

/// Top-level configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub sharepoint: SharePointConfig,
}

/// Server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_bind_addr")]
    pub bind_addr: SocketAddr,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
        }
    }
}

fn default_bind_addr() -> SocketAddr {
    "0.0.0.0:8000".parse().unwrap()
}

/// Storage provider type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageProvider {
    S3,
    Memory,
}

/// Object storage backend configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StorageConfig {
    #[serde(default = "default_storage_provider")]
    pub provider: StorageProvider,
    #[serde(default)]
    pub bucket: String,
    #[serde(default = "default_region")]
    pub region: String,
    /// Custom endpoint for S3-compatible stores (MinIO, localstack)
    #[serde(default)]
    pub endpoint: Option<String>,
    /// Secrets: never read from TOML, only from the environment
    #[serde(default, skip_serializing)]
    pub access_key: Option<String>,
    #[serde(default, skip_serializing)]
    pub secret_key: Option<String>,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            provider: default_storage_provider(),
            bucket: String::new(),
            region: default_region(),
            endpoint: None,
            access_key: None,
            secret_key: None,
        }
    }
}

fn default_storage_provider() -> StorageProvider {
    StorageProvider::S3
}

fn default_region() -> String {
    "us-east-1".to_string()
}

/// Document service (SharePoint) configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SharePointConfig {
    /// Site root, e.g. `https://contoso.sharepoint.com/sites/ohub`
    #[serde(default)]
    pub site_url: String,
    /// Security token service endpoint; overridable for tests
    #[serde(default = "default_sts_url")]
    pub sts_url: String,
    #[serde(default, skip_serializing)]
    pub username: Option<String>,
    #[serde(default, skip_serializing)]
    pub password: Option<String>,
}

impl Default for SharePointConfig {
    fn default() -> Self {
        Self {
            site_url: String::new(),
            sts_url: default_sts_url(),
            username: None,
            password: None,
        }
    }
}

fn default_sts_url() -> String {
    DEFAULT_STS_URL.to_string()
}
