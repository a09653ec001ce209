use super::models::{Config, StorageProvider};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("Storage provider is S3 but no bucket is configured")]
    MissingBucket,

    #[error("SharePoint site URL is not a valid http(s) URL: {url}")]
    InvalidSiteUrl { url: String },

    #[error("SharePoint credentials must include both username and password")]
    IncompleteSharePointCredentials,
}

/// Validate the entire configuration
pub fn validate(config: &Config) -> Result<(), ValidationError> {
    validate_storage(config)?;
    validate_sharepoint(config)?;
    Ok(())
}

fn validate_storage(config: &Config) -> Result<(), ValidationError> {
    if config.storage.provider == StorageProvider::S3 && config.storage.bucket.is_empty() {
        return Err(ValidationError::MissingBucket);
    }
    Ok(())
}

fn validate_sharepoint(config: &Config) -> Result<(), ValidationError> {
    let sharepoint = &config.sharepoint;

    if !sharepoint.site_url.is_empty() {
        let parsed = reqwest::Url::parse(&sharepoint.site_url);
        let valid = matches!(parsed, Ok(ref url) if url.scheme() == "http" || url.scheme() == "https");
        if !valid {
            return Err(ValidationError::InvalidSiteUrl {
                url: sharepoint.site_url.clone(),
            });
        }
    }

    if sharepoint.username.is_some() != sharepoint.password.is_some() {
        return Err(ValidationError::IncompleteSharePointCredentials);
    }

    Ok(())
}
