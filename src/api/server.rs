use std::net::SocketAddr;
use std::sync::Arc;

use axum::{Router, routing::get};
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::info;

use super::{
    services::{download_document, download_object, health},
    state::AppState,
};
use crate::auth::{Identity, SamlCredentialProvider};
use crate::backend::{ObjectStoreBackend, SharePointBackend};
use crate::config::Config;

type AnyError = Box<dyn std::error::Error + Send + Sync + 'static>;

pub async fn run(address: Option<SocketAddr>) -> Result<(), AnyError> {
    info!("Loading configuration");
    let config = Config::load().map_err(|e| format!("Failed to load config: {}", e))?;
    let address = address.unwrap_or(config.server.bind_addr);

    info!(bucket = %config.storage.bucket, "Initializing object storage backend");
    let objects = Arc::new(
        ObjectStoreBackend::from_config(&config.storage)
            .map_err(|e| format!("Failed to initialize object storage: {}", e))?,
    );

    info!(site = %config.sharepoint.site_url, "Initializing document backend");
    let identity = Identity {
        username: config
            .sharepoint
            .username
            .clone()
            .ok_or("SharePoint username is not configured (SP_USERNAME)")?,
        password: config
            .sharepoint
            .password
            .clone()
            .ok_or("SharePoint password is not configured (SP_PASSWORD)")?,
    };
    if config.sharepoint.site_url.is_empty() {
        return Err("SharePoint site URL is not configured (SP_SITE)".into());
    }
    let provider = Arc::new(SamlCredentialProvider::new(config.sharepoint.sts_url.clone())?);
    let documents = Arc::new(SharePointBackend::new(
        config.sharepoint.site_url.clone(),
        identity,
        provider,
    ));

    let state = AppState::new(config, objects, documents);

    let app = Router::new()
        .route("/s3download/{*key}", get(download_object))
        .route("/getspfile/{id}", get(download_document))
        .route("/health", get(health))
        .with_state(state)
        .layer(TraceLayer::new_for_http());

    let listener = TcpListener::bind(address).await?;
    info!(%address, "filegate listening");

    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};
        let mut sigterm = signal(SignalKind::terminate())
            .expect("failed to install signal handler");
        sigterm.recv().await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received");
}
