use std::sync::Arc;

use crate::backend::FileBackend;
use crate::config::Config;
use crate::observability::Metrics;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    /// Object-storage pipeline (static credentials)
    pub objects: Arc<dyn FileBackend>,
    /// Document-management pipeline (negotiated credentials)
    pub documents: Arc<dyn FileBackend>,
    pub metrics: Arc<Metrics>,
}

impl AppState {
    pub fn new(
        config: Config,
        objects: Arc<dyn FileBackend>,
        documents: Arc<dyn FileBackend>,
    ) -> Self {
        Self {
            config: Arc::new(config),
            objects,
            documents,
            metrics: Arc::new(Metrics::new()),
        }
    }
}
