use std::sync::Arc;

use crate::config::GalleryConfig;
use crate::store::ProfileStore;

pub mod middleware;
pub mod routes;

/// Shared application state: the configuration plus the cached profile store.
/// Cloning is cheap; both fields are reference counted.
#[derive(Clone)]
pub struct GalleryState {
    pub config: Arc<GalleryConfig>,
    pub store: ProfileStore,
}

impl GalleryState {
    pub fn new(config: GalleryConfig) -> Self {
        let store = ProfileStore::new(config.source_path.clone(), config.columns.clone());
        GalleryState {
            config: Arc::new(config),
            store,
        }
    }
}
