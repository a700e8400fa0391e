use std::sync::Arc;

use crate::config::ServerConfig;
use crate::proposer::MaskProposer;
use crate::storage::BlobStore;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// This is cheaply cloneable (inner data is behind `Arc` or is already `Clone`).
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub pool: segflow_db::DbPool,
    /// Server configuration.
    pub config: Arc<ServerConfig>,
    /// Blob store rooted at the media directory.
    pub store: Arc<dyn BlobStore>,
    /// Mask-proposal collaborator, absent when unconfigured.
    pub proposer: Option<Arc<dyn MaskProposer>>,
}
