use sqlx::PgPool;
use std::sync::Arc;

use crate::services::InstagramPublisher;
use crate::storage::PhotoStorage;

/// Shared per-process handles, cloned into every handler. Cheap to clone:
/// pools and clients are internally reference-counted.
#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub storage: Arc<dyn PhotoStorage>,
    pub instagram: InstagramPublisher,
    /// Outbound client for lead webhooks.
    pub http: reqwest::Client,
}
