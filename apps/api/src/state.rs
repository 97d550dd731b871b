use std::sync::Arc;

use crate::config::Config;
use crate::dataset::DatasetStore;
use crate::llm_client::Narrator;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    /// Swappable handle to the current dataset; replaced wholesale on upload.
    pub datasets: DatasetStore,
    /// Pluggable narrative backend. Default: `GroqClient`; tests inject stubs.
    pub narrator: Arc<dyn Narrator>,
    pub config: Config,
}
