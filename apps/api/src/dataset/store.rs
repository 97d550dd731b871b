use std::path::Path;
use std::sync::{Arc, RwLock};

use tracing::info;

use crate::dataset::parse::parse_spreadsheet;
use crate::dataset::table::Dataset;
use crate::errors::AppError;

/// Process-wide handle to the current dataset.
///
/// Strategy: in-process cache behind a swappable handle, lost on restart,
/// falling back to the bundled default file when nothing has been uploaded.
/// Replacement is a single assignment, so a concurrent analyze sees either
/// the old table or the new one, never a partial mix.
#[derive(Clone, Default)]
pub struct DatasetStore {
    current: Arc<RwLock<Option<Arc<Dataset>>>>,
}

impl DatasetStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Swaps in a fully parsed dataset, replacing whatever was current.
    pub fn replace(&self, dataset: Dataset) {
        let mut guard = self.current.write().expect("dataset lock poisoned");
        *guard = Some(Arc::new(dataset));
    }

    pub fn current(&self) -> Option<Arc<Dataset>> {
        self.current.read().expect("dataset lock poisoned").clone()
    }

    /// Returns the cached dataset, loading the bundled default file on first
    /// use when no upload has happened yet.
    pub async fn load_or_default(&self, default_path: &Path) -> Result<Arc<Dataset>, AppError> {
        if let Some(dataset) = self.current() {
            return Ok(dataset);
        }

        let bytes = tokio::fs::read(default_path).await.map_err(|e| {
            AppError::DataUnavailable(format!(
                "no uploaded dataset and default file '{}' is unreadable: {e}",
                default_path.display()
            ))
        })?;
        let dataset = parse_spreadsheet(&bytes).map_err(|e| {
            AppError::DataUnavailable(format!("bundled default dataset failed to parse: {e}"))
        })?;
        info!(
            rows = dataset.row_count(),
            "loaded bundled default dataset from {}",
            default_path.display()
        );

        // An upload may have landed while the file was being read; keep it.
        let mut guard = self.current.write().expect("dataset lock poisoned");
        let cached = guard.get_or_insert_with(|| Arc::new(dataset));
        Ok(Arc::clone(cached))
    }
}
