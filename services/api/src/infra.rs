use metrics_exporter_prometheus::PrometheusHandle;
use rom_estimator::config::StorageConfig;
use rom_estimator::error::AppError;
use rom_estimator::estimation::{EstimationService, FileStorage, PlatformCatalog};
use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use tracing::debug;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

pub(crate) type FileEstimationService = EstimationService<FileStorage>;

/// Shipped catalog backed by the override directory from configuration.
pub(crate) fn estimation_service(
    storage: &StorageConfig,
    overrides_dir: Option<PathBuf>,
) -> FileEstimationService {
    let root = overrides_dir.unwrap_or_else(|| storage.overrides_dir.clone());
    debug!(overrides_dir = %root.display(), "opening override storage");
    EstimationService::new(PlatformCatalog::standard(), FileStorage::new(root))
}

/// Reads a JSON document from disk, reporting decode failures as bad input.
pub(crate) fn read_json_file<T>(path: &Path) -> Result<T, AppError>
where
    T: DeserializeOwned,
{
    let raw = std::fs::read_to_string(path)?;
    serde_json::from_str(&raw)
        .map_err(|err| AppError::Input(format!("{} is not valid: {err}", path.display())))
}
