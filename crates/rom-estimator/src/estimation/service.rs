use std::borrow::Cow;

use serde::Serialize;
use tracing::{info, warn};

use super::algorithm;
use super::catalog::PlatformCatalog;
use super::domain::{
    ConfigOverride, EffectiveConfigView, EstimationAlgorithm, EstimationError,
    EstimationResult, FormAnswers, PlatformEstimationConfig,
};
use super::resolver::get_effective_config;
use super::store::{KeyValueStorage, OverrideMap, OverrideSnapshot, OverrideStore, StoreError};
use super::validation::{validate_override, ConfigWarning};

/// Service composing the shipped catalog, the override store, and the algorithm.
pub struct EstimationService<S> {
    catalog: PlatformCatalog,
    store: OverrideStore<S>,
}

impl<S> EstimationService<S>
where
    S: KeyValueStorage + 'static,
{
    pub fn new(catalog: PlatformCatalog, storage: S) -> Self {
        catalog.validate();
        Self {
            catalog,
            store: OverrideStore::new(storage),
        }
    }

    pub fn catalog(&self) -> &PlatformCatalog {
        &self.catalog
    }

    pub fn store(&self) -> &OverrideStore<S> {
        &self.store
    }

    /// Estimate for `platform` using its effective configuration.
    pub fn estimate(
        &self,
        platform: &str,
        answers: &FormAnswers,
    ) -> Result<EstimationResult, EstimationError> {
        let effective = self.effective_config(platform)?;
        let result = algorithm::estimate(&effective, answers)?;
        info!(
            %platform,
            total_objects = result.total_objects,
            estimated_hours = result.estimated_hours,
            "estimate computed"
        );
        Ok(result)
    }

    pub fn effective_config(
        &self,
        platform: &str,
    ) -> Result<Cow<'_, PlatformEstimationConfig>, EstimationError> {
        let default = self.catalog.get(platform)?;
        Ok(get_effective_config(&self.store, default))
    }

    pub fn effective_config_view(
        &self,
        platform: &str,
    ) -> Result<EffectiveConfigView, EstimationError> {
        let effective = self.effective_config(platform)?;
        let overridden = matches!(effective, Cow::Owned(_));
        Ok(EffectiveConfigView::new(&effective, overridden))
    }

    pub fn platforms(&self) -> Vec<PlatformSummary> {
        let overrides = self.store.get_all_overrides();
        self.catalog
            .platforms()
            .map(|config| PlatformSummary {
                platform: config.platform.clone(),
                label: config.label.clone(),
                algorithm: config.algorithm.label(),
                overridden: overrides.contains_key(&config.platform),
            })
            .collect()
    }

    pub fn overrides(&self) -> OverrideMap {
        self.store.get_all_overrides()
    }

    pub fn override_for(&self, platform: &str) -> Result<Option<ConfigOverride>, EstimationError> {
        self.catalog.get(platform)?;
        Ok(self.store.get_override(platform))
    }

    /// Stores an override after checking the platform exists. Validation findings are
    /// returned for display and never block the save.
    pub fn save_override(
        &self,
        platform: &str,
        value: ConfigOverride,
    ) -> Result<Vec<ConfigWarning>, OverrideError> {
        let default = self.catalog.get(platform)?;
        let mut warnings = validate_override(&value);
        if let EstimationAlgorithm::Custom(estimator) = &default.algorithm {
            warnings.push(ConfigWarning::IgnoredByCustomAlgorithm {
                estimator: estimator.name().to_string(),
            });
        }
        for warning in &warnings {
            warn!(%platform, %warning, "override saved with warning");
        }
        self.store.save_override(platform, value)?;
        info!(%platform, "configuration override saved");
        Ok(warnings)
    }

    pub fn remove_override(&self, platform: &str) -> Result<(), OverrideError> {
        self.catalog.get(platform)?;
        self.store.remove_override(platform)?;
        info!(%platform, "configuration override reverted");
        Ok(())
    }

    pub fn clear_overrides(&self) -> Result<(), OverrideError> {
        self.store.clear_all_overrides()?;
        info!("all configuration overrides cleared");
        Ok(())
    }

    /// Stored overrides along with every entry or record that had to be skipped.
    pub fn inspect_overrides(&self) -> OverrideSnapshot {
        self.store.inspect()
    }

    pub fn validate_catalog(&self) -> Vec<(String, ConfigWarning)> {
        self.catalog.validate()
    }
}

/// Platform listing entry for the admin page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlatformSummary {
    pub platform: String,
    pub label: String,
    pub algorithm: &'static str,
    pub overridden: bool,
}

/// Error raised by the administrative override operations.
#[derive(Debug, thiserror::Error)]
pub enum OverrideError {
    #[error(transparent)]
    Estimation(#[from] EstimationError),
    #[error(transparent)]
    Store(#[from] StoreError),
}
