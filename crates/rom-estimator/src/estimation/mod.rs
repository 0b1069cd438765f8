//! Rough order of magnitude estimates for legacy platform migrations.
//!
//! Shipped per-platform defaults live in the [`PlatformCatalog`]. Administrators layer
//! [`ConfigOverride`]s over them through the [`OverrideStore`]; the resolver merges
//! both into the effective configuration that the algorithm prices answers against.

pub mod algorithm;
pub mod catalog;
pub mod distribution;
pub mod domain;
pub mod resolver;
pub mod router;
pub mod service;
pub mod store;
pub mod validation;

#[cfg(test)]
mod tests;

pub use algorithm::estimate;
pub use catalog::PlatformCatalog;
pub use distribution::{distribute, DEFAULT_DISTRIBUTION};
pub use domain::{
    AnswerValue, ConfigOverride, CostRange, CustomEstimator, DistributionRow,
    DistributionWeights, EffectiveConfigView, EstimationAlgorithm, EstimationError,
    EstimationResult, EstimationTuning, FormAnswers, HourlyRate, HoursPerObject,
    PlatformEstimationConfig, Tier, TierBreakdown,
};
pub use resolver::{get_effective_config, resolve};
pub use router::estimation_router;
pub use service::{EstimationService, OverrideError, PlatformSummary};
pub use store::{
    FileStorage, KeyValueStorage, MemoryStorage, OverrideMap, OverrideSnapshot, OverrideStore,
    StoreError, StoreIssue, OVERRIDES_STORAGE_KEY,
};
pub use validation::{validate_override, validate_platform, ConfigWarning};
