use std::borrow::Cow;

use super::domain::{ConfigOverride, EstimationTuning, PlatformEstimationConfig};
use super::store::{KeyValueStorage, OverrideStore};

/// Layers an override over a shipped default.
///
/// Without an override the default is handed back borrowed. With one, every key the
/// override carries replaces the shipped value in full and every missing key keeps
/// it. Fields describing what is measured are never touched.
pub fn resolve<'a>(
    default: &'a PlatformEstimationConfig,
    value: Option<&ConfigOverride>,
) -> Cow<'a, PlatformEstimationConfig> {
    let Some(value) = value else {
        return Cow::Borrowed(default);
    };

    let shipped = &default.tuning;
    let distribution_weights = value
        .distribution_weights
        .clone()
        .or_else(|| shipped.distribution_weights.clone());

    Cow::Owned(PlatformEstimationConfig {
        tuning: EstimationTuning {
            hours_per_object: value.hours_per_object.unwrap_or(shipped.hours_per_object),
            hourly_rate: value.hourly_rate.unwrap_or(shipped.hourly_rate),
            distribution_weights,
        },
        ..default.clone()
    })
}

/// Effective configuration for `default.platform` given what the store holds.
pub fn get_effective_config<'a, S: KeyValueStorage>(
    store: &OverrideStore<S>,
    default: &'a PlatformEstimationConfig,
) -> Cow<'a, PlatformEstimationConfig> {
    let value = store.get_override(&default.platform);
    resolve(default, value.as_ref())
}
