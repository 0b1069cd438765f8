use std::borrow::Cow;

use super::common::*;
use crate::estimation::domain::{
    ConfigOverride, CustomEstimator, DistributionWeights, EstimationAlgorithm, HourlyRate,
    HoursPerObject, TierBreakdown,
};
use crate::estimation::store::{MemoryStorage, OverrideStore};
use crate::estimation::{estimate, get_effective_config, resolve};

#[test]
fn no_override_returns_the_default_itself() {
    let default = scenario_config();

    let resolved = resolve(&default, None);

    assert!(matches!(resolved, Cow::Borrowed(_)));
    assert!(std::ptr::eq(&*resolved, &default));
    assert_eq!(*resolved, default);
}

#[test]
fn rate_override_keeps_shipped_hours_and_distribution() {
    let default = scenario_config();
    let value = rate_override(150.0, 150.0);

    let effective = resolve(&default, Some(&value));

    assert_eq!(effective.tuning.hourly_rate, HourlyRate { low: 150.0, high: 150.0 });
    assert_eq!(
        effective.tuning.hours_per_object,
        default.tuning.hours_per_object
    );
    assert_eq!(
        effective.tuning.distribution_weights,
        default.tuning.distribution_weights
    );

    let result = estimate(&effective, &scenario_answers(60.0, 40.0, 3.0)).expect("valid answers");
    assert_eq!(result.estimated_cost.low, result.estimated_cost.high);
    assert_close(result.estimated_cost.low, 600.0 * 150.0);
}

#[test]
fn override_hours_replace_the_whole_tier_table() {
    let default = scenario_config();
    let value = ConfigOverride {
        hours_per_object: Some(HoursPerObject {
            simple: 1.0,
            medium: 1.0,
            complex: 1.0,
            very_complex: 1.0,
        }),
        hourly_rate: Some(HourlyRate {
            low: 100.0,
            high: 200.0,
        }),
        distribution_weights: None,
    };

    let effective = resolve(&default, Some(&value));
    let result = estimate(&effective, &scenario_answers(100.0, 0.0, 3.0)).expect("valid answers");

    assert_close(result.estimated_hours, 100.0);
}

#[test]
fn override_distribution_replaces_rather_than_merges() {
    let mut default = scenario_config();
    default.tuning.distribution_weights = Some(DistributionWeights::from([
        (1, [10.0, 20.0, 30.0, 40.0]),
        (3, [10.0, 20.0, 30.0, 40.0]),
    ]));
    let mut value = rate_override(100.0, 200.0);
    value.distribution_weights = Some(DistributionWeights::from([(1, [100.0, 0.0, 0.0, 0.0])]));

    let effective = resolve(&default, Some(&value));

    assert_eq!(
        effective.tuning.distribution_weights,
        Some(DistributionWeights::from([(1, [100.0, 0.0, 0.0, 0.0])]))
    );
    // Rating 3 is gone from the table, so the built-in row applies.
    let result = estimate(&effective, &scenario_answers(100.0, 0.0, 3.0)).expect("valid answers");
    assert_eq!(result.breakdown, TierBreakdown::from_counts([40, 30, 20, 10]));
}

#[test]
fn structural_fields_are_never_overridden() {
    let mut default = scenario_config();
    default.algorithm = EstimationAlgorithm::Custom(CustomEstimator::new("noop", |_| {
        Ok(crate::estimation::EstimationResult {
            total_objects: 0,
            breakdown: TierBreakdown::default(),
            estimated_hours: 0.0,
            estimated_cost: Default::default(),
        })
    }));

    let effective = resolve(&default, Some(&rate_override(1.0, 2.0)));

    assert!(matches!(effective, Cow::Owned(_)));
    assert_eq!(effective.platform, default.platform);
    assert_eq!(effective.label, default.label);
    assert_eq!(effective.object_count_fields, default.object_count_fields);
    assert_eq!(effective.complexity_field, default.complexity_field);
    assert_eq!(effective.algorithm, default.algorithm);
}

#[test]
fn effective_config_reads_the_store() {
    let store = OverrideStore::new(MemoryStorage::default());
    let default = scenario_config();

    assert!(matches!(
        get_effective_config(&store, &default),
        Cow::Borrowed(_)
    ));

    store
        .save_override("legacy-crm", rate_override(175.0, 260.0))
        .expect("save succeeds");
    let effective = get_effective_config(&store, &default);
    assert_eq!(effective.tuning.hourly_rate.high, 260.0);

    store
        .save_override("other-platform", rate_override(1.0, 1.0))
        .expect("save succeeds");
    store.remove_override("legacy-crm").expect("remove succeeds");
    assert!(matches!(
        get_effective_config(&store, &default),
        Cow::Borrowed(_)
    ));
}

#[test]
fn partial_override_keeps_shipped_values_for_missing_keys() {
    let default = scenario_config();
    let value = ConfigOverride {
        hourly_rate: Some(HourlyRate {
            low: 150.0,
            high: 150.0,
        }),
        ..ConfigOverride::default()
    };

    let effective = resolve(&default, Some(&value));

    assert_eq!(effective.tuning.hourly_rate, HourlyRate { low: 150.0, high: 150.0 });
    assert_eq!(
        effective.tuning.hours_per_object,
        default.tuning.hours_per_object
    );
    assert_eq!(
        effective.tuning.distribution_weights,
        default.tuning.distribution_weights
    );
}
