use serde::Serialize;

use super::distribution::{row_is_usable, row_sum, MAX_RATING, MIN_RATING, ROW_SUM_TOLERANCE};
use super::domain::{
    ConfigOverride, DistributionWeights, HourlyRate, HoursPerObject, PlatformEstimationConfig,
};

/// Advisory findings. None of these block a calculation.
#[derive(Debug, Clone, PartialEq, Serialize, thiserror::Error)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum ConfigWarning {
    #[error("distribution for rating {rating} sums to {sum}%, expected 100%")]
    DistributionMismatch { rating: u8, sum: f64 },
    #[error("distribution for rating {rating} has negative or non-numeric weights and is ignored")]
    UnusableWeights { rating: u8 },
    #[error("distribution defines rating {rating}, outside 1..=5")]
    UnknownRating { rating: u8 },
    #[error("hours per object should not decrease from simple to veryComplex")]
    TierOrdering,
    #[error("hourly rate low ({low}) exceeds high ({high})")]
    RateOrdering { low: f64, high: f64 },
    #[error("{field} must be positive")]
    NonPositive { field: &'static str },
    #[error("no object count fields configured")]
    EmptyObjectCountFields,
    #[error("platform is priced by the '{estimator}' estimator, which ignores tuning overrides")]
    IgnoredByCustomAlgorithm { estimator: String },
}

pub fn validate_platform(config: &PlatformEstimationConfig) -> Vec<ConfigWarning> {
    let mut warnings = Vec::new();
    if config.object_count_fields.is_empty() {
        warnings.push(ConfigWarning::EmptyObjectCountFields);
    }
    check_hours(&config.tuning.hours_per_object, &mut warnings);
    check_rate(&config.tuning.hourly_rate, &mut warnings);
    if let Some(weights) = &config.tuning.distribution_weights {
        check_distribution(weights, &mut warnings);
    }
    warnings
}

pub fn validate_override(value: &ConfigOverride) -> Vec<ConfigWarning> {
    let mut warnings = Vec::new();
    if let Some(hours) = &value.hours_per_object {
        check_hours(hours, &mut warnings);
    }
    if let Some(rate) = &value.hourly_rate {
        check_rate(rate, &mut warnings);
    }
    if let Some(weights) = &value.distribution_weights {
        check_distribution(weights, &mut warnings);
    }
    warnings
}

fn check_hours(hours: &HoursPerObject, warnings: &mut Vec<ConfigWarning>) {
    let tiers = [
        ("hoursPerObject.simple", hours.simple),
        ("hoursPerObject.medium", hours.medium),
        ("hoursPerObject.complex", hours.complex),
        ("hoursPerObject.veryComplex", hours.very_complex),
    ];
    for (field, value) in tiers {
        if !is_positive(value) {
            warnings.push(ConfigWarning::NonPositive { field });
        }
    }

    let ordered = hours.simple <= hours.medium
        && hours.medium <= hours.complex
        && hours.complex <= hours.very_complex;
    if !ordered {
        warnings.push(ConfigWarning::TierOrdering);
    }
}

fn check_rate(rate: &HourlyRate, warnings: &mut Vec<ConfigWarning>) {
    if !is_positive(rate.low) {
        warnings.push(ConfigWarning::NonPositive {
            field: "hourlyRate.low",
        });
    }
    if !is_positive(rate.high) {
        warnings.push(ConfigWarning::NonPositive {
            field: "hourlyRate.high",
        });
    }
    if rate.low > rate.high {
        warnings.push(ConfigWarning::RateOrdering {
            low: rate.low,
            high: rate.high,
        });
    }
}

fn is_positive(value: f64) -> bool {
    value.is_finite() && value > 0.0
}

fn check_distribution(weights: &DistributionWeights, warnings: &mut Vec<ConfigWarning>) {
    for (rating, row) in weights {
        if !(MIN_RATING..=MAX_RATING).contains(rating) {
            warnings.push(ConfigWarning::UnknownRating { rating: *rating });
            continue;
        }
        if !row_is_usable(row) {
            warnings.push(ConfigWarning::UnusableWeights { rating: *rating });
            continue;
        }
        let sum = row_sum(row);
        if (sum - 100.0).abs() > ROW_SUM_TOLERANCE {
            warnings.push(ConfigWarning::DistributionMismatch {
                rating: *rating,
                sum,
            });
        }
    }
}
