use tracing::{debug, warn};

use super::distribution::{distribute, DEFAULT_DISTRIBUTION, MAX_RATING, MIN_RATING};
use super::domain::{
    DistributionRow, EstimationAlgorithm, EstimationResult, FormAnswers, PlatformEstimationConfig,
    TierBreakdown,
};
use super::EstimationError;

/// Runs the estimate for an already resolved configuration.
///
/// Custom platforms are delegated to their estimator and nothing else is evaluated.
pub fn estimate(
    config: &PlatformEstimationConfig,
    answers: &FormAnswers,
) -> Result<EstimationResult, EstimationError> {
    match &config.algorithm {
        EstimationAlgorithm::Custom(estimator) => {
            debug!(
                platform = %config.platform,
                estimator = estimator.name(),
                "delegating to custom estimator"
            );
            estimator.call(answers)
        }
        EstimationAlgorithm::Tiered => estimate_tiered(config, answers),
    }
}

fn estimate_tiered(
    config: &PlatformEstimationConfig,
    answers: &FormAnswers,
) -> Result<EstimationResult, EstimationError> {
    let total = total_objects(&config.object_count_fields, answers);
    let rating = complexity_rating(&config.complexity_field, answers)?;
    let row = distribution_row(config, rating);

    let counts = distribute(total, row)
        .or_else(|| {
            warn!(
                platform = %config.platform,
                rating,
                "distribution row is unusable, using the built-in row"
            );
            distribute(total, builtin_row(rating))
        })
        .unwrap_or_default();

    let tuning = &config.tuning;
    Ok(EstimationResult::priced(
        TierBreakdown::from_counts(counts),
        &tuning.hours_per_object,
        &tuning.hourly_rate,
    ))
}

/// Sum of the numeric answers in `fields`, floored and clamped at zero.
pub fn total_objects(fields: &[String], answers: &FormAnswers) -> u64 {
    let sum: f64 = fields
        .iter()
        .filter_map(|field| answers.get(field))
        .filter_map(|value| value.as_number())
        .sum();

    if sum.is_finite() && sum > 0.0 {
        // `as` saturates for values beyond u64::MAX.
        sum.floor() as u64
    } else {
        0
    }
}

/// Reads the complexity rating, truncating fractional input.
pub fn complexity_rating(field: &str, answers: &FormAnswers) -> Result<u8, EstimationError> {
    let raw = answers.get(field);
    let invalid = || EstimationError::InvalidComplexityRating {
        field: field.to_string(),
        value: raw.map(|value| value.to_string()),
    };

    let value = raw.and_then(|value| value.as_number()).ok_or_else(invalid)?;
    let rating = value.trunc();
    if rating < f64::from(MIN_RATING) || rating > f64::from(MAX_RATING) {
        return Err(invalid());
    }
    Ok(rating as u8)
}

fn distribution_row(config: &PlatformEstimationConfig, rating: u8) -> DistributionRow {
    config
        .tuning
        .distribution_weights
        .as_ref()
        .and_then(|weights| weights.get(&rating))
        .copied()
        .unwrap_or_else(|| builtin_row(rating))
}

fn builtin_row(rating: u8) -> DistributionRow {
    let index = usize::from(rating.clamp(MIN_RATING, MAX_RATING) - MIN_RATING);
    DEFAULT_DISTRIBUTION[index].1
}
