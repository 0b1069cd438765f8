use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

/// Complexity bucket an object is classified into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Tier {
    Simple,
    Medium,
    Complex,
    VeryComplex,
}

impl Tier {
    /// Declared order, also the tie-break order for rounding correction.
    pub const ALL: [Tier; 4] = [Tier::Simple, Tier::Medium, Tier::Complex, Tier::VeryComplex];

    pub const fn label(self) -> &'static str {
        match self {
            Tier::Simple => "simple",
            Tier::Medium => "medium",
            Tier::Complex => "complex",
            Tier::VeryComplex => "veryComplex",
        }
    }
}

/// Hours required per object for each tier.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HoursPerObject {
    pub simple: f64,
    pub medium: f64,
    pub complex: f64,
    pub very_complex: f64,
}

impl HoursPerObject {
    pub const fn get(&self, tier: Tier) -> f64 {
        match tier {
            Tier::Simple => self.simple,
            Tier::Medium => self.medium,
            Tier::Complex => self.complex,
            Tier::VeryComplex => self.very_complex,
        }
    }
}

/// Blended hourly rate band used to price the estimate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HourlyRate {
    pub low: f64,
    pub high: f64,
}

/// Percentages per tier in declared order: simple, medium, complex, veryComplex.
pub type DistributionRow = [f64; 4];

/// Complexity rating (1..=5) to tier split. Serialized with string keys in JSON.
pub type DistributionWeights = BTreeMap<u8, DistributionRow>;

/// Numeric tuning of a platform; the only part an override can replace.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EstimationTuning {
    pub hours_per_object: HoursPerObject,
    pub hourly_rate: HourlyRate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub distribution_weights: Option<DistributionWeights>,
}

/// Administrator supplied replacement for a platform's tuning.
///
/// Each present key replaces the shipped value in full; a missing key keeps the
/// shipped value. Entries written by older releases may carry only some keys.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigOverride {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hours_per_object: Option<HoursPerObject>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hourly_rate: Option<HourlyRate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub distribution_weights: Option<DistributionWeights>,
}

impl ConfigOverride {
    pub fn is_empty(&self) -> bool {
        self.hours_per_object.is_none()
            && self.hourly_rate.is_none()
            && self.distribution_weights.is_none()
    }
}

/// Single submitted form value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AnswerValue {
    Number(f64),
    Flag(bool),
    Text(String),
    Choices(Vec<String>),
    /// Explicit `null`, as sent for an empty number input.
    Null,
}

impl AnswerValue {
    /// Numeric reading of the answer. Numeric strings are accepted since form inputs
    /// often arrive as text.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            AnswerValue::Number(value) if value.is_finite() => Some(*value),
            AnswerValue::Text(raw) => raw.trim().parse::<f64>().ok().filter(|v| v.is_finite()),
            _ => None,
        }
    }

    pub fn is_checked(&self) -> bool {
        match self {
            AnswerValue::Flag(value) => *value,
            AnswerValue::Text(raw) => matches!(raw.trim(), "true" | "yes" | "on"),
            AnswerValue::Choices(items) => !items.is_empty(),
            AnswerValue::Number(value) => *value != 0.0,
            AnswerValue::Null => false,
        }
    }
}

impl fmt::Display for AnswerValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AnswerValue::Number(value) => write!(f, "{value}"),
            AnswerValue::Flag(value) => write!(f, "{value}"),
            AnswerValue::Text(value) => write!(f, "{value:?}"),
            AnswerValue::Choices(items) => write!(f, "[{}]", items.join(", ")),
            AnswerValue::Null => f.write_str("null"),
        }
    }
}

/// Raw answers keyed by form field name.
pub type FormAnswers = BTreeMap<String, AnswerValue>;

/// Object counts per tier.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TierBreakdown {
    pub simple: u64,
    pub medium: u64,
    pub complex: u64,
    pub very_complex: u64,
}

impl TierBreakdown {
    pub fn from_counts(counts: [u64; 4]) -> Self {
        let [simple, medium, complex, very_complex] = counts;
        Self {
            simple,
            medium,
            complex,
            very_complex,
        }
    }

    pub const fn get(&self, tier: Tier) -> u64 {
        match tier {
            Tier::Simple => self.simple,
            Tier::Medium => self.medium,
            Tier::Complex => self.complex,
            Tier::VeryComplex => self.very_complex,
        }
    }

    pub fn total(&self) -> u64 {
        Tier::ALL.iter().map(|tier| self.get(*tier)).sum()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct CostRange {
    pub low: f64,
    pub high: f64,
}

/// Estimate for one submission. Not persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EstimationResult {
    pub total_objects: u64,
    pub breakdown: TierBreakdown,
    pub estimated_hours: f64,
    pub estimated_cost: CostRange,
}

impl EstimationResult {
    pub fn priced(
        breakdown: TierBreakdown,
        hours_per_object: &HoursPerObject,
        rate: &HourlyRate,
    ) -> Self {
        let estimated_hours = Tier::ALL
            .iter()
            .map(|tier| breakdown.get(*tier) as f64 * hours_per_object.get(*tier))
            .sum::<f64>();

        Self {
            total_objects: breakdown.total(),
            breakdown,
            estimated_hours,
            estimated_cost: CostRange {
                low: estimated_hours * rate.low,
                high: estimated_hours * rate.high,
            },
        }
    }
}

type EstimatorFn = dyn Fn(&FormAnswers) -> Result<EstimationResult, EstimationError> + Send + Sync;

/// Platform specific calculation that replaces the tiered algorithm entirely.
#[derive(Clone)]
pub struct CustomEstimator {
    name: &'static str,
    func: Arc<EstimatorFn>,
}

impl CustomEstimator {
    pub fn new<F>(name: &'static str, func: F) -> Self
    where
        F: Fn(&FormAnswers) -> Result<EstimationResult, EstimationError> + Send + Sync + 'static,
    {
        Self {
            name,
            func: Arc::new(func),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn call(&self, answers: &FormAnswers) -> Result<EstimationResult, EstimationError> {
        (self.func)(answers)
    }
}

impl fmt::Debug for CustomEstimator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CustomEstimator")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

impl PartialEq for CustomEstimator {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name && Arc::ptr_eq(&self.func, &other.func)
    }
}

/// How a platform turns answers into an estimate.
#[derive(Debug, Clone, PartialEq)]
pub enum EstimationAlgorithm {
    Tiered,
    Custom(CustomEstimator),
}

impl EstimationAlgorithm {
    pub fn label(&self) -> &'static str {
        match self {
            EstimationAlgorithm::Tiered => "tiered",
            EstimationAlgorithm::Custom(_) => "custom",
        }
    }
}

/// Shipped configuration for one source platform.
#[derive(Debug, Clone, PartialEq)]
pub struct PlatformEstimationConfig {
    pub platform: String,
    pub label: String,
    pub object_count_fields: Vec<String>,
    pub complexity_field: String,
    pub tuning: EstimationTuning,
    pub algorithm: EstimationAlgorithm,
}

/// Serializable snapshot of an effective configuration for the admin page.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EffectiveConfigView {
    pub platform: String,
    pub label: String,
    pub algorithm: &'static str,
    pub object_count_fields: Vec<String>,
    pub complexity_field: String,
    #[serde(flatten)]
    pub tuning: EstimationTuning,
    pub overridden: bool,
}

impl EffectiveConfigView {
    pub fn new(config: &PlatformEstimationConfig, overridden: bool) -> Self {
        Self {
            platform: config.platform.clone(),
            label: config.label.clone(),
            algorithm: config.algorithm.label(),
            object_count_fields: config.object_count_fields.clone(),
            complexity_field: config.complexity_field.clone(),
            tuning: config.tuning.clone(),
            overridden,
        }
    }
}

/// Failures that abort a calculation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EstimationError {
    #[error("unsupported platform '{platform}'")]
    ConfigNotFound { platform: String },
    #[error("complexity rating in '{field}' must be between 1 and 5 (got {})", .value.as_deref().unwrap_or("nothing"))]
    InvalidComplexityRating {
        field: String,
        value: Option<String>,
    },
}
