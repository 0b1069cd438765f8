use std::collections::BTreeMap;

use tracing::warn;

use super::distribution::{MAX_RATING, MIN_RATING};
use super::domain::{
    AnswerValue, CostRange, CustomEstimator, DistributionWeights, EstimationAlgorithm,
    EstimationError, EstimationResult, EstimationTuning, FormAnswers, HourlyRate, HoursPerObject,
    PlatformEstimationConfig, Tier, TierBreakdown,
};
use super::validation::{validate_platform, ConfigWarning};

/// Compiled-in configurations for every supported source platform.
#[derive(Debug, Clone)]
pub struct PlatformCatalog {
    platforms: BTreeMap<String, PlatformEstimationConfig>,
}

impl PlatformCatalog {
    pub fn standard() -> Self {
        Self::from_configs(standard_platforms())
    }

    pub fn from_configs(configs: impl IntoIterator<Item = PlatformEstimationConfig>) -> Self {
        let platforms = configs
            .into_iter()
            .map(|config| (config.platform.clone(), config))
            .collect();
        Self { platforms }
    }

    /// Shipped default for `platform`; unknown slugs are an error, never a fallback.
    pub fn get(&self, platform: &str) -> Result<&PlatformEstimationConfig, EstimationError> {
        self.platforms
            .get(platform)
            .ok_or_else(|| EstimationError::ConfigNotFound {
                platform: platform.to_string(),
            })
    }

    pub fn contains(&self, platform: &str) -> bool {
        self.platforms.contains_key(platform)
    }

    pub fn platforms(&self) -> impl Iterator<Item = &PlatformEstimationConfig> {
        self.platforms.values()
    }

    /// Runs the advisory checks over every shipped config and logs what it finds.
    pub fn validate(&self) -> Vec<(String, ConfigWarning)> {
        let mut findings = Vec::new();
        for config in self.platforms.values() {
            for warning in validate_platform(config) {
                warn!(platform = %config.platform, %warning, "shipped configuration warning");
                findings.push((config.platform.clone(), warning));
            }
        }
        findings
    }
}

fn standard_platforms() -> Vec<PlatformEstimationConfig> {
    vec![
        tiered(
            "lotus-notes",
            "HCL / Lotus Notes",
            &["formCount", "viewCount", "agentCount", "scriptLibraryCount"],
            "complexityRating",
            EstimationTuning {
                hours_per_object: hours(2.0, 4.0, 8.0, 16.0),
                hourly_rate: HourlyRate {
                    low: 100.0,
                    high: 200.0,
                },
                distribution_weights: None,
            },
        ),
        tiered(
            "ms-access",
            "Microsoft Access",
            &[
                "tableCount",
                "queryCount",
                "formCount",
                "reportCount",
                "macroCount",
                "moduleCount",
            ],
            "complexityRating",
            EstimationTuning {
                hours_per_object: hours(1.5, 3.0, 6.0, 12.0),
                hourly_rate: HourlyRate {
                    low: 90.0,
                    high: 175.0,
                },
                // Access estates skew towards trivial tables and saved queries.
                distribution_weights: Some(DistributionWeights::from([
                    (1, [80.0, 15.0, 5.0, 0.0]),
                    (2, [60.0, 25.0, 10.0, 5.0]),
                ])),
            },
        ),
        tiered(
            "sharepoint-2013",
            "SharePoint 2013",
            &[
                "siteCount",
                "listCount",
                "libraryCount",
                "workflowCount",
                "webPartCount",
            ],
            "customizationLevel",
            EstimationTuning {
                hours_per_object: hours(1.0, 3.0, 6.0, 14.0),
                hourly_rate: HourlyRate {
                    low: 110.0,
                    high: 210.0,
                },
                distribution_weights: None,
            },
        ),
        tiered(
            "filemaker",
            "Claris FileMaker",
            &["tableCount", "layoutCount", "scriptCount"],
            "complexityRating",
            EstimationTuning {
                hours_per_object: hours(2.0, 5.0, 10.0, 20.0),
                hourly_rate: HourlyRate {
                    low: 95.0,
                    high: 185.0,
                },
                distribution_weights: Some(DistributionWeights::from([
                    (4, [20.0, 30.0, 30.0, 20.0]),
                    (5, [5.0, 20.0, 40.0, 35.0]),
                ])),
            },
        ),
        PlatformEstimationConfig {
            platform: "infopath".to_string(),
            label: "Microsoft InfoPath".to_string(),
            object_count_fields: vec!["formTemplateCount".to_string()],
            complexity_field: "complexityRating".to_string(),
            tuning: EstimationTuning {
                hours_per_object: hours(4.0, 8.0, 16.0, 32.0),
                hourly_rate: INFOPATH_RATE,
                distribution_weights: None,
            },
            algorithm: EstimationAlgorithm::Custom(CustomEstimator::new(
                "infopath-forms",
                estimate_infopath,
            )),
        },
    ]
}

fn tiered(
    platform: &str,
    label: &str,
    object_count_fields: &[&str],
    complexity_field: &str,
    tuning: EstimationTuning,
) -> PlatformEstimationConfig {
    PlatformEstimationConfig {
        platform: platform.to_string(),
        label: label.to_string(),
        object_count_fields: object_count_fields
            .iter()
            .map(|field| field.to_string())
            .collect(),
        complexity_field: complexity_field.to_string(),
        tuning,
        algorithm: EstimationAlgorithm::Tiered,
    }
}

const fn hours(simple: f64, medium: f64, complex: f64, very_complex: f64) -> HoursPerObject {
    HoursPerObject {
        simple,
        medium,
        complex,
        very_complex,
    }
}

const INFOPATH_RATE: HourlyRate = HourlyRate {
    low: 120.0,
    high: 220.0,
};

/// Base rebuild hours per form template, indexed by rating.
const INFOPATH_BASE_HOURS: [f64; 5] = [4.0, 8.0, 16.0, 28.0, 40.0];

/// Checkbox values in `features` and the uplift each adds to every form.
const INFOPATH_FEATURE_UPLIFT: [(&str, f64); 4] = [
    ("dataConnections", 0.15),
    ("repeatingSections", 0.10),
    ("workflowIntegration", 0.25),
    ("codeBehind", 0.40),
];

/// InfoPath forms are rebuilt one template at a time, so every form lands in the
/// tier matching the rating and feature checkboxes add a per-form uplift.
fn estimate_infopath(answers: &FormAnswers) -> Result<EstimationResult, EstimationError> {
    let forms = answers
        .get("formTemplateCount")
        .and_then(AnswerValue::as_number)
        .filter(|count| *count > 0.0)
        .map(|count| count.floor() as u64)
        .unwrap_or(0);

    let rating = answers
        .get("complexityRating")
        .and_then(AnswerValue::as_number)
        .map(f64::trunc)
        .filter(|rating| (f64::from(MIN_RATING)..=f64::from(MAX_RATING)).contains(rating))
        .ok_or_else(|| EstimationError::InvalidComplexityRating {
            field: "complexityRating".to_string(),
            value: answers.get("complexityRating").map(|value| value.to_string()),
        })? as usize;

    let selected: Vec<&str> = match answers.get("features") {
        Some(AnswerValue::Choices(items)) => items.iter().map(String::as_str).collect(),
        Some(AnswerValue::Text(item)) => vec![item.as_str()],
        _ => Vec::new(),
    };
    let uplift: f64 = INFOPATH_FEATURE_UPLIFT
        .iter()
        .filter(|(feature, _)| selected.contains(feature))
        .map(|(_, uplift)| uplift)
        .sum();

    let tier = match rating {
        1 => Tier::Simple,
        2 => Tier::Medium,
        3 => Tier::Complex,
        _ => Tier::VeryComplex,
    };
    let mut counts = [0u64; 4];
    counts[tier as usize] = forms;

    let estimated_hours = forms as f64 * INFOPATH_BASE_HOURS[rating - 1] * (1.0 + uplift);
    Ok(EstimationResult {
        total_objects: forms,
        breakdown: TierBreakdown::from_counts(counts),
        estimated_hours,
        estimated_cost: CostRange {
            low: estimated_hours * INFOPATH_RATE.low,
            high: estimated_hours * INFOPATH_RATE.high,
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_platform_is_an_error() {
        let catalog = PlatformCatalog::standard();
        assert_eq!(
            catalog.get("lotus-domino-9").unwrap_err(),
            EstimationError::ConfigNotFound {
                platform: "lotus-domino-9".to_string()
            }
        );
    }

    #[test]
    fn shipped_catalog_passes_validation() {
        assert!(PlatformCatalog::standard().validate().is_empty());
    }

    #[test]
    fn lists_platforms_in_slug_order() {
        let catalog = PlatformCatalog::standard();
        let slugs: Vec<&str> = catalog
            .platforms()
            .map(|config| config.platform.as_str())
            .collect();
        assert_eq!(
            slugs,
            vec![
                "filemaker",
                "infopath",
                "lotus-notes",
                "ms-access",
                "sharepoint-2013"
            ]
        );
    }

    #[test]
    fn infopath_prices_forms_with_feature_uplift() {
        let answers = FormAnswers::from([
            ("formTemplateCount".to_string(), AnswerValue::Number(10.0)),
            ("complexityRating".to_string(), AnswerValue::Text("2".to_string())),
            (
                "features".to_string(),
                AnswerValue::Choices(vec![
                    "codeBehind".to_string(),
                    "dataConnections".to_string(),
                    "unknownFeature".to_string(),
                ]),
            ),
        ]);

        let result = estimate_infopath(&answers).expect("valid answers");

        assert_eq!(result.total_objects, 10);
        assert_eq!(result.breakdown.medium, 10);
        // 10 forms * 8h * 1.55
        assert!((result.estimated_hours - 124.0).abs() < 1e-9);
        assert!((result.estimated_cost.low - 124.0 * 120.0).abs() < 1e-6);
        assert!((result.estimated_cost.high - 124.0 * 220.0).abs() < 1e-6);
    }

    #[test]
    fn infopath_requires_rating() {
        let answers = FormAnswers::from([(
            "formTemplateCount".to_string(),
            AnswerValue::Number(3.0),
        )]);
        assert!(matches!(
            estimate_infopath(&answers),
            Err(EstimationError::InvalidComplexityRating { .. })
        ));
    }
}
