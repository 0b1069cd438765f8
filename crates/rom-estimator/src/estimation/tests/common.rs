use std::sync::Arc;

use axum::response::Response;
use serde_json::Value;

use crate::estimation::domain::{
    AnswerValue, ConfigOverride, DistributionWeights, EstimationAlgorithm, EstimationTuning,
    FormAnswers, HourlyRate, HoursPerObject, PlatformEstimationConfig,
};
use crate::estimation::store::{KeyValueStorage, MemoryStorage, StoreError};
use crate::estimation::{EstimationService, PlatformCatalog};

pub(super) fn scenario_hours() -> HoursPerObject {
    HoursPerObject {
        simple: 2.0,
        medium: 4.0,
        complex: 8.0,
        very_complex: 16.0,
    }
}

pub(super) fn scenario_config() -> PlatformEstimationConfig {
    PlatformEstimationConfig {
        platform: "legacy-crm".to_string(),
        label: "Legacy CRM".to_string(),
        object_count_fields: vec!["screenCount".to_string(), "reportCount".to_string()],
        complexity_field: "complexityRating".to_string(),
        tuning: EstimationTuning {
            hours_per_object: scenario_hours(),
            hourly_rate: HourlyRate {
                low: 100.0,
                high: 200.0,
            },
            distribution_weights: Some(DistributionWeights::from([(3, [40.0, 30.0, 20.0, 10.0])])),
        },
        algorithm: EstimationAlgorithm::Tiered,
    }
}

pub(super) fn rate_override(low: f64, high: f64) -> ConfigOverride {
    ConfigOverride {
        hours_per_object: Some(scenario_hours()),
        hourly_rate: Some(HourlyRate { low, high }),
        distribution_weights: None,
    }
}

pub(super) fn answers(entries: &[(&str, AnswerValue)]) -> FormAnswers {
    entries
        .iter()
        .map(|(field, value)| (field.to_string(), value.clone()))
        .collect()
}

pub(super) fn number(value: f64) -> AnswerValue {
    AnswerValue::Number(value)
}

pub(super) fn scenario_answers(screens: f64, reports: f64, rating: f64) -> FormAnswers {
    answers(&[
        ("screenCount", number(screens)),
        ("reportCount", number(reports)),
        ("complexityRating", number(rating)),
    ])
}

pub(super) fn build_service() -> Arc<EstimationService<MemoryStorage>> {
    Arc::new(EstimationService::new(
        PlatformCatalog::from_configs([scenario_config()]),
        MemoryStorage::default(),
    ))
}

pub(super) fn assert_close(actual: f64, expected: f64) {
    assert!(
        (actual - expected).abs() < 1e-9,
        "expected {expected}, got {actual}"
    );
}

/// Storage that fails every call, as a full disk or revoked permissions would.
#[derive(Default)]
pub(super) struct UnavailableStorage;

impl KeyValueStorage for UnavailableStorage {
    fn get_item(&self, _key: &str) -> Result<Option<String>, StoreError> {
        Err(StoreError::Unavailable("disk offline".to_string()))
    }

    fn set_item(&self, _key: &str, _value: &str) -> Result<(), StoreError> {
        Err(StoreError::Unavailable("disk offline".to_string()))
    }

    fn remove_item(&self, _key: &str) -> Result<(), StoreError> {
        Err(StoreError::Unavailable("disk offline".to_string()))
    }
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
