use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use serde_json::json;

use super::domain::{ConfigOverride, EstimationError, FormAnswers};
use super::service::{EstimationService, OverrideError};
use super::store::KeyValueStorage;

/// Router exposing estimates and the administrative override endpoints.
pub fn estimation_router<S>(service: Arc<EstimationService<S>>) -> Router
where
    S: KeyValueStorage + 'static,
{
    Router::new()
        .route("/api/v1/platforms", get(platforms_handler::<S>))
        .route(
            "/api/v1/platforms/:platform/config",
            get(effective_config_handler::<S>),
        )
        .route(
            "/api/v1/platforms/:platform/estimate",
            axum::routing::post(estimate_handler::<S>),
        )
        .route(
            "/api/v1/overrides",
            get(list_overrides_handler::<S>).delete(clear_overrides_handler::<S>),
        )
        .route(
            "/api/v1/overrides/:platform",
            get(get_override_handler::<S>)
                .put(save_override_handler::<S>)
                .delete(remove_override_handler::<S>),
        )
        .with_state(service)
}

pub(crate) async fn platforms_handler<S>(
    State(service): State<Arc<EstimationService<S>>>,
) -> Response
where
    S: KeyValueStorage + 'static,
{
    (StatusCode::OK, axum::Json(service.platforms())).into_response()
}

pub(crate) async fn effective_config_handler<S>(
    State(service): State<Arc<EstimationService<S>>>,
    Path(platform): Path<String>,
) -> Response
where
    S: KeyValueStorage + 'static,
{
    match service.effective_config_view(&platform) {
        Ok(view) => (StatusCode::OK, axum::Json(view)).into_response(),
        Err(error) => estimation_error_response(error),
    }
}

pub(crate) async fn estimate_handler<S>(
    State(service): State<Arc<EstimationService<S>>>,
    Path(platform): Path<String>,
    axum::Json(answers): axum::Json<FormAnswers>,
) -> Response
where
    S: KeyValueStorage + 'static,
{
    match service.estimate(&platform, &answers) {
        Ok(result) => (StatusCode::OK, axum::Json(result)).into_response(),
        Err(error) => estimation_error_response(error),
    }
}

pub(crate) async fn list_overrides_handler<S>(
    State(service): State<Arc<EstimationService<S>>>,
) -> Response
where
    S: KeyValueStorage + 'static,
{
    (StatusCode::OK, axum::Json(service.overrides())).into_response()
}

pub(crate) async fn get_override_handler<S>(
    State(service): State<Arc<EstimationService<S>>>,
    Path(platform): Path<String>,
) -> Response
where
    S: KeyValueStorage + 'static,
{
    match service.override_for(&platform) {
        Ok(Some(value)) => (StatusCode::OK, axum::Json(value)).into_response(),
        Ok(None) => {
            let payload = json!({
                "platform": platform,
                "error": "no override stored",
            });
            (StatusCode::NOT_FOUND, axum::Json(payload)).into_response()
        }
        Err(error) => estimation_error_response(error),
    }
}

pub(crate) async fn save_override_handler<S>(
    State(service): State<Arc<EstimationService<S>>>,
    Path(platform): Path<String>,
    axum::Json(value): axum::Json<ConfigOverride>,
) -> Response
where
    S: KeyValueStorage + 'static,
{
    match service.save_override(&platform, value) {
        Ok(warnings) => {
            let warnings: Vec<_> = warnings
                .iter()
                .map(|warning| {
                    json!({
                        "detail": warning,
                        "message": warning.to_string(),
                    })
                })
                .collect();
            let payload = json!({
                "platform": platform,
                "saved": true,
                "warnings": warnings,
            });
            (StatusCode::OK, axum::Json(payload)).into_response()
        }
        Err(error) => override_error_response(error),
    }
}

pub(crate) async fn remove_override_handler<S>(
    State(service): State<Arc<EstimationService<S>>>,
    Path(platform): Path<String>,
) -> Response
where
    S: KeyValueStorage + 'static,
{
    match service.remove_override(&platform) {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(error) => override_error_response(error),
    }
}

pub(crate) async fn clear_overrides_handler<S>(
    State(service): State<Arc<EstimationService<S>>>,
) -> Response
where
    S: KeyValueStorage + 'static,
{
    match service.clear_overrides() {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(error) => override_error_response(error),
    }
}

fn estimation_error_response(error: EstimationError) -> Response {
    let status = match error {
        EstimationError::ConfigNotFound { .. } => StatusCode::NOT_FOUND,
        EstimationError::InvalidComplexityRating { .. } => StatusCode::UNPROCESSABLE_ENTITY,
    };
    let payload = json!({
        "error": error.to_string(),
    });
    (status, axum::Json(payload)).into_response()
}

fn override_error_response(error: OverrideError) -> Response {
    match error {
        OverrideError::Estimation(error) => estimation_error_response(error),
        OverrideError::Store(error) => {
            let payload = json!({
                "error": error.to_string(),
            });
            (StatusCode::INTERNAL_SERVER_ERROR, axum::Json(payload)).into_response()
        }
    }
}
