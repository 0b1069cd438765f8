use crate::infra::AppState;
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::Extension;
use axum::Json;
use rom_estimator::estimation::{estimation_router, EstimationService, KeyValueStorage};
use serde_json::json;
use std::sync::Arc;

pub(crate) fn with_estimation_routes<S>(service: Arc<EstimationService<S>>) -> axum::Router
where
    S: KeyValueStorage + 'static,
{
    estimation_router(service)
        .route("/health", axum::routing::get(healthcheck))
        .route("/ready", axum::routing::get(readiness_endpoint))
        .route("/metrics", axum::routing::get(metrics_endpoint))
}

pub(crate) async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

pub(crate) async fn readiness_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(std::sync::atomic::Ordering::Relaxed);
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let payload = if ready {
        json!({ "status": "ready" })
    } else {
        json!({ "status": "initializing" })
    };

    (status, Json(payload))
}

pub(crate) async fn metrics_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use metrics_exporter_prometheus::PrometheusBuilder;
    use rom_estimator::estimation::{MemoryStorage, PlatformCatalog};
    use serde_json::Value;
    use std::sync::atomic::{AtomicBool, Ordering};
    use tower::ServiceExt;

    fn app_state(ready: bool) -> AppState {
        let recorder = PrometheusBuilder::new().build_recorder();
        AppState {
            readiness: Arc::new(AtomicBool::new(ready)),
            metrics: Arc::new(recorder.handle()),
        }
    }

    fn app(state: AppState) -> axum::Router {
        let service = Arc::new(EstimationService::new(
            PlatformCatalog::standard(),
            MemoryStorage::default(),
        ));
        with_estimation_routes(service).layer(Extension(state))
    }

    async fn json_body(response: axum::response::Response) -> Value {
        let bytes = axum::body::to_bytes(response.into_body(), 64 * 1024)
            .await
            .expect("read body");
        serde_json::from_slice(&bytes).expect("json payload")
    }

    #[tokio::test]
    async fn healthcheck_reports_ok() {
        let Json(body) = healthcheck().await;
        assert_eq!(body, json!({ "status": "ok" }));
    }

    #[tokio::test]
    async fn readiness_follows_the_flag() {
        let state = app_state(false);

        let pending = readiness_endpoint(Extension(state.clone()))
            .await
            .into_response();
        assert_eq!(pending.status(), StatusCode::SERVICE_UNAVAILABLE);

        state.readiness.store(true, Ordering::Release);
        let ready = readiness_endpoint(Extension(state)).await.into_response();
        assert_eq!(ready.status(), StatusCode::OK);
        assert_eq!(json_body(ready).await, json!({ "status": "ready" }));
    }

    #[tokio::test]
    async fn metrics_are_plain_text() {
        let response = metrics_endpoint(Extension(app_state(true)))
            .await
            .into_response();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()[header::CONTENT_TYPE],
            "text/plain; version=0.0.4"
        );
    }

    #[tokio::test]
    async fn full_router_lists_shipped_platforms() {
        let response = app(app_state(true))
            .oneshot(
                Request::builder()
                    .uri("/api/v1/platforms")
                    .body(Body::empty())
                    .expect("request builds"),
            )
            .await
            .expect("router responds");

        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        let slugs: Vec<&str> = body
            .as_array()
            .expect("listing is an array")
            .iter()
            .filter_map(|entry| entry["platform"].as_str())
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
        assert_eq!(body[1]["algorithm"], json!("custom"));
    }

    #[tokio::test]
    async fn full_router_estimates_sharepoint() {
        let response = app(app_state(true))
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/v1/platforms/sharepoint-2013/estimate")
                    .header("content-type", "application/json")
                    .body(Body::from(
                        json!({ "siteCount": 4, "listCount": 6, "customizationLevel": 1 })
                            .to_string(),
                    ))
                    .expect("request builds"),
            )
            .await
            .expect("router responds");

        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["totalObjects"], json!(10));
        // 7 simple, 2 medium, 1 complex at 1/3/6 hours
        assert_eq!(body["estimatedHours"], json!(19.0));
    }
}
