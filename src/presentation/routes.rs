// Router construction
use crate::presentation::app_state::AppState;
use crate::presentation::handlers::{
    chart, export_readings, forecast, health_check, ingest_reading, latest_readings, list_readings,
    ping, stats, summary,
};
use axum::{routing::get, Router};
use std::sync::Arc;
use tower_http::compression::CompressionLayer;
use tower_http::trace::TraceLayer;

pub fn build_router(state: Arc<AppState>) -> Router {
    let api = Router::new()
        .route("/readings", get(list_readings).post(ingest_reading))
        .route("/readings/latest", get(latest_readings))
        .route("/summary", get(summary))
        .route("/chart", get(chart))
        .route("/stats", get(stats))
        .route("/forecast", get(forecast))
        .route("/export", get(export_readings));

    Router::new()
        .route("/healthz", get(health_check))
        .route("/ping", get(ping))
        .nest("/api/v1", api)
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::dashboard_service::DashboardService;
    use crate::application::export_selector::ExportSelector;
    use crate::application::forecast_cache::ForecastCache;
    use crate::application::forecast_refresh::{RefreshConfig, RefreshCycle, RefreshTrigger};
    use crate::application::reading_repository::ReadingRepository;
    use crate::domain::calendar::TimeWindow;
    use crate::domain::error::StoreError;
    use crate::domain::reading::{NewReading, Reading};
    use crate::infrastructure::config::PaginationSettings;
    use crate::infrastructure::memory_repository::MemoryRepository;
    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use serde_json::{json, Value};
    use async_trait::async_trait;
    use std::time::Duration;
    use tower::ServiceExt; // for `oneshot`

    struct OfflineRepository;

    #[async_trait]
    impl ReadingRepository for OfflineRepository {
        async fn readings_in(&self, _window: TimeWindow) -> Result<Vec<Reading>, StoreError> {
            Err(StoreError::Status {
                status: 503,
                body: "influx is down".into(),
            })
        }

        async fn latest(&self, _limit: usize) -> Result<Vec<Reading>, StoreError> {
            Err(StoreError::Timeout(10))
        }

        async fn insert(&self, _reading: NewReading) -> Result<Reading, StoreError> {
            Err(StoreError::Timeout(10))
        }
    }

    struct Harness {
        router: Router,
        cycle: RefreshCycle,
    }

    fn harness() -> Harness {
        harness_over(Arc::new(MemoryRepository::new()))
    }

    fn harness_over(repository: Arc<dyn ReadingRepository>) -> Harness {
        let cache = Arc::new(ForecastCache::new());
        let trigger = RefreshTrigger::default();
        let cycle = RefreshCycle::new(
            repository.clone(),
            cache.clone(),
            RefreshConfig {
                interval: Duration::from_secs(3600),
                min_points: 2,
                store_timeout: Duration::from_secs(5),
            },
            trigger.clone(),
        );
        let state = Arc::new(AppState {
            dashboard_service: DashboardService::new(repository.clone(), trigger),
            export_selector: ExportSelector::new(repository),
            forecast_cache: cache,
            pagination: PaginationSettings::default(),
        });
        Harness {
            router: build_router(state),
            cycle,
        }
    }

    async fn send(router: &Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, body)
    }

    fn get(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    fn post_reading(steps: i64, datetime: &str, voltage: f64, current: f64) -> Request<Body> {
        let body = json!({
            "steps": steps,
            "datetime": datetime,
            "raw_voltage": voltage,
            "raw_current": current,
        });
        Request::builder()
            .method("POST")
            .uri("/api/v1/readings")
            .header("Content-Type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn seed(router: &Router) {
        let rows = [
            (100, "2025-01-15T08:00", 3.0, 0.5),
            (150, "2025-02-15T08:00", 3.2, 0.4),
            (90, "2025-03-15 08:00", 3.4, 0.3),
            (60, "2025-03-16 08:00", 3.4, 0.3),
        ];
        for (steps, ts, v, c) in rows {
            let (status, _) = send(router, post_reading(steps, ts, v, c)).await;
            assert_eq!(status, StatusCode::CREATED);
        }
    }

    #[tokio::test]
    async fn test_health_check() {
        let h = harness();
        let response = h.router.clone().oneshot(get("/healthz")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_ingest_then_list_newest_first() {
        let h = harness();
        seed(&h.router).await;

        let (status, body) = send(&h.router, get("/api/v1/readings?per_page=2&page=1")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["total_pages"], 2);
        assert_eq!(body["total_items"], 4);
        assert_eq!(body["items"][0]["steps"], 60);
        assert_eq!(body["items"][0]["datetime"], "2025-03-16 08:00:00");
    }

    #[tokio::test]
    async fn test_ingest_rejects_negative_values() {
        let h = harness();
        let (status, body) = send(&h.router, post_reading(10, "2025-01-01T00:00", -1.0, 0.1)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "invalid_reading");
    }

    #[tokio::test]
    async fn test_ingest_rejects_malformed_body_as_json_400() {
        let h = harness();
        let request = Request::builder()
            .method("POST")
            .uri("/api/v1/readings")
            .header("Content-Type", "application/json")
            .body(Body::from(r#"{"steps":"many","datetime":"2025-01-01T00:00"}"#))
            .unwrap();

        let (status, body) = send(&h.router, request).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "invalid_reading");
        assert!(body["message"].is_string());
    }

    #[tokio::test]
    async fn test_store_outage_maps_to_503() {
        let h = harness_over(Arc::new(OfflineRepository));

        for uri in [
            "/api/v1/summary",
            "/api/v1/export?start=2025-01&end=2025-02",
            "/api/v1/readings/latest",
        ] {
            let (status, body) = send(&h.router, get(uri)).await;
            assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE, "{}", uri);
            assert_eq!(body["error"], "store_unavailable", "{}", uri);
        }

        let (status, body) = send(&h.router, post_reading(10, "2025-01-01T00:00", 3.0, 0.1)).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body["error"], "store_unavailable");
    }

    #[tokio::test]
    async fn test_summary_by_month_and_bad_page_size() {
        let h = harness();
        seed(&h.router).await;

        let (status, body) = send(&h.router, get("/api/v1/summary?granularity=month")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["items"].as_array().unwrap().len(), 3);
        assert_eq!(body["items"][2]["key"], "2025-03");
        assert_eq!(body["items"][2]["total_steps"], 150);
        assert_eq!(body["items"][2]["total_voltage"], 6.8);

        let (status, body) = send(&h.router, get("/api/v1/summary?per_page=0")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "invalid_page_size");

        let (status, _) = send(
            &h.router,
            get("/api/v1/summary?start=2025-03-01&end=2025-01-01"),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = send(&h.router, get("/api/v1/summary?granularity=hour")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_chart_page_clamps() {
        let h = harness();
        seed(&h.router).await;

        let (status, body) = send(&h.router, get("/api/v1/chart?page=9&per_page=3")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["page_number"], 2);
        assert_eq!(body["items"][0]["label"], "Mar 16");
    }

    #[tokio::test]
    async fn test_forecast_is_served_from_cache() {
        let h = harness();
        seed(&h.router).await;

        // Nothing computed yet: handlers never fit the model themselves
        let (_, body) = send(&h.router, get("/api/v1/forecast")).await;
        assert!(body["forecast_voltage"].is_null());
        assert!(body["message"].is_string());

        h.cycle.refresh_once().await.unwrap();
        let (status, body) = send(&h.router, get("/api/v1/forecast")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["forecast_date"], "2025-04-01");
        assert_eq!(body["forecast_voltage"], 3.6);
        assert_eq!(body["best_voltage_month"], "2025-03");
        assert!(body.get("message").is_none());
    }

    #[tokio::test]
    async fn test_export_range() {
        let h = harness();
        seed(&h.router).await;

        let (status, body) = send(&h.router, get("/api/v1/export?start=2025-02&end=2025-03")).await;
        assert_eq!(status, StatusCode::OK);
        let steps: Vec<i64> = body
            .as_array()
            .unwrap()
            .iter()
            .map(|r| r["steps"].as_i64().unwrap())
            .collect();
        assert_eq!(steps, vec![150, 90, 60]);

        let (status, body) = send(&h.router, get("/api/v1/export?start=2025-03&end=2025-02")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "invalid_range");
    }

    #[tokio::test]
    async fn test_stats_for_month() {
        let h = harness();
        seed(&h.router).await;

        let (status, body) = send(&h.router, get("/api/v1/stats?month=2025-03")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["days"], 2);
        assert_eq!(body["total_steps"], 150);
        assert_eq!(body["max_steps"], 90);
    }
}
