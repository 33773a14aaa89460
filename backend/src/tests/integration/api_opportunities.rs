use axum::http::StatusCode;
use std::sync::Arc;

use crate::services::reports::MockOpportunityStore;
use crate::services::ReportError;
use crate::tests::fixtures::InMemoryStore;
use crate::tests::helpers::{get, init_test_logging, test_app};

fn app() -> axum::Router {
    init_test_logging();
    test_app(Arc::new(InMemoryStore::sample()))
}

#[tokio::test]
async fn test_division_summary_shape() {
    let response = get(&app(), "/api/division-summary").await;
    assert_eq!(response.status, StatusCode::OK);

    let body = response.json();
    assert_eq!(body["success"], true);
    assert_eq!(body["dimension"], "division");
    assert_eq!(body["count"], 7);

    let first = &body["data"][0];
    assert_eq!(first["year"], 2024);
    assert_eq!(first["dimension"], "North");
    assert_eq!(first["total"], 3);
    assert_eq!(first["closeRateStd"], "33.33");
    assert_eq!(first["closeRateExcludeOpen"], "50.00");
    assert_eq!(first["revenue"], "12500.00");

    let last = &body["data"][6];
    assert_eq!(last["year"], "TOTAL");
    assert_eq!(last["dimension"], "TOTAL");
}

#[tokio::test]
async fn test_lead_summary_dimension() {
    let body = get(&app(), "/api/lead-summary").await.json();
    assert_eq!(body["dimension"], "leadType");
    assert_eq!(body["count"], 8);
    assert_eq!(body["data"][0]["dimension"], "Door Knock");
}

#[tokio::test]
async fn test_open_drill_matches_summary_count() {
    let app = app();
    let summary = get(&app, "/api/division-summary").await.json();
    let rows = summary["data"].as_array().unwrap();

    for row in rows.iter().filter(|r| r["year"] != "TOTAL" && r["dimension"] != "TOTAL") {
        let uri = format!(
            "/api/opportunity-detail?year={}&division={}&excludeStages=Approved,Lost",
            row["year"],
            urlencoding::encode(row["dimension"].as_str().unwrap())
        );
        let detail = get(&app, &uri).await.json();
        assert_eq!(detail["count"], row["open"], "open drill for {}", uri);
    }
}

#[tokio::test]
async fn test_detail_filters_and_order() {
    let response = get(&app(), "/api/opportunity-detail?year=2024&stage=Approved").await;
    assert_eq!(response.status, StatusCode::OK);

    let body = response.json();
    assert_eq!(body["filters"]["year"], 2024);
    assert_eq!(body["filters"]["stage"], "Approved");
    let ids: Vec<&str> = body["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["id"].as_str().unwrap())
        .collect();
    assert_eq!(ids, vec!["opp-004", "opp-001"]);
    assert_eq!(body["data"][0]["stageName"], "Approved");
    assert_eq!(body["data"][0]["leadType"], "Door Knock");
}

#[tokio::test]
async fn test_detail_unassigned_dimension() {
    let body = get(&app(), "/api/opportunity-detail?division=Unassigned").await.json();
    assert_eq!(body["count"], 2);
}

#[tokio::test]
async fn test_bad_year_is_rejected() {
    for year in ["abc", "20x4", "1850"] {
        let response = get(&app(), &format!("/api/opportunity-detail?year={}", year)).await;
        assert_eq!(response.status, StatusCode::BAD_REQUEST, "year={}", year);
        let body = response.json();
        assert_eq!(body["success"], false);
        assert_eq!(body["code"], "BAD_REQUEST");
        assert!(body["timestamp"].is_string());
    }
}

#[tokio::test]
async fn test_empty_year_is_ignored() {
    let body = get(&app(), "/api/opportunity-detail?year=").await.json();
    assert_eq!(body["success"], true);
    assert_eq!(body["count"], 8);
}

#[tokio::test]
async fn test_long_filter_is_validation_error() {
    let uri = format!("/api/opportunity-detail?division={}", "x".repeat(200));
    let response = get(&app(), &uri).await;
    assert_eq!(response.status, StatusCode::UNPROCESSABLE_ENTITY);

    let body = response.json();
    assert_eq!(body["code"], "VALIDATION_ERROR");
    assert!(body["details"]["division"].is_array());
}

#[tokio::test]
async fn test_unavailable_database_is_503() {
    let mut store = MockOpportunityStore::new();
    store
        .expect_summary()
        .returning(|_| Err(ReportError::Unavailable("pool timed out".to_string())));

    let response = get(&test_app(Arc::new(store)), "/api/lead-summary").await;
    assert_eq!(response.status, StatusCode::SERVICE_UNAVAILABLE);

    let body = response.json();
    assert_eq!(body["code"], "BACKEND_UNAVAILABLE");
    assert!(!body["error"].as_str().unwrap().contains("pool timed out"));
}

#[tokio::test]
async fn test_query_failure_is_500() {
    let mut store = MockOpportunityStore::new();
    store
        .expect_detail()
        .returning(|_| Err(ReportError::Query("column does not exist".to_string())));

    let response = get(&test_app(Arc::new(store)), "/api/opportunity-detail").await;
    assert_eq!(response.status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(response.json()["code"], "DATABASE_ERROR");
}

#[tokio::test]
async fn test_health_endpoints() {
    let app = app();
    let live = get(&app, "/health").await;
    assert_eq!(live.status, StatusCode::OK);
    assert_eq!(live.json()["status"], "healthy");

    let detailed = get(&app, "/health/detailed").await;
    assert_eq!(detailed.status, StatusCode::OK);
    assert_eq!(detailed.json()["services"]["database"]["status"], "healthy");
    assert!(detailed.headers.contains_key("x-request-id"));
}

#[tokio::test]
async fn test_detailed_health_reports_unreachable_database() {
    let mut store = MockOpportunityStore::new();
    store
        .expect_ping()
        .returning(|| Err(ReportError::Unavailable("connection refused".to_string())));
    store.expect_pool_stats().returning(|| None);

    let response = get(&test_app(Arc::new(store)), "/health/detailed").await;
    assert_eq!(response.status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(response.json()["status"], "unhealthy");
}

#[tokio::test]
async fn test_api_index_lists_endpoints() {
    let body = get(&app(), "/api").await.json();
    assert!(body["endpoints"]["divisionSummary"].is_string());
}
