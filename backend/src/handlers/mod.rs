use axum::{http::StatusCode, response::Json, routing::get, Router};
use serde_json::json;
use std::sync::Arc;
use crate::AppState;

pub mod export;
pub mod opportunities;

pub use export::excel_report;
pub use opportunities::{division_summary, lead_summary, opportunity_detail};

pub fn api_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(api_index))
        .route("/division-summary", get(division_summary))
        .route("/lead-summary", get(lead_summary))
        .route("/opportunity-detail", get(opportunity_detail))
        .route("/excel-report", get(excel_report))
}

pub async fn health_check() -> (StatusCode, Json<serde_json::Value>) {
    (StatusCode::OK, Json(json!({"status": "healthy", "service": "pipeline-api"})))
}

pub async fn api_index() -> Json<serde_json::Value> {
    Json(json!({
        "service": "pipeline-api",
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": {
            "divisionSummary": "GET /api/division-summary",
            "leadSummary": "GET /api/lead-summary",
            "opportunityDetail": "GET /api/opportunity-detail?year=&division=&leadType=&stage=&excludeStages=",
            "excelReport": "GET /api/excel-report?type=division|lead|detail",
            "health": "GET /health",
            "healthDetailed": "GET /health/detailed"
        }
    }))
}
