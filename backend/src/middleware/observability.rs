use axum::{
    Json,
    body::Body,
    extract::State,
    http::{HeaderValue, Request, Response, StatusCode},
    middleware::Next,
    response::IntoResponse,
};
use chrono::Utc;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;
use tracing::Span;
use uuid::Uuid;

use crate::AppState;
use crate::database::PoolStats;

pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Tags every request with an id, echoing a caller-supplied one when present.
pub async fn request_id(mut request: Request<Body>, next: Next) -> Response<Body> {
    let id = request
        .headers()
        .get(REQUEST_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty() && v.len() <= 64)
        .map(str::to_string)
        .unwrap_or_else(|| Uuid::new_v4().to_string());

    let header = HeaderValue::from_str(&id).ok();
    if let Some(value) = &header {
        request.headers_mut().insert(REQUEST_ID_HEADER, value.clone());
    }

    let mut response = next.run(request).await;
    if let Some(value) = header {
        response.headers_mut().insert(REQUEST_ID_HEADER, value);
    }
    response
}

/// Span for `TraceLayer`, carrying the request id set by [`request_id`].
pub fn make_span(request: &Request<Body>) -> Span {
    let id = request
        .headers()
        .get(REQUEST_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("-");

    tracing::info_span!(
        "request",
        method = %request.method(),
        path = %request.uri().path(),
        request_id = %id,
    )
}

pub struct Timer {
    start: Instant,
}

impl Timer {
    pub fn start() -> Self {
        Self {
            start: Instant::now(),
        }
    }

    pub fn elapsed_ms(&self) -> i32 {
        self.start.elapsed().as_millis() as i32
    }
}

/// Health check endpoint with database reachability and pool usage
pub async fn detailed_health_check(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let timer = Timer::start();

    let db_status = match state.store.ping().await {
        Ok(()) => ServiceStatus {
            status: "healthy".to_string(),
            response_time_ms: Some(timer.elapsed_ms()),
            details: None,
        },
        Err(e) => {
            tracing::warn!(error = %e, "database health check failed");
            ServiceStatus {
                status: "unhealthy".to_string(),
                response_time_ms: Some(timer.elapsed_ms()),
                details: Some(serde_json::json!({ "error": "database unreachable" })),
            }
        }
    };

    let healthy = db_status.status == "healthy";
    let response = HealthCheckResponse {
        status: if healthy { "healthy" } else { "unhealthy" }.to_string(),
        timestamp: Utc::now(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        services: HashMap::from([("database".to_string(), db_status)]),
        pool: state.store.pool_stats(),
    };

    let status = if healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (status, Json(response))
}

#[derive(Debug, serde::Serialize)]
pub struct HealthCheckResponse {
    pub status: String,
    pub timestamp: chrono::DateTime<chrono::Utc>,
    pub version: String,
    pub services: HashMap<String, ServiceStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pool: Option<PoolStats>,
}

#[derive(Debug, serde::Serialize)]
pub struct ServiceStatus {
    pub status: String,
    pub response_time_ms: Option<i32>,
    pub details: Option<serde_json::Value>,
}
