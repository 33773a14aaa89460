use axum::{
    body::{self, Body, Bytes},
    http::{HeaderMap, Request, StatusCode},
    Router,
};
use std::sync::Arc;
use tower::ServiceExt;

use crate::services::OpportunityStore;
use crate::{build_router, AppState};

pub fn init_test_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("debug")
        .with_test_writer()
        .try_init();
}

pub fn test_app(store: Arc<dyn OpportunityStore>) -> Router {
    build_router(Arc::new(AppState::new(store, 2)), None)
}

pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl TestResponse {
    pub fn json(&self) -> serde_json::Value {
        serde_json::from_slice(&self.body).expect("response body is JSON")
    }
}

pub async fn get(app: &Router, uri: &str) -> TestResponse {
    let request = Request::builder()
        .uri(uri)
        .body(Body::empty())
        .expect("valid request");

    let response = app.clone().oneshot(request).await.expect("router is infallible");
    let status = response.status();
    let headers = response.headers().clone();
    let body = body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("readable body");

    TestResponse { status, headers, body }
}
