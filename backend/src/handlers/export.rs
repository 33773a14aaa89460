use axum::{
    extract::{Query, State},
    http::{HeaderMap, HeaderValue, header},
    response::IntoResponse,
};
use chrono::Utc;
use serde::Deserialize;
use std::sync::Arc;

use super::opportunities::DetailQuery;
use crate::AppState;
use crate::error::{ApiResult, AppError};
use crate::middleware::Timer;
use crate::services::{ExportKind, XLSX_CONTENT_TYPE};

#[derive(Debug, Default, Deserialize)]
pub struct ExportQuery {
    #[serde(rename = "type")]
    pub kind: Option<String>,
    #[serde(flatten)]
    pub filter: DetailQuery,
}

pub async fn excel_report(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ExportQuery>,
) -> ApiResult<impl IntoResponse> {
    let kind = ExportKind::from_param(query.kind.as_deref())?;
    let filter = query.filter.into_filter()?;

    let timer = Timer::start();
    let bytes = state.exports.render(kind, &filter).await?;
    let file_name = kind.file_name(Utc::now().date_naive());

    tracing::info!(
        file = %file_name,
        bytes = bytes.len(),
        elapsed_ms = timer.elapsed_ms(),
        "export generated"
    );

    let mut headers = HeaderMap::new();
    headers.insert(header::CONTENT_TYPE, HeaderValue::from_static(XLSX_CONTENT_TYPE));
    let disposition = HeaderValue::from_str(&format!("attachment; filename=\"{}\"", file_name))
        .map_err(|e| AppError::InternalError(e.to_string()))?;
    headers.insert(header::CONTENT_DISPOSITION, disposition);

    Ok((headers, bytes))
}
