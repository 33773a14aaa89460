use axum::{
    extract::{Query, State},
    response::Json,
};
use pipeline_shared::{DetailFilter, DetailResponse, Dimension, SummaryResponse};
use serde::Deserialize;
use std::sync::Arc;

use crate::AppState;
use crate::error::ApiResult;
use crate::validation::{MAX_FILTER_LENGTH, Validator};

/// Raw drill-through parameters. Everything arrives as text so a bad year
/// can be reported as such instead of as a deserialization failure.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DetailQuery {
    pub year: Option<String>,
    pub division: Option<String>,
    pub lead_type: Option<String>,
    pub stage: Option<String>,
    pub exclude_stages: Option<String>,
}

impl DetailQuery {
    /// Length checks first (422), then parsing (400).
    pub fn into_filter(self) -> ApiResult<DetailFilter> {
        Validator::new()
            .max_length(self.division.as_deref(), "division", MAX_FILTER_LENGTH)
            .max_length(self.lead_type.as_deref(), "leadType", MAX_FILTER_LENGTH)
            .max_length(self.stage.as_deref(), "stage", MAX_FILTER_LENGTH)
            .max_length(self.exclude_stages.as_deref(), "excludeStages", MAX_FILTER_LENGTH * 4)
            .finish()?;

        let filter = DetailFilter::from_params(
            self.year.as_deref(),
            self.division.as_deref(),
            self.lead_type.as_deref(),
            self.stage.as_deref(),
            self.exclude_stages.as_deref(),
        )?;
        Ok(filter)
    }
}

pub async fn division_summary(
    State(state): State<Arc<AppState>>,
) -> ApiResult<Json<SummaryResponse>> {
    summary(&state, Dimension::Division).await
}

pub async fn lead_summary(State(state): State<Arc<AppState>>) -> ApiResult<Json<SummaryResponse>> {
    summary(&state, Dimension::LeadType).await
}

async fn summary(state: &AppState, dimension: Dimension) -> ApiResult<Json<SummaryResponse>> {
    let rows = state.store.summary(dimension).await?;
    tracing::info!(dimension = dimension.as_str(), rows = rows.len(), "summary served");
    Ok(Json(SummaryResponse::new(dimension, rows)))
}

pub async fn opportunity_detail(
    State(state): State<Arc<AppState>>,
    Query(query): Query<DetailQuery>,
) -> ApiResult<Json<DetailResponse>> {
    let filter = query.into_filter()?;
    let records = state.store.detail(&filter).await?;

    tracing::info!(?filter, records = records.len(), "detail served");
    Ok(Json(DetailResponse::new(filter, records)))
}
