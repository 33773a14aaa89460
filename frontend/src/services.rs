// API service layer for communicating with backend
use gloo_net::http::Request;
use gloo_storage::{LocalStorage, Storage};
use serde::{de::DeserializeOwned, Deserialize, Serialize};

const API_BASE_URL: &str = "/api";
const FILTERS_KEY: &str = "pipeline_dashboard_filters";

// ============================================
// ERROR HANDLING
// ============================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiError {
    #[serde(rename = "error")]
    pub message: String,
    pub code: Option<String>,
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

// ============================================
// HTTP CLIENT
// ============================================

pub struct ApiClient;

impl ApiClient {
    pub async fn get<T: DeserializeOwned>(endpoint: &str) -> ApiResult<T> {
        let url = format!("{}{}", API_BASE_URL, endpoint);

        let response = Request::get(&url).send().await.map_err(|e| ApiError {
            message: e.to_string(),
            code: Some("NETWORK_ERROR".to_string()),
        })?;

        if response.ok() {
            response.json::<T>().await.map_err(|e| ApiError {
                message: e.to_string(),
                code: Some("PARSE_ERROR".to_string()),
            })
        } else {
            let error = response.json::<ApiError>().await.unwrap_or(ApiError {
                message: format!("HTTP Error: {}", response.status()),
                code: Some(format!("HTTP_{}", response.status())),
            });
            gloo::console::error!(format!("GET {} failed: {}", url, error));
            Err(error)
        }
    }
}

// ============================================
// REPORTS
// ============================================

pub mod reports {
    use super::*;
    use pipeline_shared::{DetailFilter, DetailResponse, Dimension, SummaryResponse};

    pub async fn summary(dimension: Dimension) -> ApiResult<SummaryResponse> {
        let endpoint = match dimension {
            Dimension::Division => "/division-summary",
            Dimension::LeadType => "/lead-summary",
        };
        ApiClient::get(endpoint).await
    }

    pub async fn opportunity_detail(filter: &DetailFilter) -> ApiResult<DetailResponse> {
        ApiClient::get(&detail_endpoint(filter)).await
    }

    pub fn detail_endpoint(filter: &DetailFilter) -> String {
        let query = filter.to_query_string();
        if query.is_empty() {
            "/opportunity-detail".to_string()
        } else {
            format!("/opportunity-detail?{}", query)
        }
    }

    /// Download link for a summary workbook (`division` or `lead`).
    pub fn summary_export_url(dimension: Dimension) -> String {
        let kind = match dimension {
            Dimension::Division => "division",
            Dimension::LeadType => "lead",
        };
        format!("{}/excel-report?type={}", API_BASE_URL, kind)
    }

    pub fn detail_export_url(filter: &DetailFilter) -> String {
        let query = filter.to_query_string();
        if query.is_empty() {
            format!("{}/excel-report?type=detail", API_BASE_URL)
        } else {
            format!("{}/excel-report?type=detail&{}", API_BASE_URL, query)
        }
    }
}

// ============================================
// SAVED FILTERS
// ============================================

/// Filter bar selection, kept across page loads.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterSelection {
    pub year: Option<i32>,
    pub division: Option<String>,
    pub lead_type: Option<String>,
}

impl FilterSelection {
    pub fn load() -> Self {
        LocalStorage::get::<FilterSelection>(FILTERS_KEY).unwrap_or_default()
    }

    pub fn save(&self) {
        if *self == Self::default() {
            LocalStorage::delete(FILTERS_KEY);
        } else if let Err(e) = LocalStorage::set(FILTERS_KEY, self) {
            gloo::console::warn!(format!("Could not save filters: {}", e));
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}
