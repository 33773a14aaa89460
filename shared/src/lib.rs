//! Types and rules shared by the pipeline API and the dashboard client.
//!
//! Which opportunities count, which year they land in and how a summary row is
//! computed are decided here and nowhere else, so the server and the browser
//! always agree.

use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

pub mod drill;
pub mod filter;
pub mod format;
pub mod rollup;
pub mod scope;

pub use drill::{DrillTarget, Metric, MetricKind};
pub use filter::{DetailFilter, FilterError, SummaryFilter};
pub use rollup::{Metrics, Rollup, SummaryRow};

pub const STAGE_APPROVED: &str = "Approved";
pub const STAGE_LOST: &str = "Lost";
/// Pseudo-stage accepted by the detail filter. Never stored.
pub const STAGE_OPEN: &str = "Open";
/// Label used for opportunities with no division or lead type.
pub const UNASSIGNED: &str = "Unassigned";
/// Sentinel for rollup rows.
pub const TOTAL: &str = "TOTAL";
/// Label for a dimension value stored as the literal sentinel, so it cannot
/// be read back as a rollup row.
pub const TOTAL_VALUE: &str = "TOTAL (value)";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StageBucket {
    Approved,
    Lost,
    Open,
}

impl StageBucket {
    pub fn of(stage_name: &str) -> Self {
        match stage_name {
            STAGE_APPROVED => Self::Approved,
            STAGE_LOST => Self::Lost,
            _ => Self::Open,
        }
    }

    pub fn is_closed(self) -> bool {
        !matches!(self, Self::Open)
    }
}

/// The column a summary is grouped by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Dimension {
    Division,
    LeadType,
}

impl Dimension {
    /// Name used in JSON and query strings.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Division => "division",
            Self::LeadType => "leadType",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Division => "Division",
            Self::LeadType => "Lead Type",
        }
    }

    /// Column name in the `opportunity` table.
    pub fn column(&self) -> &'static str {
        match self {
            Self::Division => "division",
            Self::LeadType => "lead_type",
        }
    }

    pub fn sheet_prefix(&self) -> char {
        match self {
            Self::Division => 'D',
            Self::LeadType => 'L',
        }
    }
}

/// One in-scope opportunity as returned by the detail query.
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Opportunity {
    pub id: String,
    pub name: Option<String>,
    pub stage_name: String,
    pub division: String,
    pub lead_type: String,
    pub amount: Decimal,
    pub created_date: NaiveDateTime,
    pub last_stage_change_date: Option<NaiveDateTime>,
    /// Effective year, see [`scope::effective_year`].
    pub year: i32,
}

impl Opportunity {
    pub fn stage(&self) -> StageBucket {
        StageBucket::of(&self.stage_name)
    }

    pub fn dimension_value(&self, dimension: Dimension) -> &str {
        match dimension {
            Dimension::Division => &self.division,
            Dimension::LeadType => &self.lead_type,
        }
    }
}

/// A raw row of the `opportunity` table, before scoping.
#[derive(Debug, Clone, PartialEq)]
pub struct OpportunityRecord {
    pub id: String,
    pub name: Option<String>,
    pub created_date: NaiveDateTime,
    pub last_stage_change_date: Option<NaiveDateTime>,
    pub stage_name: String,
    pub lead_type: Option<String>,
    pub division: Option<String>,
    pub amount: Decimal,
    pub record_type_id: String,
    pub jnid: Option<String>,
}

impl OpportunityRecord {
    /// Projects the record the way every query does, or `None` when the
    /// record is out of scope.
    pub fn scoped(&self) -> Option<Opportunity> {
        if !scope::in_scope(self.jnid.as_deref(), self.amount, &self.record_type_id) {
            return None;
        }

        Some(Opportunity {
            id: self.id.clone(),
            name: self.name.clone(),
            stage_name: self.stage_name.clone(),
            division: scope::dimension_label(self.division.as_deref()),
            lead_type: scope::dimension_label(self.lead_type.as_deref()),
            amount: self.amount,
            created_date: self.created_date,
            last_stage_change_date: self.last_stage_change_date,
            year: scope::effective_year(
                &self.stage_name,
                self.created_date,
                self.last_stage_change_date,
            ),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryResponse {
    pub success: bool,
    pub count: usize,
    pub dimension: Dimension,
    pub data: Vec<SummaryRow>,
}

impl SummaryResponse {
    pub fn new(dimension: Dimension, data: Vec<SummaryRow>) -> Self {
        Self {
            success: true,
            count: data.len(),
            dimension,
            data,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DetailResponse {
    pub success: bool,
    pub count: usize,
    pub filters: DetailFilter,
    pub data: Vec<Opportunity>,
}

impl DetailResponse {
    pub fn new(filters: DetailFilter, data: Vec<Opportunity>) -> Self {
        Self {
            success: true,
            count: data.len(),
            filters,
            data,
        }
    }
}
