//! Mapping from a summary cell to the detail records behind it.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::filter::{DetailFilter, STAGE_ALL, SummaryFilter};
use crate::format;
use crate::rollup::{Rollup, SummaryRow};
use crate::{Dimension, STAGE_APPROVED, STAGE_LOST, STAGE_OPEN};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricKind {
    Count,
    Percent,
    Currency,
}

/// A metric column of the summary table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Metric {
    Total,
    Approved,
    Lost,
    Open,
    CloseRateStd,
    CloseRateExcludeOpen,
    AverageTicket,
    Revenue,
    LostRevenue,
    OpenRevenue,
}

impl Metric {
    /// Column order of the summary table and sheet.
    pub const ALL: [Metric; 10] = [
        Metric::Total,
        Metric::Approved,
        Metric::Lost,
        Metric::Open,
        Metric::CloseRateStd,
        Metric::CloseRateExcludeOpen,
        Metric::AverageTicket,
        Metric::Revenue,
        Metric::LostRevenue,
        Metric::OpenRevenue,
    ];

    pub fn header(&self) -> &'static str {
        match self {
            Metric::Total => "Total Opps",
            Metric::Approved => "Approved",
            Metric::Lost => "Lost",
            Metric::Open => "Open",
            Metric::CloseRateStd => "Close Rate %",
            Metric::CloseRateExcludeOpen => "Close Rate % (Excl. Open)",
            Metric::AverageTicket => "Avg Ticket",
            Metric::Revenue => "Revenue",
            Metric::LostRevenue => "Lost Revenue",
            Metric::OpenRevenue => "Open Revenue",
        }
    }

    pub fn kind(&self) -> MetricKind {
        match self {
            Metric::Total | Metric::Approved | Metric::Lost | Metric::Open => MetricKind::Count,
            Metric::CloseRateStd | Metric::CloseRateExcludeOpen => MetricKind::Percent,
            Metric::AverageTicket
            | Metric::Revenue
            | Metric::LostRevenue
            | Metric::OpenRevenue => MetricKind::Currency,
        }
    }

    pub fn value(&self, row: &SummaryRow) -> Decimal {
        match self {
            Metric::Total => Decimal::from(row.total),
            Metric::Approved => Decimal::from(row.approved),
            Metric::Lost => Decimal::from(row.lost),
            Metric::Open => Decimal::from(row.open),
            Metric::CloseRateStd => row.close_rate_std,
            Metric::CloseRateExcludeOpen => row.close_rate_exclude_open,
            Metric::AverageTicket => row.average_ticket,
            Metric::Revenue => row.revenue,
            Metric::LostRevenue => row.lost_revenue,
            Metric::OpenRevenue => row.open_revenue,
        }
    }

    pub fn display(&self, row: &SummaryRow) -> String {
        let value = self.value(row);
        match self.kind() {
            MetricKind::Count => format::count(value.trunc().try_into().unwrap_or_default()),
            MetricKind::Percent => format::percent(value),
            MetricKind::Currency => format::currency(value),
        }
    }

    /// Zero cells have nothing to drill into.
    pub fn is_drillable(&self, row: &SummaryRow) -> bool {
        !self.value(row).is_zero()
    }

    /// Stage selector sent with the drill request. Rates and revenue drill
    /// into the approved records.
    pub fn stage(&self) -> &'static str {
        match self {
            Metric::Total => STAGE_ALL,
            Metric::Approved
            | Metric::CloseRateStd
            | Metric::CloseRateExcludeOpen
            | Metric::AverageTicket
            | Metric::Revenue => STAGE_APPROVED,
            Metric::Lost | Metric::LostRevenue => STAGE_LOST,
            Metric::Open | Metric::OpenRevenue => STAGE_OPEN,
        }
    }

    /// Suffix of the per-cell drill sheet in the summary workbook, for the
    /// metrics that get one.
    pub fn sheet_suffix(&self) -> Option<&'static str> {
        match self {
            Metric::Total => Some("Tot"),
            Metric::Approved => Some("Won"),
            Metric::Lost => Some("Lost"),
            Metric::Open => Some("Open"),
            Metric::Revenue => Some("Rev"),
            Metric::AverageTicket => Some("Avg"),
            Metric::CloseRateStd => Some("CR"),
            Metric::CloseRateExcludeOpen => Some("CRX"),
            Metric::LostRevenue | Metric::OpenRevenue => None,
        }
    }
}

/// A clicked summary cell.
///
/// `scope` is the dashboard filter the table was built under. Total rows
/// only roll up the leaves that passed it, so their drill keeps it.
#[derive(Debug, Clone, PartialEq)]
pub struct DrillTarget {
    pub dimension: Dimension,
    pub year: Rollup<i32>,
    pub value: Rollup<String>,
    pub metric: Metric,
    pub scope: SummaryFilter,
}

impl DrillTarget {
    pub fn new(dimension: Dimension, row: &SummaryRow, metric: Metric) -> Self {
        Self {
            dimension,
            year: row.year.clone(),
            value: row.dimension.clone(),
            metric,
            scope: SummaryFilter::default(),
        }
    }

    pub fn within(mut self, scope: &SummaryFilter) -> Self {
        self.scope = scope.clone();
        self
    }

    fn effective_year(&self) -> Option<i32> {
        match self.year {
            Rollup::Value(year) => Some(year),
            Rollup::Total => self.scope.year,
        }
    }

    fn effective_value(&self) -> Option<&str> {
        match &self.value {
            Rollup::Value(value) => Some(value),
            Rollup::Total => self.scope.value.as_deref(),
        }
    }

    /// Totals drop the criteria they roll up over, except those of the scope.
    pub fn detail_filter(&self) -> DetailFilter {
        let mut filter = DetailFilter::default();
        if let Some(year) = self.effective_year() {
            filter = filter.with_year(year);
        }
        if let Some(value) = self.effective_value() {
            filter = filter.with_dimension(self.dimension, value);
        }
        filter.with_stage(self.metric.stage())
    }

    /// Average-ticket drills only show records that carry an amount.
    pub fn requires_positive_amount(&self) -> bool {
        self.metric == Metric::AverageTicket
    }

    pub fn title(&self) -> String {
        let mut parts = Vec::new();
        if let Some(year) = self.effective_year() {
            parts.push(format!("Year: {}", year));
        }
        if let Some(value) = self.effective_value() {
            parts.push(format!("{}: {}", self.dimension.label(), value));
        }
        match self.metric.stage() {
            STAGE_ALL => {}
            STAGE_OPEN => parts.push("Stage: Open (Not Approved/Not Lost)".to_string()),
            stage => parts.push(format!("Stage: {}", stage)),
        }

        if parts.is_empty() {
            "Opportunity Details".to_string()
        } else {
            format!("Opportunity Details - {}", parts.join(", "))
        }
    }
}
