use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::rollup::{Rollup, SummaryRow};
use crate::{Dimension, Opportunity, STAGE_APPROVED, STAGE_LOST, STAGE_OPEN};

pub const MIN_YEAR: i32 = 1900;
pub const MAX_YEAR: i32 = 2999;

/// Stage value meaning "no stage filter".
pub const STAGE_ALL: &str = "all";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FilterError {
    #[error("Invalid year '{0}'")]
    InvalidYear(String),
    #[error("Year {0} is outside 1900-2999")]
    YearOutOfRange(i32),
}

/// Parses a year query parameter. Blank means no year.
pub fn parse_year(raw: &str) -> Result<Option<i32>, FilterError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(None);
    }

    let year: i32 = raw
        .parse()
        .map_err(|_| FilterError::InvalidYear(raw.to_string()))?;
    if !(MIN_YEAR..=MAX_YEAR).contains(&year) {
        return Err(FilterError::YearOutOfRange(year));
    }
    Ok(Some(year))
}

fn non_empty(raw: Option<&str>) -> Option<String> {
    raw.map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// Criteria for the opportunity detail query. Every supplied criterion must
/// match.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DetailFilter {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub division: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lead_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stage: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub exclude_stages: Vec<String>,
}

impl DetailFilter {
    /// Builds a filter from raw query parameters.
    pub fn from_params(
        year: Option<&str>,
        division: Option<&str>,
        lead_type: Option<&str>,
        stage: Option<&str>,
        exclude_stages: Option<&str>,
    ) -> Result<Self, FilterError> {
        let year = match year {
            Some(raw) => parse_year(raw)?,
            None => None,
        };

        let mut filter = Self {
            year,
            division: non_empty(division),
            lead_type: non_empty(lead_type),
            ..Self::default()
        };
        if let Some(stage) = non_empty(stage) {
            filter = filter.with_stage(&stage);
        }
        if let Some(raw) = exclude_stages {
            filter = filter.excluding(raw.split(','));
        }
        Ok(filter)
    }

    pub fn with_year(mut self, year: i32) -> Self {
        self.year = Some(year);
        self
    }

    pub fn with_dimension(mut self, dimension: Dimension, value: impl Into<String>) -> Self {
        match dimension {
            Dimension::Division => self.division = Some(value.into()),
            Dimension::LeadType => self.lead_type = Some(value.into()),
        }
        self
    }

    /// `Open` becomes an exclusion of the closed stages and `all` clears
    /// nothing; anything else is an exact stage match.
    pub fn with_stage(self, stage: &str) -> Self {
        match stage {
            STAGE_ALL => self,
            STAGE_OPEN => self.excluding([STAGE_APPROVED, STAGE_LOST]),
            other => Self {
                stage: Some(other.to_string()),
                ..self
            },
        }
    }

    pub fn excluding<I, S>(mut self, stages: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for stage in stages {
            let stage = stage.as_ref().trim();
            if !stage.is_empty() && !self.exclude_stages.iter().any(|s| s == stage) {
                self.exclude_stages.push(stage.to_string());
            }
        }
        self
    }

    pub fn is_empty(&self) -> bool {
        self.year.is_none()
            && self.division.is_none()
            && self.lead_type.is_none()
            && self.stage.is_none()
            && self.exclude_stages.is_empty()
    }

    pub fn matches(&self, opportunity: &Opportunity) -> bool {
        self.year.is_none_or(|y| opportunity.year == y)
            && self
                .division
                .as_deref()
                .is_none_or(|d| opportunity.division == d)
            && self
                .lead_type
                .as_deref()
                .is_none_or(|l| opportunity.lead_type == l)
            && self
                .stage
                .as_deref()
                .is_none_or(|s| opportunity.stage_name == s)
            && !self
                .exclude_stages
                .iter()
                .any(|s| *s == opportunity.stage_name)
    }

    /// Query string understood by the detail and export endpoints, without
    /// the leading `?`.
    pub fn to_query_string(&self) -> String {
        let mut pairs: Vec<String> = Vec::new();
        if let Some(year) = self.year {
            pairs.push(format!("year={}", year));
        }
        if let Some(division) = &self.division {
            pairs.push(format!("division={}", urlencoding::encode(division)));
        }
        if let Some(lead_type) = &self.lead_type {
            pairs.push(format!("leadType={}", urlencoding::encode(lead_type)));
        }
        if let Some(stage) = &self.stage {
            pairs.push(format!("stage={}", urlencoding::encode(stage)));
        }
        if !self.exclude_stages.is_empty() {
            pairs.push(format!(
                "excludeStages={}",
                urlencoding::encode(&self.exclude_stages.join(","))
            ));
        }
        pairs.join("&")
    }

    /// Label/value pairs for the criteria that are set.
    pub fn describe(&self) -> Vec<(&'static str, String)> {
        let mut out = Vec::new();
        if let Some(year) = self.year {
            out.push(("Year", year.to_string()));
        }
        if let Some(division) = &self.division {
            out.push(("Division", division.clone()));
        }
        if let Some(lead_type) = &self.lead_type {
            out.push(("Lead Type", lead_type.clone()));
        }
        if let Some(stage) = &self.stage {
            out.push(("Stage", stage.clone()));
        }
        if !self.exclude_stages.is_empty() {
            out.push(("Excluded Stages", self.exclude_stages.join(", ")));
        }
        out
    }
}

/// Local filter over summary rows, applied by the dashboard.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SummaryFilter {
    pub year: Option<i32>,
    pub value: Option<String>,
}

impl SummaryFilter {
    pub fn matches(&self, row: &SummaryRow) -> bool {
        let year_ok = match (self.year, &row.year) {
            (None, _) => true,
            (Some(y), Rollup::Value(row_year)) => y == *row_year,
            (Some(_), Rollup::Total) => false,
        };
        let value_ok = match (&self.value, &row.dimension) {
            (None, _) => true,
            (Some(v), Rollup::Value(row_value)) => v == row_value,
            (Some(_), Rollup::Total) => false,
        };
        year_ok && value_ok
    }
}

/// Distinct years of the leaf rows, newest first.
pub fn years(rows: &[SummaryRow]) -> Vec<i32> {
    let set: BTreeSet<i32> = rows.iter().filter_map(|r| r.year.value().copied()).collect();
    set.into_iter().rev().collect()
}

/// Distinct dimension values of the leaf rows, in ordinal order.
pub fn dimension_values(rows: &[SummaryRow]) -> Vec<String> {
    let set: BTreeSet<&String> = rows.iter().filter_map(|r| r.dimension.value()).collect();
    set.into_iter().cloned().collect()
}
