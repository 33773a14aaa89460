//! Domain scope and derived-year rules.
//!
//! The SQL in the backend binds [`ALLOWED_RECORD_TYPES`] and mirrors these
//! predicates exactly; the Postgres integration tests compare the two.

use chrono::{Datelike, NaiveDateTime};
use rust_decimal::Decimal;

use crate::{STAGE_APPROVED, STAGE_LOST, StageBucket, TOTAL, TOTAL_VALUE, UNASSIGNED};

/// Record types that belong to the opportunity pipeline.
pub const ALLOWED_RECORD_TYPES: [&str; 2] = ["0123t000000JD7jAAG", "0123t000000JD7eAAG"];

/// Stages that close an opportunity, in the order they are bound to queries.
pub const CLOSED_STAGES: [&str; 2] = [STAGE_APPROVED, STAGE_LOST];

pub fn allowed_record_types() -> Vec<String> {
    ALLOWED_RECORD_TYPES.iter().map(|s| s.to_string()).collect()
}

/// A record is in scope when it has no external job id (or has one and a
/// non-zero amount) and its record type is whitelisted.
pub fn in_scope(jnid: Option<&str>, amount: Decimal, record_type_id: &str) -> bool {
    let amount_ok = jnid.is_none() || !amount.is_zero();
    amount_ok && ALLOWED_RECORD_TYPES.contains(&record_type_id)
}

/// Closed opportunities belong to the year they were resolved in, everything
/// else to the year it was created.
pub fn effective_year(
    stage_name: &str,
    created_date: NaiveDateTime,
    last_stage_change_date: Option<NaiveDateTime>,
) -> i32 {
    match last_stage_change_date {
        Some(changed) if StageBucket::of(stage_name).is_closed() => changed.year(),
        _ => created_date.year(),
    }
}

/// Null and empty dimension values are grouped together. A value spelled
/// like the rollup sentinel is relabelled.
pub fn dimension_label(raw: Option<&str>) -> String {
    match raw {
        Some(TOTAL) => TOTAL_VALUE.to_string(),
        Some(value) if !value.is_empty() => value.to_string(),
        _ => UNASSIGNED.to_string(),
    }
}
