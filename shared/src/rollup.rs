//! Year × dimension rollups.
//!
//! A rollup has one row per non-empty `(year, value)` partition, one subtotal
//! per year (value = `TOTAL`) and a single grand total (year = value =
//! `TOTAL`). Rows are ordered by year descending with the grand total last,
//! then by value ascending (byte order) with the subtotal last.
//!
//! [`rollup`] builds that from raw opportunities and [`rollup_rows`] rebuilds
//! it from leaf rows, which is how the dashboard recomputes totals after a
//! local filter without asking the server again.

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;
use std::marker::PhantomData;
use std::str::FromStr;

use rust_decimal::{Decimal, RoundingStrategy};
use serde::de::{self, Unexpected, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::{Dimension, Opportunity, StageBucket, SummaryFilter, TOTAL};

/// A grouping key that is either a concrete value or the rollup sentinel.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Rollup<T> {
    Value(T),
    Total,
}

impl<T> Rollup<T> {
    pub fn is_total(&self) -> bool {
        matches!(self, Self::Total)
    }

    pub fn value(&self) -> Option<&T> {
        match self {
            Self::Value(v) => Some(v),
            Self::Total => None,
        }
    }
}

impl<T: fmt::Display> fmt::Display for Rollup<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Value(v) => v.fmt(f),
            Self::Total => f.write_str(TOTAL),
        }
    }
}

impl<T: Serialize> Serialize for Rollup<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Value(v) => v.serialize(serializer),
            Self::Total => serializer.serialize_str(TOTAL),
        }
    }
}

impl<'de, T: FromStr> Deserialize<'de> for Rollup<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(RollupVisitor(PhantomData))
    }
}

struct RollupVisitor<T>(PhantomData<T>);

impl<'de, T: FromStr> Visitor<'de> for RollupVisitor<T> {
    type Value = Rollup<T>;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "a grouping value or \"{}\"", TOTAL)
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
        if v == TOTAL {
            return Ok(Rollup::Total);
        }
        v.parse()
            .map(Rollup::Value)
            .map_err(|_| E::invalid_value(Unexpected::Str(v), &self))
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Self::Value, E> {
        self.visit_str(&v.to_string())
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Self::Value, E> {
        self.visit_str(&v.to_string())
    }
}

/// Rounds to exactly two decimal places, halves away from zero.
pub fn round2(value: Decimal) -> Decimal {
    let mut rounded = value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    rounded.rescale(2);
    rounded
}

fn percentage(numerator: i64, denominator: i64) -> Decimal {
    if denominator == 0 {
        return round2(Decimal::ZERO);
    }
    round2(Decimal::from(numerator) * Decimal::ONE_HUNDRED / Decimal::from(denominator))
}

/// Additive counters behind a summary row.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Metrics {
    pub total: i64,
    pub approved: i64,
    pub lost: i64,
    pub open: i64,
    pub revenue: Decimal,
    pub lost_revenue: Decimal,
    pub open_revenue: Decimal,
}

impl Metrics {
    pub fn record(&mut self, stage: StageBucket, amount: Decimal) {
        self.total += 1;
        match stage {
            StageBucket::Approved => {
                self.approved += 1;
                self.revenue += amount;
            }
            StageBucket::Lost => {
                self.lost += 1;
                self.lost_revenue += amount;
            }
            StageBucket::Open => {
                self.open += 1;
                self.open_revenue += amount;
            }
        }
    }

    pub fn merge(&mut self, other: &Metrics) {
        self.total += other.total;
        self.approved += other.approved;
        self.lost += other.lost;
        self.open += other.open;
        self.revenue += other.revenue;
        self.lost_revenue += other.lost_revenue;
        self.open_revenue += other.open_revenue;
    }

    pub fn close_rate_std(&self) -> Decimal {
        percentage(self.approved, self.total)
    }

    pub fn close_rate_exclude_open(&self) -> Decimal {
        percentage(self.approved, self.approved + self.lost)
    }

    pub fn average_ticket(&self) -> Decimal {
        if self.approved == 0 {
            return round2(Decimal::ZERO);
        }
        round2(self.revenue / Decimal::from(self.approved))
    }
}

impl<'a> FromIterator<&'a Opportunity> for Metrics {
    fn from_iter<I: IntoIterator<Item = &'a Opportunity>>(iter: I) -> Self {
        let mut metrics = Metrics::default();
        for opportunity in iter {
            metrics.record(opportunity.stage(), opportunity.amount);
        }
        metrics
    }
}

impl From<&SummaryRow> for Metrics {
    fn from(row: &SummaryRow) -> Self {
        Self {
            total: row.total,
            approved: row.approved,
            lost: row.lost,
            open: row.open,
            revenue: row.revenue,
            lost_revenue: row.lost_revenue,
            open_revenue: row.open_revenue,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryRow {
    pub year: Rollup<i32>,
    pub dimension: Rollup<String>,
    pub total: i64,
    pub approved: i64,
    pub lost: i64,
    pub open: i64,
    pub close_rate_std: Decimal,
    pub close_rate_exclude_open: Decimal,
    pub average_ticket: Decimal,
    pub revenue: Decimal,
    pub lost_revenue: Decimal,
    pub open_revenue: Decimal,
}

impl SummaryRow {
    pub fn from_metrics(year: Rollup<i32>, dimension: Rollup<String>, metrics: &Metrics) -> Self {
        Self {
            year,
            dimension,
            total: metrics.total,
            approved: metrics.approved,
            lost: metrics.lost,
            open: metrics.open,
            close_rate_std: metrics.close_rate_std(),
            close_rate_exclude_open: metrics.close_rate_exclude_open(),
            average_ticket: metrics.average_ticket(),
            revenue: round2(metrics.revenue),
            lost_revenue: round2(metrics.lost_revenue),
            open_revenue: round2(metrics.open_revenue),
        }
    }

    /// A concrete `(year, value)` partition.
    pub fn is_leaf(&self) -> bool {
        !self.year.is_total() && !self.dimension.is_total()
    }

    /// Either a year subtotal or the grand total.
    pub fn is_total(&self) -> bool {
        self.dimension.is_total()
    }

    pub fn is_grand_total(&self) -> bool {
        self.year.is_total() && self.dimension.is_total()
    }

    pub fn metrics(&self) -> Metrics {
        Metrics::from(self)
    }
}

/// Aggregates raw opportunities into a full rollup.
pub fn rollup<'a, I>(records: I, dimension: Dimension) -> Vec<SummaryRow>
where
    I: IntoIterator<Item = &'a Opportunity>,
{
    let mut leaves: BTreeMap<(i32, String), Metrics> = BTreeMap::new();
    for record in records {
        leaves
            .entry((record.year, record.dimension_value(dimension).to_string()))
            .or_default()
            .record(record.stage(), record.amount);
    }
    assemble(leaves)
}

/// Rebuilds subtotals and the grand total from leaf rows. Total rows in the
/// input are ignored.
pub fn rollup_rows<'a, I>(rows: I) -> Vec<SummaryRow>
where
    I: IntoIterator<Item = &'a SummaryRow>,
{
    let mut leaves: BTreeMap<(i32, String), Metrics> = BTreeMap::new();
    for row in rows {
        if let (Rollup::Value(year), Rollup::Value(value)) = (&row.year, &row.dimension) {
            leaves
                .entry((*year, value.clone()))
                .or_default()
                .merge(&row.metrics());
        }
    }
    assemble(leaves)
}

fn assemble(leaves: BTreeMap<(i32, String), Metrics>) -> Vec<SummaryRow> {
    let mut years: BTreeMap<i32, Metrics> = BTreeMap::new();
    let mut grand = Metrics::default();
    let mut rows = Vec::with_capacity(leaves.len() * 2 + 1);

    for ((year, value), metrics) in leaves {
        years.entry(year).or_default().merge(&metrics);
        grand.merge(&metrics);
        rows.push(SummaryRow::from_metrics(
            Rollup::Value(year),
            Rollup::Value(value),
            &metrics,
        ));
    }

    for (year, metrics) in &years {
        rows.push(SummaryRow::from_metrics(
            Rollup::Value(*year),
            Rollup::Total,
            metrics,
        ));
    }
    rows.push(SummaryRow::from_metrics(Rollup::Total, Rollup::Total, &grand));

    sort_rows(&mut rows);
    rows
}

/// Keeps the leaf rows matching `filter` and recomputes every total from them.
pub fn filter_summary(rows: &[SummaryRow], filter: &SummaryFilter) -> Vec<SummaryRow> {
    rollup_rows(rows.iter().filter(|row| row.is_leaf() && filter.matches(row)))
}

/// Grand-total metrics of a rollup, falling back to the sum of its leaves.
pub fn headline(rows: &[SummaryRow]) -> Metrics {
    if let Some(grand) = rows.iter().find(|row| row.is_grand_total()) {
        return grand.metrics();
    }

    rows.iter()
        .filter(|row| row.is_leaf())
        .fold(Metrics::default(), |mut acc, row| {
            acc.merge(&row.metrics());
            acc
        })
}

pub fn sort_rows(rows: &mut [SummaryRow]) {
    rows.sort_by(compare_rows);
}

pub fn compare_rows(a: &SummaryRow, b: &SummaryRow) -> Ordering {
    compare_years(&a.year, &b.year).then_with(|| compare_values(&a.dimension, &b.dimension))
}

fn compare_years(a: &Rollup<i32>, b: &Rollup<i32>) -> Ordering {
    match (a, b) {
        (Rollup::Value(x), Rollup::Value(y)) => y.cmp(x),
        (Rollup::Value(_), Rollup::Total) => Ordering::Less,
        (Rollup::Total, Rollup::Value(_)) => Ordering::Greater,
        (Rollup::Total, Rollup::Total) => Ordering::Equal,
    }
}

fn compare_values(a: &Rollup<String>, b: &Rollup<String>) -> Ordering {
    match (a, b) {
        (Rollup::Value(x), Rollup::Value(y)) => x.as_bytes().cmp(y.as_bytes()),
        (Rollup::Value(_), Rollup::Total) => Ordering::Less,
        (Rollup::Total, Rollup::Value(_)) => Ordering::Greater,
        (Rollup::Total, Rollup::Total) => Ordering::Equal,
    }
}
