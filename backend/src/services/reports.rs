use async_trait::async_trait;
use pipeline_shared::rollup::sort_rows;
use pipeline_shared::scope::{CLOSED_STAGES, allowed_record_types};
use pipeline_shared::{
    DetailFilter, Dimension, Metrics, Opportunity, Rollup, STAGE_APPROVED, STAGE_LOST, SummaryRow,
    TOTAL, TOTAL_VALUE, UNASSIGNED,
};
use rust_decimal::Decimal;
use sqlx::{FromRow, PgPool};

use crate::database::{self, PoolStats};

#[derive(Debug, thiserror::Error)]
pub enum ReportError {
    /// The database could not be reached or the pool gave up waiting.
    #[error("Database unavailable: {0}")]
    Unavailable(String),
    #[error("Query failed: {0}")]
    Query(String),
}

impl From<sqlx::Error> for ReportError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::PoolTimedOut
            | sqlx::Error::PoolClosed
            | sqlx::Error::Io(_)
            | sqlx::Error::Tls(_) => Self::Unavailable(err.to_string()),
            other => Self::Query(other.to_string()),
        }
    }
}

pub type ReportResult<T> = Result<T, ReportError>;

/// Read access to in-scope opportunities.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait OpportunityStore: Send + Sync {
    /// Full year × dimension rollup in display order.
    async fn summary(&self, dimension: Dimension) -> ReportResult<Vec<SummaryRow>>;

    /// Records matching `filter`, newest first, ties broken by id.
    async fn detail(&self, filter: &DetailFilter) -> ReportResult<Vec<Opportunity>>;

    async fn ping(&self) -> ReportResult<()>;

    fn pool_stats(&self) -> Option<PoolStats> {
        None
    }
}

/// Postgres-backed store.
pub struct ReportService {
    pool: PgPool,
}

impl ReportService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

// Scope predicate and derived columns shared by every query. $1 is the
// record-type whitelist, $2 the closed stages, $3 the label for missing
// dimension values. Dimension labels follow `scope::dimension_label`.
fn scoped_cte() -> String {
    format!(
        r#"
    WITH scoped AS (
        SELECT
            id,
            name,
            COALESCE(stage_name, '') AS stage_name,
            {division} AS division,
            {lead_type} AS lead_type,
            COALESCE(amount, 0) AS amount,
            created_date,
            last_stage_change_date,
            EXTRACT(YEAR FROM CASE
                WHEN stage_name = ANY($2) AND last_stage_change_date IS NOT NULL
                    THEN last_stage_change_date
                ELSE created_date
            END)::int AS year_value
        FROM opportunity
        WHERE (jnid IS NULL OR COALESCE(amount, 0) <> 0)
          AND record_type_id = ANY($1)
    )
"#,
        division = dimension_label_sql("division"),
        lead_type = dimension_label_sql("lead_type"),
    )
}

fn dimension_label_sql(column: &str) -> String {
    format!(
        "CASE WHEN {column} = '{total}' THEN '{relabel}' ELSE COALESCE(NULLIF({column}, ''), $3) END",
        column = column,
        total = TOTAL,
        relabel = TOTAL_VALUE,
    )
}

fn summary_sql(dimension: Dimension) -> String {
    format!(
        r#"{cte}
        SELECT
            year_value,
            {column} AS dimension_value,
            GROUPING(year_value)::int AS year_rollup,
            GROUPING({column})::int AS dimension_rollup,
            COUNT(*) AS total,
            COUNT(*) FILTER (WHERE stage_name = $4) AS approved,
            COUNT(*) FILTER (WHERE stage_name = $5) AS lost,
            COUNT(*) FILTER (WHERE NOT (stage_name = ANY($2))) AS open,
            COALESCE(SUM(amount) FILTER (WHERE stage_name = $4), 0) AS revenue,
            COALESCE(SUM(amount) FILTER (WHERE stage_name = $5), 0) AS lost_revenue,
            COALESCE(SUM(amount) FILTER (WHERE NOT (stage_name = ANY($2))), 0) AS open_revenue
        FROM scoped
        GROUP BY ROLLUP(year_value, {column})
        "#,
        cte = scoped_cte(),
        column = dimension.column(),
    )
}

fn detail_sql() -> String {
    format!(
        r#"{cte}
        SELECT id, name, stage_name, division, lead_type, amount,
               created_date, last_stage_change_date, year_value AS year
        FROM scoped
        WHERE ($4::int IS NULL OR year_value = $4)
          AND ($5::text IS NULL OR division = $5)
          AND ($6::text IS NULL OR lead_type = $6)
          AND ($7::text IS NULL OR stage_name = $7)
          AND NOT (stage_name = ANY($8))
        ORDER BY created_date DESC, id COLLATE "C"
        "#,
        cte = scoped_cte(),
    )
}

fn closed_stages() -> Vec<String> {
    CLOSED_STAGES.iter().map(|s| s.to_string()).collect()
}

/// One row of the `GROUP BY ROLLUP` result.
#[derive(Debug, Clone, FromRow)]
pub struct SummaryAggregate {
    pub year_value: Option<i32>,
    pub dimension_value: Option<String>,
    pub year_rollup: i32,
    pub dimension_rollup: i32,
    pub total: i64,
    pub approved: i64,
    pub lost: i64,
    pub open: i64,
    pub revenue: Decimal,
    pub lost_revenue: Decimal,
    pub open_revenue: Decimal,
}

impl From<SummaryAggregate> for SummaryRow {
    fn from(row: SummaryAggregate) -> Self {
        let year = match (row.year_rollup, row.year_value) {
            (0, Some(year)) => Rollup::Value(year),
            _ => Rollup::Total,
        };
        let dimension = match (row.dimension_rollup, row.dimension_value) {
            (0, Some(value)) => Rollup::Value(value),
            _ => Rollup::Total,
        };
        let metrics = Metrics {
            total: row.total,
            approved: row.approved,
            lost: row.lost,
            open: row.open,
            revenue: row.revenue,
            lost_revenue: row.lost_revenue,
            open_revenue: row.open_revenue,
        };
        SummaryRow::from_metrics(year, dimension, &metrics)
    }
}

#[async_trait]
impl OpportunityStore for ReportService {
    async fn summary(&self, dimension: Dimension) -> ReportResult<Vec<SummaryRow>> {
        let sql = summary_sql(dimension);
        let aggregates = sqlx::query_as::<_, SummaryAggregate>(&sql)
            .bind(allowed_record_types())
            .bind(closed_stages())
            .bind(UNASSIGNED)
            .bind(STAGE_APPROVED)
            .bind(STAGE_LOST)
            .fetch_all(&self.pool)
            .await?;

        let mut rows: Vec<SummaryRow> = aggregates.into_iter().map(SummaryRow::from).collect();
        sort_rows(&mut rows);

        tracing::debug!(dimension = dimension.as_str(), rows = rows.len(), "summary query");
        Ok(rows)
    }

    async fn detail(&self, filter: &DetailFilter) -> ReportResult<Vec<Opportunity>> {
        let sql = detail_sql();
        let records = sqlx::query_as::<_, Opportunity>(&sql)
            .bind(allowed_record_types())
            .bind(closed_stages())
            .bind(UNASSIGNED)
            .bind(filter.year)
            .bind(filter.division.as_deref())
            .bind(filter.lead_type.as_deref())
            .bind(filter.stage.as_deref())
            .bind(filter.exclude_stages.clone())
            .fetch_all(&self.pool)
            .await?;

        tracing::debug!(?filter, rows = records.len(), "detail query");
        Ok(records)
    }

    async fn ping(&self) -> ReportResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    fn pool_stats(&self) -> Option<PoolStats> {
        Some(database::get_pool_stats(&self.pool))
    }
}
