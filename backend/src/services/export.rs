//! Spreadsheet exports.
//!
//! All data is fetched first; workbooks are then rendered synchronously in
//! one pass. Summary workbooks carry one drill sheet per metric for every
//! leaf row, sliced from a single detail query per row with
//! [`DetailFilter::matches`].

use std::collections::HashSet;
use std::sync::Arc;

use chrono::NaiveDate;
use futures::{StreamExt, TryStreamExt, stream};
use pipeline_shared::{
    DetailFilter, Dimension, DrillTarget, Metric, MetricKind, Metrics, Opportunity, Rollup,
    StageBucket, SummaryRow, TOTAL, format,
};
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use rust_xlsxwriter::{Color, Format, FormatAlign, Workbook, Worksheet, XlsxError};

use super::reports::{OpportunityStore, ReportError};

pub const XLSX_CONTENT_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

const SHEET_NAME_LIMIT: usize = 31;
const SHEET_VALUE_LIMIT: usize = 8;

#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("Unsupported export type '{0}'")]
    Unsupported(String),
    #[error(transparent)]
    Report(#[from] ReportError),
    #[error("Workbook rendering failed: {0}")]
    Workbook(#[from] XlsxError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportKind {
    Division,
    Lead,
    Detail,
}

impl ExportKind {
    /// A missing type means a division summary.
    pub fn from_param(raw: Option<&str>) -> Result<Self, ExportError> {
        match raw.map(str::trim) {
            None | Some("") | Some("division") => Ok(Self::Division),
            Some("lead") => Ok(Self::Lead),
            Some("detail") => Ok(Self::Detail),
            Some(other) => Err(ExportError::Unsupported(other.to_string())),
        }
    }

    pub fn file_name(&self, date: NaiveDate) -> String {
        let stem = match self {
            Self::Division => "Division_Summary",
            Self::Lead => "Lead_Summary",
            Self::Detail => "Opportunity_Detail",
        };
        format!("{}_{}.xlsx", stem, date.format("%Y-%m-%d"))
    }
}

pub struct ExportService {
    store: Arc<dyn OpportunityStore>,
    concurrency: usize,
}

impl ExportService {
    pub fn new(store: Arc<dyn OpportunityStore>, concurrency: usize) -> Self {
        Self {
            store,
            concurrency: concurrency.max(1),
        }
    }

    pub async fn render(
        &self,
        kind: ExportKind,
        filter: &DetailFilter,
    ) -> Result<Vec<u8>, ExportError> {
        match kind {
            ExportKind::Division => self.summary_workbook(Dimension::Division).await,
            ExportKind::Lead => self.summary_workbook(Dimension::LeadType).await,
            ExportKind::Detail => self.detail_workbook(filter).await,
        }
    }

    pub async fn summary_workbook(&self, dimension: Dimension) -> Result<Vec<u8>, ExportError> {
        let rows = self.store.summary(dimension).await?;
        let leaves: Vec<&SummaryRow> = rows.iter().filter(|row| row.is_leaf()).collect();

        let store = &self.store;
        let fetches: Vec<_> = leaves
            .iter()
            .map(|row| {
                let filter = DrillTarget::new(dimension, row, Metric::Total).detail_filter();
                async move { store.detail(&filter).await }
            })
            .collect();
        let details: Vec<Vec<Opportunity>> = stream::iter(fetches)
        .buffered(self.concurrency)
        .try_collect()
        .await?;

        let drills: Vec<(&SummaryRow, Vec<Opportunity>)> =
            leaves.into_iter().zip(details).collect();
        let bytes = build_summary_workbook(dimension, &rows, &drills)?;

        tracing::info!(
            dimension = dimension.as_str(),
            rows = rows.len(),
            drill_rows = drills.len(),
            bytes = bytes.len(),
            "summary workbook rendered"
        );
        Ok(bytes)
    }

    pub async fn detail_workbook(&self, filter: &DetailFilter) -> Result<Vec<u8>, ExportError> {
        let records = self.store.detail(filter).await?;
        let bytes = build_detail_workbook(filter, &records)?;

        tracing::info!(?filter, records = records.len(), bytes = bytes.len(), "detail workbook rendered");
        Ok(bytes)
    }
}

/// Drops characters Excel rejects in sheet names plus whitespace, keeping at
/// most `max` characters.
pub fn sanitize_sheet_value(value: &str, max: usize) -> String {
    let cleaned: String = value
        .chars()
        .filter(|c| !matches!(c, ':' | '\\' | '/' | '?' | '*' | '[' | ']' | '\'') && !c.is_whitespace())
        .take(max)
        .collect();
    if cleaned.is_empty() {
        "Unknown".to_string()
    } else {
        cleaned
    }
}

pub fn drill_sheet_name(dimension: Dimension, year: &Rollup<i32>, value: &str, suffix: &str) -> String {
    format!(
        "{}{}-{}-{}",
        dimension.sheet_prefix(),
        year,
        sanitize_sheet_value(value, SHEET_VALUE_LIMIT),
        suffix
    )
}

fn truncate(value: &str, max: usize) -> String {
    value.chars().take(max).collect()
}

/// Hands out sheet names that are unique within a workbook. Excel compares
/// names case-insensitively.
#[derive(Debug, Default)]
pub struct SheetNames {
    used: HashSet<String>,
}

impl SheetNames {
    pub fn claim(&mut self, base: &str) -> String {
        let base = truncate(base, SHEET_NAME_LIMIT);
        if self.used.insert(base.to_lowercase()) {
            return base;
        }

        let mut n = 1;
        loop {
            let suffix = format!("_{}", n);
            let candidate = format!(
                "{}{}",
                truncate(&base, SHEET_NAME_LIMIT - suffix.len()),
                suffix
            );
            if self.used.insert(candidate.to_lowercase()) {
                return candidate;
            }
            n += 1;
        }
    }
}

fn to_f64(value: Decimal) -> f64 {
    value.to_f64().unwrap_or_default()
}

struct Styles {
    header: Format,
    detail_header: Format,
    title: Format,
    section: Format,
    text: Format,
    count: Format,
    currency: Format,
    percent: Format,
    total_text: Format,
    total_count: Format,
    total_currency: Format,
    total_percent: Format,
    approved: Format,
    lost: Format,
}

impl Styles {
    fn new() -> Self {
        let total = Format::new()
            .set_bold()
            .set_background_color(Color::RGB(0xFFF2CC));
        Self {
            header: Format::new()
                .set_bold()
                .set_font_color(Color::White)
                .set_background_color(Color::RGB(0x4472C4))
                .set_align(FormatAlign::Center),
            detail_header: Format::new()
                .set_bold()
                .set_background_color(Color::RGB(0xB0BEC5)),
            title: Format::new().set_bold().set_font_size(14),
            section: Format::new()
                .set_bold()
                .set_background_color(Color::RGB(0xE0E0E0)),
            text: Format::new(),
            count: Format::new().set_num_format("#,##0"),
            currency: Format::new().set_num_format("$#,##0.00"),
            percent: Format::new().set_num_format("0.00\"%\""),
            total_text: total.clone(),
            total_count: total.clone().set_num_format("#,##0"),
            total_currency: total.clone().set_num_format("$#,##0.00"),
            total_percent: total.set_num_format("0.00\"%\""),
            approved: Format::new().set_background_color(Color::RGB(0xC8E6C9)),
            lost: Format::new().set_background_color(Color::RGB(0xFFCDD2)),
        }
    }

    fn metric(&self, kind: MetricKind, total: bool) -> &Format {
        match (kind, total) {
            (MetricKind::Count, false) => &self.count,
            (MetricKind::Percent, false) => &self.percent,
            (MetricKind::Currency, false) => &self.currency,
            (MetricKind::Count, true) => &self.total_count,
            (MetricKind::Percent, true) => &self.total_percent,
            (MetricKind::Currency, true) => &self.total_currency,
        }
    }

    fn stage(&self, stage: StageBucket) -> &Format {
        match stage {
            StageBucket::Approved => &self.approved,
            StageBucket::Lost => &self.lost,
            StageBucket::Open => &self.text,
        }
    }
}

/// A column of a record table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RecordColumn {
    Id,
    Name,
    Year,
    Stage,
    Division,
    LeadType,
    Amount,
    Created,
    LastStageChange,
}

impl RecordColumn {
    const DETAIL: [RecordColumn; 9] = [
        RecordColumn::Id,
        RecordColumn::Name,
        RecordColumn::Year,
        RecordColumn::Stage,
        RecordColumn::Division,
        RecordColumn::LeadType,
        RecordColumn::Amount,
        RecordColumn::Created,
        RecordColumn::LastStageChange,
    ];

    /// Drill sheets already fix the year and the summary dimension.
    fn drill(dimension: Dimension) -> [RecordColumn; 7] {
        let other = match dimension {
            Dimension::Division => RecordColumn::LeadType,
            Dimension::LeadType => RecordColumn::Division,
        };
        [
            RecordColumn::Id,
            RecordColumn::Name,
            RecordColumn::Stage,
            other,
            RecordColumn::Amount,
            RecordColumn::Created,
            RecordColumn::LastStageChange,
        ]
    }

    fn header(&self) -> &'static str {
        match self {
            Self::Id => "ID",
            Self::Name => "Name",
            Self::Year => "Year",
            Self::Stage => "Stage",
            Self::Division => "Division",
            Self::LeadType => "Lead Type",
            Self::Amount => "Amount",
            Self::Created => "Created Date",
            Self::LastStageChange => "Last Stage Change",
        }
    }

    fn width(&self) -> f64 {
        match self {
            Self::Name => 30.0,
            Self::Id | Self::Division | Self::LeadType => 20.0,
            Self::Year => 8.0,
            Self::LastStageChange => 18.0,
            _ => 15.0,
        }
    }

    fn write(
        &self,
        sheet: &mut Worksheet,
        row: u32,
        col: u16,
        record: &Opportunity,
        styles: &Styles,
    ) -> Result<(), XlsxError> {
        match self {
            Self::Id => {
                sheet.write_string(row, col, &record.id)?;
            }
            Self::Name => {
                sheet.write_string(row, col, record.name.as_deref().unwrap_or_default())?;
            }
            Self::Year => {
                sheet.write_number(row, col, record.year)?;
            }
            Self::Stage => {
                sheet.write_string_with_format(
                    row,
                    col,
                    &record.stage_name,
                    styles.stage(record.stage()),
                )?;
            }
            Self::Division => {
                sheet.write_string(row, col, &record.division)?;
            }
            Self::LeadType => {
                sheet.write_string(row, col, &record.lead_type)?;
            }
            Self::Amount => {
                sheet.write_number_with_format(row, col, to_f64(record.amount), &styles.currency)?;
            }
            Self::Created => {
                sheet.write_string(row, col, format::date(Some(record.created_date)))?;
            }
            Self::LastStageChange => {
                sheet.write_string(row, col, format::date(record.last_stage_change_date))?;
            }
        }
        Ok(())
    }
}

/// Writes a header row at `start` followed by one row per record and puts an
/// autofilter on it. Returns the first free row.
fn write_record_table<'a, I>(
    sheet: &mut Worksheet,
    start: u32,
    columns: &[RecordColumn],
    records: I,
    header: &Format,
    styles: &Styles,
) -> Result<u32, XlsxError>
where
    I: IntoIterator<Item = &'a Opportunity>,
{
    for (col, column) in columns.iter().enumerate() {
        sheet.write_string_with_format(start, col as u16, column.header(), header)?;
        sheet.set_column_width(col as u16, column.width())?;
    }

    let mut row = start + 1;
    for record in records {
        for (col, column) in columns.iter().enumerate() {
            column.write(sheet, row, col as u16, record, styles)?;
        }
        row += 1;
    }

    let last_col = columns.len().saturating_sub(1) as u16;
    sheet.autofilter(start, 0, row - 1, last_col)?;
    Ok(row)
}

fn summary_sheet_name(dimension: Dimension) -> &'static str {
    match dimension {
        Dimension::Division => "Division Summary",
        Dimension::LeadType => "Lead Summary",
    }
}

fn write_summary_sheet(
    sheet: &mut Worksheet,
    dimension: Dimension,
    rows: &[SummaryRow],
    styles: &Styles,
) -> Result<(), XlsxError> {
    sheet.write_string_with_format(0, 0, "Year", &styles.header)?;
    sheet.write_string_with_format(0, 1, dimension.label(), &styles.header)?;
    sheet.set_column_width(0, 10.0)?;
    sheet.set_column_width(1, 22.0)?;
    for (i, metric) in Metric::ALL.iter().enumerate() {
        let col = (i + 2) as u16;
        sheet.write_string_with_format(0, col, metric.header(), &styles.header)?;
        sheet.set_column_width(col, 16.0)?;
    }

    for (i, row) in rows.iter().enumerate() {
        let r = (i + 1) as u32;
        let total = row.is_total();
        let text = if total { &styles.total_text } else { &styles.text };

        match &row.year {
            Rollup::Value(year) => {
                sheet.write_number_with_format(r, 0, *year, text)?;
            }
            Rollup::Total => {
                sheet.write_string_with_format(r, 0, TOTAL, text)?;
            }
        }
        sheet.write_string_with_format(r, 1, row.dimension.to_string(), text)?;

        for (j, metric) in Metric::ALL.iter().enumerate() {
            let value = to_f64(metric.value(row));
            sheet.write_number_with_format(r, (j + 2) as u16, value, styles.metric(metric.kind(), total))?;
        }
    }

    sheet.autofilter(0, 0, rows.len() as u32, (Metric::ALL.len() + 1) as u16)?;
    sheet.set_freeze_panes(1, 0)?;
    Ok(())
}

/// Records behind one metric of one summary row.
struct DrillSlice<'a> {
    metric: Metric,
    records: Vec<&'a Opportunity>,
}

fn drill_slices<'a>(
    dimension: Dimension,
    row: &SummaryRow,
    records: &'a [Opportunity],
) -> Vec<DrillSlice<'a>> {
    let slice = |metric: Metric| {
        let target = DrillTarget::new(dimension, row, metric);
        let filter = target.detail_filter();
        let positive_only = target.requires_positive_amount();
        let records: Vec<&Opportunity> = records
            .iter()
            .filter(|r| filter.matches(r) && (!positive_only || r.amount > Decimal::ZERO))
            .collect();
        DrillSlice { metric, records }
    };

    let mut slices: Vec<DrillSlice<'a>> = [Metric::Total, Metric::Approved, Metric::Lost, Metric::Open]
        .into_iter()
        .map(&slice)
        .filter(|s| !s.records.is_empty())
        .collect();

    if row.approved > 0 {
        slices.push(slice(Metric::Revenue));
        slices.push(slice(Metric::AverageTicket));
    }

    slices.push(DrillSlice {
        metric: Metric::CloseRateStd,
        records: records.iter().collect(),
    });
    slices.push(DrillSlice {
        metric: Metric::CloseRateExcludeOpen,
        records: records.iter().filter(|r| r.stage().is_closed()).collect(),
    });
    slices
}

fn tab_color(metric: Metric) -> Color {
    match metric {
        Metric::Total => Color::RGB(0x9E9E9E),
        Metric::Approved => Color::RGB(0x4CAF50),
        Metric::Lost => Color::RGB(0xF44336),
        Metric::Open => Color::RGB(0xFF9800),
        Metric::Revenue => Color::RGB(0x2196F3),
        Metric::AverageTicket => Color::RGB(0x9C27B0),
        Metric::CloseRateStd => Color::RGB(0x00BCD4),
        _ => Color::RGB(0x009688),
    }
}

/// Value recomputed from the sliced records, shown next to the reported one.
fn calculated_value(metric: Metric, metrics: &Metrics, record_count: usize) -> Decimal {
    match metric {
        Metric::Total | Metric::Approved | Metric::Lost | Metric::Open => {
            Decimal::from(record_count as i64)
        }
        Metric::CloseRateStd => metrics.close_rate_std(),
        Metric::CloseRateExcludeOpen => metrics.close_rate_exclude_open(),
        Metric::AverageTicket => metrics.average_ticket(),
        Metric::Revenue => pipeline_shared::rollup::round2(metrics.revenue),
        Metric::LostRevenue => pipeline_shared::rollup::round2(metrics.lost_revenue),
        Metric::OpenRevenue => pipeline_shared::rollup::round2(metrics.open_revenue),
    }
}

fn write_drill_sheet(
    sheet: &mut Worksheet,
    dimension: Dimension,
    row: &SummaryRow,
    slice: &DrillSlice<'_>,
    styles: &Styles,
) -> Result<(), XlsxError> {
    let metric = slice.metric;
    let title = format!(
        "{} Detail - Year: {}, {}: {}",
        metric.header(),
        row.year,
        dimension.label(),
        row.dimension
    );
    sheet.merge_range(0, 0, 0, 6, &title, &styles.title)?;
    sheet.set_tab_color(tab_color(metric));

    sheet.write_string_with_format(2, 0, "Metric Summary", &styles.title)?;
    sheet.write_string_with_format(3, 0, "Metric", &styles.section)?;
    sheet.write_string_with_format(3, 1, "Value", &styles.section)?;

    let metrics: Metrics = slice.records.iter().copied().collect();
    let value_format = styles.metric(metric.kind(), false);

    sheet.write_string(4, 0, metric.header())?;
    sheet.write_number_with_format(4, 1, to_f64(metric.value(row)), value_format)?;
    sheet.write_string(5, 0, "Record Count")?;
    sheet.write_number_with_format(5, 1, slice.records.len() as f64, &styles.count)?;
    sheet.write_string(6, 0, "Calculated Value")?;
    sheet.write_number_with_format(
        6,
        1,
        to_f64(calculated_value(metric, &metrics, slice.records.len())),
        value_format,
    )?;

    let mut next = 7;
    let denominator = match metric {
        Metric::CloseRateStd => Some(("Total (Denominator)", metrics.total)),
        Metric::CloseRateExcludeOpen => {
            Some(("Approved + Lost (Denominator)", metrics.approved + metrics.lost))
        }
        _ => None,
    };
    if let Some((label, value)) = denominator {
        sheet.write_string(7, 0, "Approved (Numerator)")?;
        sheet.write_number_with_format(7, 1, metrics.approved as f64, &styles.count)?;
        sheet.write_string(8, 0, label)?;
        sheet.write_number_with_format(8, 1, value as f64, &styles.count)?;
        next = 9;
    }

    sheet.write_string_with_format(next + 1, 0, "Detail Records", &styles.title)?;
    write_record_table(
        sheet,
        next + 2,
        &RecordColumn::drill(dimension),
        slice.records.iter().copied(),
        &styles.detail_header,
        styles,
    )?;
    sheet.set_column_width(0, 26.0)?;
    Ok(())
}

/// Summary sheet first, then the drill sheets of every leaf row in order.
pub fn build_summary_workbook(
    dimension: Dimension,
    rows: &[SummaryRow],
    drills: &[(&SummaryRow, Vec<Opportunity>)],
) -> Result<Vec<u8>, XlsxError> {
    let styles = Styles::new();
    let mut names = SheetNames::default();
    let mut workbook = Workbook::new();

    let summary = workbook.add_worksheet();
    summary.set_name(names.claim(summary_sheet_name(dimension)))?;
    write_summary_sheet(summary, dimension, rows, &styles)?;

    for (row, records) in drills {
        let value = row.dimension.value().map(String::as_str).unwrap_or(TOTAL);
        for slice in drill_slices(dimension, row, records) {
            let Some(suffix) = slice.metric.sheet_suffix() else {
                continue;
            };
            let name = names.claim(&drill_sheet_name(dimension, &row.year, value, suffix));
            let sheet = workbook.add_worksheet();
            sheet.set_name(name)?;
            write_drill_sheet(sheet, dimension, row, &slice, &styles)?;
        }
    }

    workbook.save_to_buffer()
}

/// Detail sheet plus a `Summary` sheet with stage counts and the filters
/// that produced it.
pub fn build_detail_workbook(
    filter: &DetailFilter,
    records: &[Opportunity],
) -> Result<Vec<u8>, XlsxError> {
    let styles = Styles::new();
    let mut workbook = Workbook::new();
    let detail_header = Format::new()
        .set_bold()
        .set_background_color(Color::RGB(0xFF6F00));

    let detail = workbook.add_worksheet();
    detail.set_name("Opportunity Detail")?;
    write_record_table(detail, 0, &RecordColumn::DETAIL, records, &detail_header, &styles)?;
    detail.set_freeze_panes(1, 0)?;

    let metrics: Metrics = records.iter().collect();
    let summary = workbook.add_worksheet();
    summary.set_name("Summary")?;
    summary.set_column_width(0, 24.0)?;
    summary.set_column_width(1, 40.0)?;
    summary.write_string_with_format(0, 0, "Metric", &styles.section)?;
    summary.write_string_with_format(0, 1, "Value", &styles.section)?;

    let counts = [
        ("Total Records", metrics.total),
        ("Approved", metrics.approved),
        ("Lost", metrics.lost),
        ("Open", metrics.open),
    ];
    for (i, (label, value)) in counts.iter().enumerate() {
        let row = (i + 1) as u32;
        summary.write_string(row, 0, *label)?;
        summary.write_number_with_format(row, 1, *value as f64, &styles.count)?;
    }
    summary.write_string(5, 0, "Approved Revenue")?;
    summary.write_number_with_format(5, 1, to_f64(metrics.revenue), &styles.currency)?;

    summary.write_string_with_format(7, 0, "Filters Applied", &styles.title)?;
    let filters = filter.describe();
    if filters.is_empty() {
        summary.write_string(8, 0, "None")?;
    }
    for (i, (label, value)) in filters.iter().enumerate() {
        let row = (i + 8) as u32;
        summary.write_string(row, 0, *label)?;
        summary.write_string(row, 1, value)?;
    }

    workbook.save_to_buffer()
}
