use calamine::{Data, Range, Reader, Xlsx};
use pipeline_shared::{DetailFilter, Dimension};
use std::io::Cursor;
use std::sync::Arc;

use crate::services::export::build_detail_workbook;
use crate::services::{ExportService, OpportunityStore};
use crate::tests::fixtures::InMemoryStore;

fn open(bytes: Vec<u8>) -> Xlsx<Cursor<Vec<u8>>> {
    Xlsx::new(Cursor::new(bytes)).expect("readable workbook")
}

fn sheet(workbook: &mut Xlsx<Cursor<Vec<u8>>>, name: &str) -> Range<Data> {
    workbook
        .worksheet_range(name)
        .unwrap_or_else(|e| panic!("sheet {}: {}", name, e))
}

fn number(range: &Range<Data>, row: usize, col: usize) -> f64 {
    match range.get((row, col)) {
        Some(Data::Float(f)) => *f,
        Some(Data::Int(i)) => *i as f64,
        other => panic!("expected number at ({}, {}), got {:?}", row, col, other),
    }
}

fn text(range: &Range<Data>, row: usize, col: usize) -> String {
    range.get((row, col)).map(|d| d.to_string()).unwrap_or_default()
}

fn exports() -> ExportService {
    let store: Arc<dyn OpportunityStore> = Arc::new(InMemoryStore::sample());
    ExportService::new(store, 3)
}

#[tokio::test]
async fn test_division_workbook_sheets() {
    let bytes = exports().summary_workbook(Dimension::Division).await.unwrap();
    let mut workbook = open(bytes);
    let names = workbook.sheet_names();

    assert_eq!(names[0], "Division Summary");
    for suffix in ["Tot", "Won", "Lost", "Open", "Rev", "Avg", "CR", "CRX"] {
        let name = format!("D2024-North-{}", suffix);
        assert!(names.contains(&name), "missing {}", name);
    }
    // Nothing lost in 2024 South, nothing approved in 2023 Unassigned
    assert!(!names.contains(&"D2024-South-Lost".to_string()));
    assert!(names.contains(&"D2023-Unassign-Lost".to_string()));
    assert!(!names.contains(&"D2023-Unassign-Rev".to_string()));
    assert!(!names.iter().any(|n| n.contains("TOTAL")));
}

#[tokio::test]
async fn test_summary_sheet_matches_rows() {
    let rows = InMemoryStore::sample().summary(Dimension::Division).await.unwrap();
    let bytes = exports().summary_workbook(Dimension::Division).await.unwrap();
    let mut workbook = open(bytes);
    let summary = sheet(&mut workbook, "Division Summary");

    assert_eq!(summary.height(), rows.len() + 1);
    assert_eq!(text(&summary, 0, 0), "Year");
    assert_eq!(text(&summary, 0, 1), "Division");
    assert_eq!(text(&summary, 0, 2), "Total Opps");

    let last = rows.len();
    assert_eq!(text(&summary, last, 0), "TOTAL");
    assert_eq!(text(&summary, last, 1), "TOTAL");
    assert_eq!(number(&summary, last, 2), 8.0);
    assert_eq!(number(&summary, last, 9), 24300.5);
    assert_eq!(number(&summary, 1, 0), 2024.0);
}

#[tokio::test]
async fn test_drill_sheet_metric_block() {
    let bytes = exports().summary_workbook(Dimension::Division).await.unwrap();
    let mut workbook = open(bytes);

    let open_sheet = sheet(&mut workbook, "D2024-North-Open");
    assert_eq!(text(&open_sheet, 5, 0), "Record Count");
    assert_eq!(number(&open_sheet, 5, 1), 1.0);
    assert_eq!(number(&open_sheet, 6, 1), 1.0);

    // Standard close rate: 1 approved of 3
    let rate = sheet(&mut workbook, "D2024-North-CR");
    assert_eq!(text(&rate, 7, 0), "Approved (Numerator)");
    assert_eq!(number(&rate, 7, 1), 1.0);
    assert_eq!(number(&rate, 8, 1), 3.0);
    assert!((number(&rate, 6, 1) - 33.33).abs() < 1e-9);

    // Excluding open: 1 approved of 2 closed
    let closed = sheet(&mut workbook, "D2024-North-CRX");
    assert_eq!(number(&closed, 8, 1), 2.0);
    assert!((number(&closed, 6, 1) - 50.0).abs() < 1e-9);
}

#[tokio::test]
async fn test_detail_workbook_summary_sheet() {
    let store = InMemoryStore::sample();
    let filter = DetailFilter::default().with_year(2024).with_stage("Open");
    let records = store.detail(&filter).await.unwrap();
    let bytes = build_detail_workbook(&filter, &records).unwrap();

    let mut workbook = open(bytes);
    assert_eq!(workbook.sheet_names(), vec!["Opportunity Detail", "Summary"]);

    let detail = sheet(&mut workbook, "Opportunity Detail");
    assert_eq!(detail.height(), records.len() + 1);

    let summary = sheet(&mut workbook, "Summary");
    assert_eq!(text(&summary, 1, 0), "Total Records");
    assert_eq!(number(&summary, 1, 1), 2.0);
    assert_eq!(number(&summary, 4, 1), 2.0);
    assert_eq!(text(&summary, 7, 0), "Filters Applied");
    assert_ne!(text(&summary, 8, 0), "None");
}

#[test]
fn test_detail_workbook_without_filters() {
    let bytes = build_detail_workbook(&DetailFilter::default(), &[]).unwrap();
    let mut workbook = open(bytes);
    let summary = sheet(&mut workbook, "Summary");
    assert_eq!(number(&summary, 1, 1), 0.0);
    assert_eq!(text(&summary, 8, 0), "None");
}
