use axum::http::{header, StatusCode};
use calamine::{Data, Reader, Xlsx};
use chrono::Utc;
use std::io::Cursor;
use std::sync::Arc;

use crate::services::XLSX_CONTENT_TYPE;
use crate::tests::fixtures::InMemoryStore;
use crate::tests::helpers::{get, test_app};

fn app() -> axum::Router {
    test_app(Arc::new(InMemoryStore::sample()))
}

fn workbook(bytes: &[u8]) -> Xlsx<Cursor<Vec<u8>>> {
    Xlsx::new(Cursor::new(bytes.to_vec())).expect("readable workbook")
}

#[tokio::test]
async fn test_export_headers() {
    let response = get(&app(), "/api/excel-report?type=lead").await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.headers[header::CONTENT_TYPE], XLSX_CONTENT_TYPE);

    let expected = format!(
        "attachment; filename=\"Lead_Summary_{}.xlsx\"",
        Utc::now().date_naive().format("%Y-%m-%d")
    );
    assert_eq!(response.headers[header::CONTENT_DISPOSITION], expected.as_str());
}

#[tokio::test]
async fn test_missing_type_defaults_to_division() {
    let response = get(&app(), "/api/excel-report").await;
    assert_eq!(response.status, StatusCode::OK);
    let disposition = response.headers[header::CONTENT_DISPOSITION].to_str().unwrap();
    assert!(disposition.contains("Division_Summary_"));
}

#[tokio::test]
async fn test_summary_export_round_trip() {
    let app = app();
    let json = get(&app, "/api/lead-summary").await.json();
    let rows = json["data"].as_array().unwrap();

    let export = get(&app, "/api/excel-report?type=lead").await;
    let mut book = workbook(&export.body);
    let sheet = book.worksheet_range("Lead Summary").unwrap();

    assert_eq!(sheet.height() - 1, rows.len());
    for (i, row) in rows.iter().enumerate() {
        let total = match sheet.get((i + 1, 2)) {
            Some(Data::Float(f)) => *f as i64,
            other => panic!("row {} total: {:?}", i, other),
        };
        assert_eq!(Some(total), row["total"].as_i64());
    }
}

#[tokio::test]
async fn test_detail_export_uses_filters() {
    let response = get(
        &app(),
        "/api/excel-report?type=detail&year=2023&division=Unassigned",
    )
    .await;
    assert_eq!(response.status, StatusCode::OK);

    let mut book = workbook(&response.body);
    let detail = book.worksheet_range("Opportunity Detail").unwrap();
    assert_eq!(detail.height(), 3);
    assert!(book.sheet_names().contains(&"Summary".to_string()));
}

#[tokio::test]
async fn test_unsupported_export_type() {
    let response = get(&app(), "/api/excel-report?type=bogus").await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.json()["code"], "UNSUPPORTED_EXPORT");
}

#[tokio::test]
async fn test_export_rejects_bad_year() {
    let response = get(&app(), "/api/excel-report?type=detail&year=twenty").await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
}
