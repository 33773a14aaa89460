// Unit tests for the export rendering and the in-memory store

mod workbooks;

use super::fixtures::*;
use crate::services::OpportunityStore;
use pipeline_shared::{DetailFilter, Dimension, Rollup};

#[tokio::test]
async fn test_in_memory_store_applies_scope() {
    let store = InMemoryStore::sample();
    let all = store.detail(&DetailFilter::default()).await.unwrap();

    assert_eq!(all.len(), 8);
    assert!(all.iter().all(|r| !r.id.starts_with("opp-9")));
    // Newest first, ties by id
    assert_eq!(all[0].id, "opp-004");
    assert_eq!(all[1].id, "opp-005");
}

#[tokio::test]
async fn test_sample_division_summary() {
    let rows = InMemoryStore::sample().summary(Dimension::Division).await.unwrap();

    let keys: Vec<(String, String)> = rows
        .iter()
        .map(|r| (r.year.to_string(), r.dimension.to_string()))
        .collect();
    assert_eq!(
        keys,
        vec![
            ("2024".to_string(), "North".to_string()),
            ("2024".to_string(), "South".to_string()),
            ("2024".to_string(), "TOTAL".to_string()),
            ("2023".to_string(), "North".to_string()),
            ("2023".to_string(), "Unassigned".to_string()),
            ("2023".to_string(), "TOTAL".to_string()),
            ("TOTAL".to_string(), "TOTAL".to_string()),
        ]
    );

    let grand = rows.last().unwrap();
    assert_eq!(grand.year, Rollup::Total);
    assert_eq!((grand.total, grand.approved, grand.lost, grand.open), (8, 3, 2, 3));
    assert_eq!(grand.revenue.to_string(), "24300.50");
}
