//! Integration tests for upload review: ingestion shaping, advisory
//! validation, and submission through the relay.

use meterview::grid::{self, CellValue, UploadGrid};
use meterview::testing::{CapturingAlerts, ScriptedRelay};
use meterview::{MeterviewError, Stream};
use serde_json::json;

fn text(s: &str) -> CellValue {
    CellValue::Text(s.to_string())
}

fn header() -> Vec<CellValue> {
    [
        "sno", "customer", "region", "enrollment", "am", "markup", "april", "may",
    ]
    .iter()
    .map(|h| text(h))
    .collect()
}

fn clean_row(customer: &str) -> Vec<CellValue> {
    vec![
        CellValue::Number(1.0),
        text(customer),
        text("North"),
        CellValue::Number(88123.0),
        text("Jane Doe"),
        CellValue::Number(1.1),
        CellValue::Number(10.0),
        CellValue::Number(20.0),
    ]
}

#[test]
fn review_scenario_counts_one_error_and_keeps_the_literal() {
    // Five clean data rows, then row 5's second consumption column (grid
    // column 7) holds "N/A".
    let mut rows = vec![header()];
    for i in 0..4 {
        rows.push(clean_row(&format!("Customer {i}")));
    }
    let mut bad = clean_row("Flagged Co");
    bad[7] = text("N/A");
    rows.push(bad);

    let grid = UploadGrid::from_rows(rows);
    let report = grid::validate(&grid);

    assert_eq!(report.error_count(), 1);
    assert!(report.is_flagged(5, 7));

    // The submitted payload still carries the literal string.
    let payload = serde_json::to_value(grid.original()).unwrap();
    assert_eq!(payload[5][7], json!("N/A"));
}

#[test]
fn advisory_alert_names_the_count_and_blocks_nothing() {
    let mut bad = clean_row("Acme");
    bad[1] = text(" Acme ");
    bad[6] = text("12a");
    let grid = UploadGrid::from_rows(vec![header(), bad]);

    let report = grid::validate(&grid);
    assert_eq!(report.error_count(), 2);

    let alerts = CapturingAlerts::new();
    report.announce(&alerts);
    let messages = alerts.messages();
    assert_eq!(messages.len(), 1);
    assert!(messages[0].contains("Errors: 2"));

    // A clean report stays silent.
    let clean = grid::validate(&UploadGrid::from_rows(vec![header(), clean_row("Acme")]));
    clean.announce(&alerts);
    assert_eq!(alerts.messages().len(), 1);
}

#[tokio::test]
async fn submission_sends_original_data_with_header() {
    let relay = ScriptedRelay::new().respond("/ingest-marketplace", json!({"ok": true}));
    let alerts = CapturingAlerts::new();

    let mut row = clean_row("Acme");
    row[3] = CellValue::Blank; // blank enrollment stays blank upstream
    let grid = UploadGrid::from_rows(vec![header(), row]);

    grid::submit(&grid, Stream::Marketplace, &relay, &alerts)
        .await
        .unwrap();

    let calls = relay.calls();
    assert_eq!(calls.len(), 1);
    let payload = calls[0].data.clone().expect("grid travels in data");
    assert_eq!(payload[0][0], json!("sno"));
    assert_eq!(payload[1][3], json!(""));

    let messages = alerts.messages();
    assert_eq!(messages.len(), 1);
    assert!(messages[0].contains("Response Status: 200"));
}

#[tokio::test]
async fn failed_submission_reports_verbatim_and_returns_the_error() {
    let relay = ScriptedRelay::new(); // nothing scripted: the ingest path 404s
    let alerts = CapturingAlerts::new();
    let grid = UploadGrid::from_rows(vec![header(), clean_row("Acme")]);

    let err = grid::submit(&grid, Stream::Subscription, &relay, &alerts)
        .await
        .unwrap_err();
    assert!(matches!(err, MeterviewError::Relay { status: 404, .. }));

    let messages = alerts.messages();
    assert_eq!(messages.len(), 1);
    assert!(messages[0].contains("Failed to send data to backend"));
    assert!(messages[0].contains("404"));
}

#[test]
fn blank_rows_never_reach_validation_or_submission() {
    let rows = vec![
        header(),
        vec![
            CellValue::Blank,
            text(""),
            CellValue::Number(0.0),
            CellValue::Blank,
            CellValue::Blank,
            CellValue::Blank,
            CellValue::Blank,
            CellValue::Blank,
        ],
        clean_row("Acme"),
    ];
    let grid = UploadGrid::from_rows(rows);

    assert_eq!(grid.original().len(), 2);
    assert_eq!(grid.display().len(), 2);
    assert!(grid::validate(&grid).is_clean());
}
