//! Tests for per-table failure handling and the batch-size threshold.

use sql_exporter::export::{ExportOptions, FailurePolicy};
use sql_exporter::ExportOrchestrator;
use tempfile::TempDir;

#[path = "helpers.rs"]
mod helpers;

use helpers::ScriptedGateway;

fn options(batch_size: usize, failure_policy: FailurePolicy) -> ExportOptions {
    ExportOptions {
        batch_size,
        failure_policy,
        ..Default::default()
    }
}

fn insert_count(text: &str, table: &str) -> usize {
    let prefix = format!("INSERT INTO \"{table}\" ");
    text.lines().filter(|l| l.starts_with(&prefix)).count()
}

#[tokio::test]
async fn test_continue_policy_exports_past_a_failing_table() {
    let gateway = ScriptedGateway::new()
        .with_table("accounts", &["id", "code"], 3)
        .with_table("broken", &["id"], 5)
        .with_table("customers", &["id", "name"], 2)
        .failing_count("broken");
    let calls = gateway.calls();

    let dir = TempDir::new().expect("Failed to create temp directory");
    let output = dir.path().join("shop-data.sql");
    let stats = ExportOrchestrator::new(Box::new(gateway), options(100, FailurePolicy::Continue))
        .export_database(&[], &output)
        .await
        .expect("per-table failures are not fatal");

    assert_eq!(stats.tables.len(), 2);
    assert_eq!(stats.row_count, 5);
    assert_eq!(stats.failures.len(), 1);
    assert_eq!(stats.failures[0].table, "broken");
    assert!(stats.failures[0].error.contains("Query error on table \"broken\""));
    assert!(!stats.aborted);
    assert!(!stats.is_success());

    let text = std::fs::read_to_string(&output).unwrap();
    assert_eq!(insert_count(&text, "accounts"), 3);
    assert_eq!(insert_count(&text, "customers"), 2);
    assert!(!text.contains("-- TABLE: \"broken\""));
    assert!(calls.is_closed(), "pool must be released after the run");
}

#[tokio::test]
async fn test_abort_policy_stops_the_whole_run() {
    let gateway = ScriptedGateway::new()
        .with_table("accounts", &["id", "code"], 3)
        .with_table("broken", &["id"], 5)
        .with_table("customers", &["id", "name"], 2)
        .failing_count("broken");
    let calls = gateway.calls();

    let dir = TempDir::new().expect("Failed to create temp directory");
    let output = dir.path().join("shop-data.sql");
    let stats = ExportOrchestrator::new(Box::new(gateway), options(100, FailurePolicy::Abort))
        .export_database(&[], &output)
        .await
        .expect("per-table failures are recorded, not returned");

    assert!(stats.aborted);
    assert_eq!(stats.tables.len(), 1);
    assert_eq!(stats.tables[0].table, "accounts");
    assert_eq!(stats.failures.len(), 1);

    let text = std::fs::read_to_string(&output).unwrap();
    assert_eq!(insert_count(&text, "accounts"), 3);
    assert!(!text.contains("customers"));
    assert!(calls.is_closed(), "pool must be released after an aborted run");
}

#[tokio::test]
async fn test_stream_failure_keeps_rows_already_written() {
    let gateway = ScriptedGateway::new()
        .with_table("events", &["id", "kind"], 25)
        .failing_stream("events", 12);

    let dir = TempDir::new().expect("Failed to create temp directory");
    let output = dir.path().join("events.sql");
    let stats = ExportOrchestrator::new(Box::new(gateway), options(10, FailurePolicy::Abort))
        .export_table("events", &output)
        .await
        .expect("per-table failures are recorded, not returned");

    assert_eq!(stats.failures.len(), 1);
    let error = &stats.failures[0].error;
    assert!(error.contains("Row stream error on table \"events\""), "{error}");
    assert!(error.contains("after 12 rows"), "{error}");
    assert_eq!(stats.row_count, 0);

    let text = std::fs::read_to_string(&output).unwrap();
    assert!(text.contains("-- TABLE: \"events\""));
    assert_eq!(insert_count(&text, "events"), 12);
    assert!(!text.contains("rows exported in"), "no closing banner after a failure");
}

#[tokio::test]
async fn test_table_of_exactly_batch_size_is_buffered() {
    let gateway = ScriptedGateway::new().with_table("items", &["id", "label"], 10);
    let calls = gateway.calls();

    let dir = TempDir::new().expect("Failed to create temp directory");
    let output = dir.path().join("items.sql");
    let stats = ExportOrchestrator::new(Box::new(gateway), options(10, FailurePolicy::Abort))
        .export_table("items", &output)
        .await
        .unwrap();

    assert_eq!(stats.row_count, 10);
    assert_eq!(calls.execute_calls(), 1);
    assert_eq!(calls.cursor_calls(), 0);
}

#[tokio::test]
async fn test_table_one_over_batch_size_is_streamed() {
    let gateway = ScriptedGateway::new().with_table("items", &["id", "label"], 11);
    let calls = gateway.calls();

    let dir = TempDir::new().expect("Failed to create temp directory");
    let output = dir.path().join("items.sql");
    let stats = ExportOrchestrator::new(Box::new(gateway), options(10, FailurePolicy::Abort))
        .export_table("items", &output)
        .await
        .unwrap();

    assert_eq!(stats.row_count, 11);
    assert_eq!(calls.execute_calls(), 0);
    assert_eq!(calls.cursor_calls(), 1);

    let text = std::fs::read_to_string(&output).unwrap();
    assert_eq!(insert_count(&text, "items"), 11);
    assert!(text.contains("INSERT INTO \"items\" (\"id\", \"label\") VALUES ('11', 'label-11');"));
}

#[tokio::test]
async fn test_zero_batch_size_exports_one_row_per_batch() {
    let gateway = ScriptedGateway::new().with_table("items", &["id", "label"], 3);
    let calls = gateway.calls();

    let dir = TempDir::new().expect("Failed to create temp directory");
    let output = dir.path().join("items.sql");
    let orchestrator = ExportOrchestrator::new(Box::new(gateway), options(0, FailurePolicy::Abort));
    assert_eq!(orchestrator.options().batch_size, 1);

    let stats = orchestrator.export_table("items", &output).await.unwrap();

    assert!(stats.is_success());
    assert_eq!(stats.row_count, 3);
    assert_eq!(calls.cursor_calls(), 1);
    let text = std::fs::read_to_string(&output).unwrap();
    assert_eq!(insert_count(&text, "items"), 3);
}

#[tokio::test]
async fn test_footer_reports_rows_written_not_rows_counted() {
    // rows vanish between COUNT and the read
    let gateway = ScriptedGateway::new()
        .with_table("items", &["id", "label"], 3)
        .with_reported_count("items", 5);
    let calls = gateway.calls();

    let dir = TempDir::new().expect("Failed to create temp directory");
    let output = dir.path().join("items.sql");
    let stats = ExportOrchestrator::new(Box::new(gateway), options(2, FailurePolicy::Abort))
        .export_table("items", &output)
        .await
        .unwrap();

    assert!(stats.is_success());
    assert_eq!(stats.row_count, 3);
    assert_eq!(stats.tables[0].row_count, 3);
    assert_eq!(calls.cursor_calls(), 1);

    let text = std::fs::read_to_string(&output).unwrap();
    assert_eq!(insert_count(&text, "items"), 3);
    assert!(text.contains("-- 3 rows exported in "));
    assert!(!text.contains("-- 5 rows exported in "));
}

#[tokio::test]
async fn test_database_without_tables_leaves_empty_dump() {
    let gateway = ScriptedGateway::new();

    let dir = TempDir::new().expect("Failed to create temp directory");
    let output = dir.path().join("empty-data.sql");
    std::fs::write(&output, "-- previous dump\n").unwrap();

    let stats = ExportOrchestrator::new(Box::new(gateway), options(10, FailurePolicy::Abort))
        .export_database(&[], &output)
        .await
        .unwrap();

    assert!(stats.tables.is_empty());
    assert!(stats.is_success());
    assert!(output.is_file(), "the reported output path must exist");
    assert_eq!(std::fs::read_to_string(&output).unwrap(), "");
}
