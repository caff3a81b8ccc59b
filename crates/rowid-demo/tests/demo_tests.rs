//! Tests for the last row identifier walkthrough

use rowid_db::{connect, sql_params, AsyncConnection, ConnectParams, DatabaseError, Row, SqlValue};
use rowid_demo::{ensure_schema, run, DemoReport};
use std::path::Path;
use tempfile::TempDir;

type TestResult = Result<(), Box<dyn std::error::Error>>;

async fn open(path: &Path) -> rowid_db::Result<AsyncConnection> {
    connect(ConnectParams::new("demo", "", path.to_string_lossy())).await
}

async fn run_once(path: &Path) -> anyhow::Result<(DemoReport, String)> {
    let connection = open(path).await?;
    ensure_schema(&connection).await?;
    let mut out = Vec::new();
    let report = run(&connection, &mut out).await?;
    connection.close().await?;
    Ok((report, String::from_utf8(out)?))
}

async fn durable_rows(path: &Path) -> anyhow::Result<Vec<Row>> {
    let connection = open(path).await?;
    let mut cursor = connection.cursor();
    cursor
        .execute("select id, data from mytab order by id", &[])
        .await?;
    let rows = cursor.fetch_all().await?;
    drop(cursor);
    connection.close().await?;
    Ok(rows)
}

#[tokio::test]
async fn test_walkthrough_on_fresh_table() -> TestResult {
    let temp_dir = TempDir::new()?;
    let path = temp_dir.path().join("demo.db");

    let (report, output) = run_once(&path).await?;

    assert_eq!(report.inserted.len(), 2);
    let first = report.inserted[0].row_id;
    let second = report.inserted[1].row_id;
    assert!(first.is_some() && second.is_some());
    assert_ne!(first, second);

    assert_eq!(
        report.fetched,
        vec![
            Some(Row::new(sql_params![1, "First"])),
            Some(Row::new(sql_params![2, "Second"])),
        ]
    );

    // the update touched both rows but reports only the last one
    assert_eq!(report.updated_row_id, second);
    assert_eq!(
        report.last_updated_row,
        Some(Row::new(sql_params![2, "Second (Modified)"]))
    );

    assert_eq!(report.deleted_row_id, second);
    assert_eq!(report.empty_delete_row_id, None);

    let expected = format!(
        "Row 1: [1, 'First']\n\
         Rowid 1: {first}\n\
         \n\
         Row 2: [2, 'Second']\n\
         Rowid 2: {second}\n\
         \n\
         Row 1: (1, 'First')\n\
         Row 2: (2, 'Second')\n\
         \n\
         Last updated row: (2, 'Second (Modified)')\n\
         Rowid of last deleted row: {second}\n\
         Rowid when no rows are deleted: None\n",
        first = first.map(|id| id.to_string()).unwrap_or_default(),
        second = second.map(|id| id.to_string()).unwrap_or_default(),
    );
    assert_eq!(output, expected);

    Ok(())
}

#[tokio::test]
async fn test_rerun_leaves_durable_state_unchanged() -> TestResult {
    let temp_dir = TempDir::new()?;
    let path = temp_dir.path().join("demo.db");

    let (first_report, first_output) = run_once(&path).await?;
    assert!(durable_rows(&path).await?.is_empty());

    let (second_report, second_output) = run_once(&path).await?;
    assert!(durable_rows(&path).await?.is_empty());

    assert_eq!(first_report, second_report);
    assert_eq!(first_output, second_output);

    Ok(())
}

#[tokio::test]
async fn test_existing_rows_are_restored_after_run() -> TestResult {
    let temp_dir = TempDir::new()?;
    let path = temp_dir.path().join("demo.db");

    let connection = open(&path).await?;
    ensure_schema(&connection).await?;
    let mut cursor = connection.cursor();
    cursor
        .execute(
            "insert into mytab (id, data) values (?, ?)",
            &sql_params![10, "Existing"],
        )
        .await?;
    drop(cursor);
    connection.commit().await?;
    connection.close().await?;

    let (report, _) = run_once(&path).await?;

    // the bulk update also touched the pre-existing row, yet only the last
    // inserted row is reported
    assert_eq!(report.updated_row_id, report.inserted[1].row_id);
    assert_eq!(report.deleted_row_id, report.inserted[1].row_id);
    assert_eq!(report.empty_delete_row_id, None);

    assert_eq!(
        durable_rows(&path).await?,
        vec![Row::new(sql_params![10, "Existing"])]
    );

    Ok(())
}

#[tokio::test]
async fn test_report_serializes_absent_ids_as_null() -> TestResult {
    let temp_dir = TempDir::new()?;
    let (report, _) = run_once(&temp_dir.path().join("demo.db")).await?;

    let json = serde_json::to_value(&report)?;
    assert!(json["empty_delete_row_id"].is_null());
    assert!(json["deleted_row_id"].is_i64());
    assert_eq!(json["inserted"][0]["row"], serde_json::json!([1, "First"]));

    Ok(())
}

#[tokio::test]
async fn test_missing_table_error_propagates_unmodified() -> TestResult {
    let temp_dir = TempDir::new()?;
    let connection = open(&temp_dir.path().join("demo.db")).await?;

    let mut out = Vec::new();
    let err = run(&connection, &mut out).await.unwrap_err();
    let db_err = err
        .downcast_ref::<DatabaseError>()
        .expect("driver error is passed through");
    assert!(matches!(db_err, DatabaseError::QueryError { .. }));
    assert!(out.is_empty());

    Ok(())
}

#[tokio::test]
async fn test_schema_setup_is_idempotent() -> TestResult {
    let temp_dir = TempDir::new()?;
    let connection = open(&temp_dir.path().join("demo.db")).await?;

    ensure_schema(&connection).await?;
    ensure_schema(&connection).await?;
    assert!(!connection.in_transaction());

    let mut cursor = connection.cursor();
    cursor.execute("select count(*) from mytab", &[]).await?;
    assert_eq!(
        cursor.fetch_one().await?.and_then(|row| row.get(0).cloned()),
        Some(SqlValue::Integer(0))
    );

    Ok(())
}
