//! The last row identifier walkthrough
//!
//! Inserts two rows, reads each back by its reported identifier, updates and
//! deletes every row, and deletes again when nothing is left, printing the
//! identifier each statement reported. Nothing is committed, so the run can
//! be repeated against the same database.

use anyhow::Result;
use rowid_db::{display_row_id, sql_params, AsyncConnection, Row, RowId, SqlValue};
use serde::Serialize;
use std::io::Write;
use tracing::info;

/// Table the walkthrough runs against
pub const TABLE_DDL: &str = "create table if not exists mytab (id integer, data text)";

const INSERT_SQL: &str = "insert into mytab (id, data) values (?, ?)";
const SELECT_BY_ROWID_SQL: &str = "select id, data from mytab where rowid = ?";
const UPDATE_ALL_SQL: &str = "update mytab set data = data || ' (Modified)'";
const DELETE_ALL_SQL: &str = "delete from mytab";

/// A row the walkthrough inserted and the identifier reported for it
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InsertedRow {
    pub row: Row,
    pub row_id: Option<RowId>,
}

/// Everything the walkthrough observed
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DemoReport {
    pub inserted: Vec<InsertedRow>,
    /// Rows fetched back by their reported identifiers, in insert order
    pub fetched: Vec<Option<Row>>,
    pub updated_row_id: Option<RowId>,
    pub last_updated_row: Option<Row>,
    pub deleted_row_id: Option<RowId>,
    pub empty_delete_row_id: Option<RowId>,
}

/// Bound values as a list, e.g. `[1, 'First']`
fn display_bound(values: &[SqlValue]) -> String {
    let values: Vec<String> = values.iter().map(ToString::to_string).collect();
    format!("[{}]", values.join(", "))
}

fn display_row(row: &Option<Row>) -> String {
    match row {
        Some(row) => row.to_string(),
        None => "None".to_string(),
    }
}

/// Create the walkthrough table when it does not exist yet. Runs outside any
/// transaction so the table survives the walkthrough's rollback.
pub async fn ensure_schema(connection: &AsyncConnection) -> Result<()> {
    let mut cursor = connection.cursor();
    cursor.execute(TABLE_DDL, &[]).await?;
    Ok(())
}

/// Run the walkthrough on `connection`, writing its lines to `out`
pub async fn run<W: Write>(connection: &AsyncConnection, out: &mut W) -> Result<DemoReport> {
    let mut cursor = connection.cursor();

    // insert a couple of rows and retain the identifier of each
    let mut inserted = Vec::new();
    for (n, (id, data)) in [(1, "First"), (2, "Second")].into_iter().enumerate() {
        let params = sql_params![id, data];
        cursor.execute(INSERT_SQL, &params).await?;
        let row = Row::new(params);
        let row_id = cursor.last_row_id();
        info!("Inserted {} with row id {:?}", row, row_id);

        writeln!(out, "Row {}: {}", n + 1, display_bound(row.values()))?;
        writeln!(out, "Rowid {}: {}", n + 1, display_row_id(row_id))?;
        writeln!(out)?;
        inserted.push(InsertedRow { row, row_id });
    }

    // each row can be fetched with the identifier that was reported
    let mut fetched = Vec::new();
    for (n, entry) in inserted.iter().enumerate() {
        cursor
            .execute(SELECT_BY_ROWID_SQL, &sql_params![entry.row_id])
            .await?;
        let row = cursor.fetch_one().await?;
        writeln!(out, "Row {}: {}", n + 1, display_row(&row))?;
        fetched.push(row);
    }
    writeln!(out)?;

    // updating several rows only reports the last updated row
    cursor.execute(UPDATE_ALL_SQL, &[]).await?;
    let updated_row_id = cursor.last_row_id();
    cursor
        .execute(SELECT_BY_ROWID_SQL, &sql_params![updated_row_id])
        .await?;
    let last_updated_row = cursor.fetch_one().await?;
    writeln!(out, "Last updated row: {}", display_row(&last_updated_row))?;

    // deleting several rows only reports the last deleted row
    cursor.execute(DELETE_ALL_SQL, &[]).await?;
    let deleted_row_id = cursor.last_row_id();
    writeln!(
        out,
        "Rowid of last deleted row: {}",
        display_row_id(deleted_row_id)
    )?;

    // deleting no rows reports no identifier at all
    cursor.execute(DELETE_ALL_SQL, &[]).await?;
    let empty_delete_row_id = cursor.last_row_id();
    writeln!(
        out,
        "Rowid when no rows are deleted: {}",
        display_row_id(empty_delete_row_id)
    )?;

    // no commit: the connection discards this work so the walkthrough can rerun
    Ok(DemoReport {
        inserted,
        fetched,
        updated_row_id,
        last_updated_row,
        deleted_row_id,
        empty_delete_row_id,
    })
}
