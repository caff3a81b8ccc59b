//! Scoped cursor
//!
//! A cursor executes statements on its connection, holds the result set of
//! the last query and reports the identifier of the last row touched by the
//! last data-modifying statement.

use crate::{
    connection::AsyncConnection,
    error::{DatabaseError, Result},
    statement::{self, DmlTarget, StatementKind},
    types::{Row, RowId, SqlValue},
};
use tracing::debug;

fn values(params: &[SqlValue]) -> Vec<turso::Value> {
    params.iter().map(turso::Value::from).collect()
}

fn convert_row(row: &turso::Row) -> Result<Row> {
    (0..row.column_count())
        .map(|i| {
            row.get_value(i).map(SqlValue::from).map_err(|e| {
                DatabaseError::generic_with_source(format!("Failed to read column {i}"), e)
            })
        })
        .collect::<Result<Vec<_>>>()
        .map(Row::new)
}

/// Cursor bound to one connection. Dropping it releases its result set.
pub struct Cursor<'c> {
    connection: &'c AsyncConnection,
    rows: Option<turso::Rows>,
    last_row_id: Option<RowId>,
    row_count: u64,
    closed: bool,
}

impl<'c> Cursor<'c> {
    pub(crate) fn new(connection: &'c AsyncConnection) -> Self {
        Self {
            connection,
            rows: None,
            last_row_id: None,
            row_count: 0,
            closed: false,
        }
    }

    /// Execute one statement with positional parameters.
    ///
    /// Queries open a result set for the fetch methods. INSERT, UPDATE and
    /// DELETE join the connection's transaction and record the identifier of
    /// the last row they affected, or `None` when they affected no rows.
    ///
    /// Positions follow the engine's numbering: `?` takes the next position,
    /// `?NNN` position NNN, and a repeated `:name` reuses the position of its
    /// first occurrence.
    pub async fn execute(&mut self, sql: &str, params: &[SqlValue]) -> Result<()> {
        self.ensure_open()?;
        if let Some(hook) = self.connection.hook() {
            hook.before_execute(sql, params);
        }
        let numbered = statement::number_placeholders(sql);
        self.run(&numbered.sql, params).await
    }

    /// Execute one statement binding `:name`, `@name` or `$name`
    /// placeholders by name. A name used several times is supplied once.
    /// Keys may be given with or without the placeholder's prefix; keys the
    /// statement does not use are ignored.
    pub async fn execute_named(&mut self, sql: &str, params: &[(&str, SqlValue)]) -> Result<()> {
        self.ensure_open()?;
        let numbered = statement::number_placeholders(sql);
        let values = numbered
            .names
            .iter()
            .enumerate()
            .map(|(i, name)| {
                let Some(name) = name else {
                    return Err(DatabaseError::unsupported(format!(
                        "placeholder {} is positional and cannot be bound by name",
                        i + 1
                    )));
                };
                params
                    .iter()
                    .find(|(key, _)| *key == name.as_str() || *key == &name[1..])
                    .map(|(_, value)| value.clone())
                    .ok_or_else(|| DatabaseError::UnboundParameter { name: name.clone() })
            })
            .collect::<Result<Vec<_>>>()?;

        if let Some(hook) = self.connection.hook() {
            hook.before_execute(sql, &values);
        }
        self.run(&numbered.sql, &values).await
    }

    async fn run(&mut self, sql: &str, params: &[SqlValue]) -> Result<()> {
        debug!("[DB] Executing: {}", sql);
        debug!("[DB] Params: {:?}", params);

        self.rows = None;
        self.last_row_id = None;
        self.row_count = 0;

        let kind = statement::classify(sql)?;
        if kind.modifies_data() {
            self.connection.begin_if_needed().await?;
        }

        let conn = self.connection.raw();
        match kind {
            StatementKind::Query => {
                let rows = conn
                    .query(sql, turso::params_from_iter(values(params)))
                    .await
                    .map_err(|e| DatabaseError::query(sql, e))?;
                self.rows = Some(rows);
            }
            StatementKind::Insert => {
                let affected = conn
                    .execute(sql, turso::params_from_iter(values(params)))
                    .await
                    .map_err(|e| DatabaseError::query(sql, e))?;
                self.row_count = affected;
                if affected > 0 {
                    self.last_row_id = Some(self.last_insert_rowid().await?);
                }
            }
            StatementKind::Update(target) => {
                self.reject_rowid_alias(&target).await?;
                self.run_located(sql, &target, params).await?;
            }
            StatementKind::Delete(target) => {
                self.run_located(sql, &target, params).await?;
            }
            StatementKind::TransactionControl => {
                return Err(DatabaseError::unsupported(format!(
                    "'{}' must go through AsyncConnection::commit or rollback",
                    sql.trim()
                )));
            }
            StatementKind::Other => {
                self.row_count = conn
                    .execute(sql, turso::params_from_iter(values(params)))
                    .await
                    .map_err(|e| DatabaseError::query(sql, e))?;
            }
        }

        debug!(
            "[DB] Affected/fetched rows: {}, last row id: {:?}",
            self.row_count, self.last_row_id
        );
        Ok(())
    }

    /// Identifier of the last row affected by the last INSERT, UPDATE or
    /// DELETE. `None` after a statement that affected no rows and after
    /// queries and schema statements.
    pub fn last_row_id(&self) -> Option<RowId> {
        self.last_row_id
    }

    /// Rows affected by the last data-modifying statement, or rows fetched so
    /// far from the current result set
    pub fn row_count(&self) -> u64 {
        self.row_count
    }

    /// Fetch the next row of the current result set
    pub async fn fetch_one(&mut self) -> Result<Option<Row>> {
        self.ensure_open()?;
        if let Some(hook) = self.connection.hook() {
            hook.before_fetch();
        }
        self.next_row().await
    }

    /// Fetch every remaining row of the current result set
    pub async fn fetch_all(&mut self) -> Result<Vec<Row>> {
        let mut rows = Vec::new();
        while let Some(row) = self.next_row().await? {
            rows.push(row);
        }
        Ok(rows)
    }

    /// Release the result set. Any later use fails with `CursorClosed`.
    pub fn close(&mut self) {
        if !self.closed {
            self.rows = None;
            self.closed = true;
            debug!("[DB] Cursor closed");
        }
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    fn ensure_open(&self) -> Result<()> {
        if self.closed {
            Err(DatabaseError::CursorClosed)
        } else {
            Ok(())
        }
    }

    /// Advance through the current result set, one row at a time:
    ///
    /// ```rust,no_run
    /// # async fn rows(connection: &rowid_db::AsyncConnection) -> rowid_db::Result<()> {
    /// let mut cursor = connection.cursor();
    /// cursor.execute("select id, data from mytab", &[]).await?;
    /// while let Some(row) = cursor.next_row().await? {
    ///     println!("{row}");
    /// }
    /// # Ok(())
    /// # }
    /// ```
    ///
    /// Unlike `fetch_one` this does not notify the connection's hook.
    pub async fn next_row(&mut self) -> Result<Option<Row>> {
        self.ensure_open()?;
        let Some(rows) = self.rows.as_mut() else {
            return Err(DatabaseError::NoResultSet);
        };
        let next = rows
            .next()
            .await
            .map_err(|e| DatabaseError::query("fetch next row", e))?;
        match next {
            Some(row) => {
                let row = convert_row(&row)?;
                self.row_count += 1;
                Ok(Some(row))
            }
            None => Ok(None),
        }
    }

    async fn last_insert_rowid(&self) -> Result<RowId> {
        let sql = "SELECT last_insert_rowid()";
        let mut rows = self
            .connection
            .raw()
            .query(sql, ())
            .await
            .map_err(|e| DatabaseError::query(sql, e))?;

        match rows.next().await.map_err(|e| DatabaseError::query(sql, e))? {
            Some(row) => {
                let raw: i64 = row.get(0).map_err(|e| {
                    DatabaseError::generic_with_source("Failed to read last insert rowid", e)
                })?;
                Ok(RowId::new(raw))
            }
            None => Err(DatabaseError::Generic {
                message: "last_insert_rowid() returned no row".to_string(),
                source: None,
            }),
        }
    }

    /// Run an UPDATE or DELETE, reporting the last row it touched
    async fn run_located(
        &mut self,
        sql: &str,
        target: &DmlTarget,
        params: &[SqlValue],
    ) -> Result<()> {
        let last = self.locate_last_row(target, params).await?;
        let affected = self
            .connection
            .raw()
            .execute(sql, turso::params_from_iter(values(params)))
            .await
            .map_err(|e| DatabaseError::query(sql, e))?;
        self.row_count = affected;
        if affected > 0 {
            self.last_row_id = last;
        }
        Ok(())
    }

    /// Assigning a table's INTEGER PRIMARY KEY moves the row the same way
    /// assigning `rowid` does, so the located row would no longer resolve
    async fn reject_rowid_alias(&self, target: &DmlTarget) -> Result<()> {
        let sql = format!("PRAGMA table_info({})", target.table_name);
        let mut rows = self
            .connection
            .raw()
            .query(&sql, ())
            .await
            .map_err(|e| DatabaseError::query(sql.as_str(), e))?;

        // (cid, name, type, notnull, dflt_value, pk)
        let mut key_columns = Vec::new();
        while let Some(row) = rows
            .next()
            .await
            .map_err(|e| DatabaseError::query(sql.as_str(), e))?
        {
            let row = convert_row(&row)?;
            if let (Some(SqlValue::Text(name)), Some(SqlValue::Text(declared)), Some(&SqlValue::Integer(pk))) =
                (row.get(1), row.get(2), row.get(5))
            {
                if pk > 0 {
                    key_columns.push((name.clone(), declared.clone()));
                }
            }
        }

        if let [(name, declared)] = key_columns.as_slice() {
            let assigned = target
                .assigned_columns
                .iter()
                .any(|c| c.eq_ignore_ascii_case(name));
            if assigned && declared.eq_ignore_ascii_case("integer") {
                return Err(DatabaseError::unsupported(format!(
                    "UPDATE assigning '{name}' moves the row it would report"
                )));
            }
        }
        Ok(())
    }

    /// Find the row an UPDATE or DELETE will touch last: the highest rowid
    /// matching its target and predicate, read in the same transaction before
    /// the statement runs.
    async fn locate_last_row(
        &self,
        target: &DmlTarget,
        params: &[SqlValue],
    ) -> Result<Option<RowId>> {
        let sql = target.locate_sql();
        let params = target.locate_params(params);
        debug!("[DB] Locating last row: {} {:?}", sql, params);

        let mut rows = self
            .connection
            .raw()
            .query(&sql, turso::params_from_iter(values(params)))
            .await
            .map_err(|e| DatabaseError::query(sql.as_str(), e))?;

        match rows
            .next()
            .await
            .map_err(|e| DatabaseError::query(sql.as_str(), e))?
        {
            Some(row) => {
                let raw: i64 = row.get(0).map_err(|e| {
                    DatabaseError::generic_with_source("Failed to read rowid", e)
                })?;
                Ok(Some(RowId::new(raw)))
            }
            None => Ok(None),
        }
    }
}

impl Drop for Cursor<'_> {
    fn drop(&mut self) {
        self.rows = None;
        debug!("[DB] Cursor released");
    }
}
