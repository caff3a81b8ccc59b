//! # Rowid Database Library
//!
//! An asynchronous cursor layer over the embedded Turso/SQLite engine that
//! reports, after every INSERT, UPDATE or DELETE, the identifier of the last
//! row the statement affected.
//!
//! ## Features
//!
//! - **Scoped cursors**: released when dropped, rejected after `close`
//! - **Last row identifier**: `Option<RowId>`, `None` when no rows were affected
//! - **Implicit transactions**: nothing is durable until `commit`
//! - **Bind by position or by name**: `execute` and `execute_named`
//! - **Execution hooks**: observe every statement and fetch
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use rowid_db::{connect, sql_params, ConnectParams};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let connection = connect(ConnectParams::new("demo", "", "demo.db")).await?;
//!     let mut cursor = connection.cursor();
//!
//!     cursor
//!         .execute("insert into mytab (id, data) values (?, ?)", &sql_params![1, "First"])
//!         .await?;
//!     let row_id = cursor.last_row_id();
//!
//!     cursor
//!         .execute("select id, data from mytab where rowid = ?", &sql_params![row_id])
//!         .await?;
//!     println!("{:?}", cursor.fetch_one().await?);
//!
//!     drop(cursor);
//!     connection.close().await?;
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod connection;
pub mod cursor;
pub mod error;
pub mod hook;
pub mod statement;
pub mod types;

// Re-export commonly used types
pub use config::ConnectParams;
pub use connection::{connect, AsyncConnection};
pub use cursor::Cursor;
pub use error::{DatabaseError, Result};
pub use hook::{EchoHook, ExecutionHook};
pub use types::{display_row_id, Row, RowId, SqlValue};
