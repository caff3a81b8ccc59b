//! Last row identifier walkthrough
//!
//! Library side of the `last-rowid` binary, kept separate so tests can run the
//! walkthrough against a scratch database and inspect its report.

pub mod cli;
pub mod demo;
pub mod env;

pub use demo::{ensure_schema, run, DemoReport, InsertedRow, TABLE_DDL};
