//! Execution hooks
//!
//! A hook installed on a connection sees every statement its cursors run and
//! every fetch they perform, which is enough to add statement echoing or
//! auditing without wrapping the cursor type.

use crate::types::SqlValue;

/// Observer called by cursors before they touch the engine
pub trait ExecutionHook: Send + Sync {
    /// Called before a statement is executed, with its values in position
    /// order (named values already resolved)
    fn before_execute(&self, _sql: &str, _params: &[SqlValue]) {}

    /// Called before a single row is fetched
    fn before_fetch(&self) {}
}

/// Prints each statement, its arguments and each fetch to standard output
#[derive(Debug, Default, Clone, Copy)]
pub struct EchoHook;

impl EchoHook {
    /// Lines printed for one execution
    pub fn execute_lines(sql: &str, params: &[SqlValue]) -> Vec<String> {
        let mut lines = vec![format!("EXECUTE {sql}"), "ARGS:".to_string()];
        lines.extend(
            params
                .iter()
                .enumerate()
                .map(|(i, value)| format!("    {} => {value}", i + 1)),
        );
        lines
    }
}

impl ExecutionHook for EchoHook {
    fn before_execute(&self, sql: &str, params: &[SqlValue]) {
        for line in Self::execute_lines(sql, params) {
            println!("{line}");
        }
    }

    fn before_fetch(&self) {
        println!("FETCHONE");
    }
}
