//! Command line of the `last-rowid` binary

use anyhow::{bail, Result};
use clap::{Parser, ValueEnum};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

/// Prints the row identifier reported after insert, update and delete statements.
#[derive(Parser, Debug)]
#[command(name = "last-rowid", version, about, long_about = None)]
pub struct Cli {
    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,

    /// Print every statement, its arguments and each fetch (text output only)
    #[arg(long)]
    pub echo_statements: bool,

    /// Connection descriptor, overriding ROWID_DEMO_CONNECT_STRING
    #[arg(long)]
    pub dsn: Option<String>,
}

impl Cli {
    /// Reject flag combinations whose output could not be parsed back.
    /// Echoed statements go to stdout, which json output keeps for the report.
    pub fn validate(&self) -> Result<()> {
        if self.echo_statements && self.format == OutputFormat::Json {
            bail!("--echo-statements cannot be combined with --format json");
        }
        Ok(())
    }
}
