//! Last Row Identifier Walkthrough
//!
//! Connects with the credentials from the environment and prints the row
//! identifier reported after each insert, update and delete.

use anyhow::{Context, Result};
use clap::Parser;
use dotenvy::dotenv;
use rowid_db::{connect, EchoHook};
use rowid_demo::cli::{Cli, OutputFormat};
use rowid_demo::{ensure_schema, env, run};
use std::io;
use tracing::subscriber;
use tracing_subscriber::{prelude::*, EnvFilter, Registry};

/// Logs go to stderr so stdout only carries the walkthrough.
fn init_tracing() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let subscriber = Registry::default()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr));

    subscriber::set_global_default(subscriber)
        .context("Failed to set global default tracing subscriber")?;
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();
    init_tracing()?;
    let cli = Cli::parse();
    cli.validate()?;

    let mut params = env::connect_params();
    if let Some(dsn) = cli.dsn {
        params.dsn = dsn;
    }

    let mut connection = connect(params).await?;
    if cli.echo_statements {
        connection = connection.with_hook(EchoHook);
    }

    ensure_schema(&connection).await?;

    match cli.format {
        OutputFormat::Text => {
            run(&connection, &mut io::stdout()).await?;
        }
        OutputFormat::Json => {
            let report = run(&connection, &mut io::sink()).await?;
            println!(
                "{}",
                serde_json::to_string_pretty(&report).context("Failed to serialize report")?
            );
        }
    }

    connection.close().await?;
    Ok(())
}
