//! CLI tool for schema management and data inspection.
//!
//! Provides commands for:
//! - Creating tables and printing their schema
//! - Inserting, selecting, updating and deleting rows with JSON arguments

mod cli;
mod convert;

use anyhow::{bail, Context};
use clap::Parser;
use quix_core::{Database, DbConfig, Row, SelectOptions};

use cli::{Cli, Commands};

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let config = DbConfig {
        lock_timeout_ms: cli.lock_timeout_ms,
        stale_lock_ms: cli.stale_lock_ms,
        ..DbConfig::with_data_dir(&cli.data_dir)
    };
    let db = Database::connect_with_config(config)
        .with_context(|| format!("failed to open {}", cli.data_dir.display()))?;

    run(&db, cli.command)
}

fn run(db: &Database, command: Commands) -> anyhow::Result<()> {
    match command {
        Commands::Tables => {
            for name in db.table_names()? {
                println!("{}", name);
            }
        }
        Commands::Show { table } => {
            let table = db.table(&table)?;
            println!("{}", serde_json::to_string_pretty(table.schema())?);
        }
        Commands::CreateTable {
            table,
            columns,
            unique,
        } => {
            let columns = columns
                .iter()
                .map(|spec| convert::parse_column(spec))
                .collect::<anyhow::Result<Vec<_>>>()?;
            let schema = quix_core::Schema::new(columns, unique);
            let created = db.create_table_with_schema(&table, schema)?;
            println!("{}", serde_json::to_string_pretty(created.schema())?);
        }
        Commands::Insert { table, data } => {
            let schema = db.table(&table)?.schema().clone();
            let row = convert::parse_row(&schema, &data)?;
            println!("{}", db.insert(&table, &row)?);
        }
        Commands::Select {
            table,
            filter,
            fields,
            limit,
        } => {
            let filter = parse_filter(db, &table, filter.as_deref())?;
            let options = SelectOptions {
                fields: fields.map(|f| f.split(',').map(|s| s.trim().to_string()).collect()),
                limit,
            };
            for record in db.select_with(&table, &filter, &options)? {
                println!("{}", serde_json::to_string(&record)?);
            }
        }
        Commands::Update {
            table,
            filter,
            set,
            all,
        } => {
            if filter.is_none() && !all {
                bail!("update without --where changes every row; pass --all to confirm");
            }
            let filter = parse_filter(db, &table, filter.as_deref())?;
            let schema = db.table(&table)?.schema().clone();
            let data = convert::parse_row(&schema, &set)?;
            println!("{}", db.update(&table, &filter, &data)?);
        }
        Commands::Delete { table, filter, all } => {
            if filter.is_none() && !all {
                bail!("delete without --where removes every row; pass --all to confirm");
            }
            let filter = parse_filter(db, &table, filter.as_deref())?;
            println!("{}", db.delete(&table, &filter)?);
        }
    }
    Ok(())
}

fn parse_filter(db: &Database, table: &str, filter: Option<&str>) -> anyhow::Result<Row> {
    match filter {
        Some(json) => convert::parse_row(db.table(table)?.schema(), json),
        None => Ok(Row::new()),
    }
}
