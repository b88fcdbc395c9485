//! op-ovsdb-inspect
//!
//! Loads an OVSDB schema document (for example the `vswitch.ovsschema`
//! shipped with Open vSwitch, or a saved `get_schema` reply) and prints its
//! tables, columns and column types.

use anyhow::{Context, Result};
use clap::Parser;
use std::fs;
use std::path::PathBuf;
use tracing::{debug, info};

use op_ovsdb::DatabaseSchema;

mod config;
mod report;

use config::{InspectConfig, OutputFormat};
use report::SchemaReport;

#[derive(Parser, Debug)]
#[command(name = "op-ovsdb-inspect")]
#[command(about = "Summarize an OVSDB schema document")]
struct Args {
    /// Schema file (defaults to $OVSDB_SCHEMA_PATH)
    schema: Option<PathBuf>,

    /// Database name (defaults to the document's "name")
    #[arg(long)]
    db: Option<String>,

    /// Only show this table
    #[arg(short, long)]
    table: Option<String>,

    /// Add the _uuid and _version columns to every table
    #[arg(long)]
    internal_columns: bool,

    /// Output format
    #[arg(short, long, value_enum)]
    format: Option<OutputFormat>,
}

fn main() -> Result<()> {
    config::load_environment();

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("op_ovsdb_inspect=info".parse()?)
                .add_directive("op_ovsdb=info".parse()?),
        )
        .init();

    let args = Args::parse();
    let defaults = InspectConfig::from_env();

    let path = args
        .schema
        .or(defaults.schema_path)
        .context("No schema file given and OVSDB_SCHEMA_PATH is not set")?;
    let format = args.format.unwrap_or(defaults.format);

    let raw = fs::read_to_string(&path)
        .with_context(|| format!("Failed to read schema file {}", path.display()))?;
    let json: serde_json::Value = serde_json::from_str(&raw)
        .with_context(|| format!("{} is not valid JSON", path.display()))?;

    let db_name = args
        .db
        .or_else(|| json.get("name").and_then(|n| n.as_str()).map(str::to_string))
        .context("Schema has no \"name\"; pass --db")?;
    debug!("Parsing schema {} from {}", db_name, path.display());

    let mut schema = DatabaseSchema::from_json(&db_name, &json)
        .with_context(|| format!("Invalid schema in {}", path.display()))?;
    if args.internal_columns || defaults.internal_columns {
        schema.populate_internally_generated_columns();
    }
    info!(
        "Loaded schema {} {} with {} tables",
        schema.name(),
        schema.version(),
        schema.tables().count()
    );

    if let Some(table) = args.table.as_deref() {
        if !schema.has_table(table) {
            anyhow::bail!("Table '{}' is not in schema {}", table, schema.name());
        }
    }

    let report = SchemaReport::build(&schema, args.table.as_deref());
    match format {
        OutputFormat::Text => print!("{}", report.render_text()),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
    }

    Ok(())
}
