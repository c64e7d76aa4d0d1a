//! Record normalisation for the `fieldwork` binary.
//!
//! Loads schema definitions, reads JSON or CSV records and writes each one
//! back out as canonical JSON after adaptation.

use anyhow::{Context, Result, anyhow, bail};
use clap::{Parser, ValueEnum};
use fieldwork_model::codec::{self, CsvRecords};
use fieldwork_model::{Entity, EntitySchema, ModelResult, SchemaDefinition, SchemaRegistry, declare_all};
use std::fs::{self, File};
use std::io::{self, BufReader, Read, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};

#[derive(Parser, Debug)]
#[command(name = "fieldwork")]
#[command(about = "Normalise records against declared entity schemas")]
pub struct Args {
    /// Schema definition file (a JSON definition or an array of them)
    #[arg(short, long)]
    pub schemas: PathBuf,

    /// Name of the entity every record is adapted to
    #[arg(short, long)]
    pub entity: String,

    /// Input file, or `-` for stdin
    #[arg(short, long, default_value = "-")]
    pub input: PathBuf,

    /// Input record format
    #[arg(short, long, value_enum, default_value_t = InputFormat::Json)]
    pub format: InputFormat,

    /// Pretty-print each output record
    #[arg(long)]
    pub pretty: bool,

    /// Log and skip records that fail instead of stopping
    #[arg(long)]
    pub keep_going: bool,

    /// Enable verbose debug logging
    #[arg(short, long)]
    pub verbose: bool,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum InputFormat {
    /// A JSON object or an array of objects
    Json,
    /// CSV with a header row
    Csv,
}

/// Output options for [`normalize`].
#[derive(Debug, Clone, Copy, Default)]
pub struct Options {
    pub pretty: bool,
    pub keep_going: bool,
}

/// Counts of what a run did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Report {
    pub written: usize,
    pub skipped: usize,
}

/// Declares every schema in a definition file.
pub fn load_schemas(path: &Path) -> Result<Vec<Arc<EntitySchema>>> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("Failed to read schema definitions from {}", path.display()))?;
    let definitions = SchemaDefinition::parse_many(&text)
        .with_context(|| format!("Failed to parse schema definitions in {}", path.display()))?;
    let schemas = declare_all(&definitions).context("Failed to declare schemas")?;
    debug!(path = %path.display(), schemas = schemas.len(), "Loaded schema definitions");
    Ok(schemas)
}

/// Looks up a declared schema by name.
pub fn find_schema(name: &str) -> Result<Arc<EntitySchema>> {
    let registry = SchemaRegistry::global();
    registry.get(name).ok_or_else(|| {
        anyhow!(
            "Unknown entity `{name}` (declared: {})",
            registry.names().join(", ")
        )
    })
}

/// Adapts every record of `input` to `schema` and writes one JSON document
/// per record to `out`.
pub fn normalize<R: Read, W: Write>(
    schema: &Arc<EntitySchema>,
    format: InputFormat,
    input: R,
    options: Options,
    out: &mut W,
) -> Result<Report> {
    match format {
        InputFormat::Json => {
            let text = io::read_to_string(input).context("Failed to read JSON input")?;
            let raw: serde_json::Value =
                serde_json::from_str(&text).context("Failed to parse JSON input")?;
            let items = match raw {
                serde_json::Value::Array(items) => items,
                other => vec![other],
            };
            let records = items.iter().map(|item| Entity::from_json(schema, item));
            emit(records, options, out)
        }
        InputFormat::Csv => {
            let records =
                CsvRecords::from_reader(schema, input).context("Failed to read CSV header")?;
            emit(records, options, out)
        }
    }
}

fn emit<W: Write>(
    records: impl Iterator<Item = ModelResult<Entity>>,
    options: Options,
    out: &mut W,
) -> Result<Report> {
    let mut report = Report::default();
    for (index, record) in records.enumerate() {
        let entity = match record {
            Ok(entity) => entity,
            Err(e) if options.keep_going => {
                warn!(record = index, error = %e, "Skipping record");
                report.skipped += 1;
                continue;
            }
            Err(e) => return Err(e).with_context(|| format!("Record {index} is invalid")),
        };
        let line = if options.pretty {
            codec::to_json_string_pretty(&entity)?
        } else {
            codec::to_json_string(&entity)?
        };
        writeln!(out, "{line}").context("Failed to write output")?;
        report.written += 1;
    }
    Ok(report)
}

/// Runs the binary's whole pipeline, writing records to `out`.
pub fn run<W: Write>(args: &Args, out: &mut W) -> Result<Report> {
    load_schemas(&args.schemas)?;
    let schema = find_schema(&args.entity)?;
    let options = Options {
        pretty: args.pretty,
        keep_going: args.keep_going,
    };

    let report = if args.input.as_os_str() == "-" {
        normalize(&schema, args.format, io::stdin().lock(), options, out)?
    } else {
        let file = File::open(&args.input)
            .with_context(|| format!("Failed to open input {}", args.input.display()))?;
        normalize(&schema, args.format, BufReader::new(file), options, out)?
    };

    if report.written == 0 && report.skipped > 0 {
        bail!("All {} records were rejected", report.skipped);
    }
    info!(
        entity = %schema.name(),
        written = report.written,
        skipped = report.skipped,
        "Normalised records"
    );
    Ok(report)
}
