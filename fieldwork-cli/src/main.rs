//! fieldwork: normalise records against declared entity schemas.
//!
//! Usage:
//!   fieldwork --schemas schemas.json --entity User --input users.csv --format csv
//!
//! Records are written to stdout, one JSON document per line; logs go to
//! stderr.

use anyhow::Result;
use clap::Parser;
use fieldwork_cli::{Args, run};
use std::io::{self, Write};
use tracing::{Level, info};
use tracing_subscriber::FmtSubscriber;

fn main() -> Result<()> {
    let args = Args::parse();
    let log_level = if args.verbose { Level::DEBUG } else { Level::INFO };
    FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .with_writer(io::stderr)
        .compact()
        .init();

    info!(schemas = %args.schemas.display(), entity = %args.entity, "fieldwork starting");
    let mut out = io::stdout().lock();
    run(&args, &mut out)?;
    out.flush()?;
    Ok(())
}
