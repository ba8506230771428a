//! keysift: Extract every value stored under a key from a large JSON array
//!
//! Usage:
//!   # Defaults: routes-large.json -> descriptions.txt, key "description"
//!   keysift
//!
//!   # Different key, smaller chunks, more workers
//!   keysift data.json -o titles.txt --key title --chunk-size 20 --max-concurrency 16
//!
//!   # Newline-delimited input, compact JSON report
//!   keysift --ndjson events.jsonl --compact
//!
//! Logs go to stderr (filter with RUST_LOG); the run report is printed to stdout.

#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

use anyhow::{Context, Result};
use clap::Parser;
use keysift::{InputFormat, Pipeline, RunReport, SiftConfig};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "keysift")]
#[command(about = "Extract all values of a key from nested JSON records", long_about = None)]
struct Args {
    /// Input file holding a JSON array of records
    #[arg(value_name = "FILE", default_value = "routes-large.json")]
    input: PathBuf,

    /// Output file, one extracted value per line
    #[arg(long, short = 'o', default_value = "descriptions.txt")]
    output: PathBuf,

    /// Key whose string values are collected (default: "description")
    #[arg(long)]
    key: Option<String>,

    /// Records per chunk (default: 50)
    #[arg(long)]
    chunk_size: Option<usize>,

    /// Maximum chunks extracted concurrently (default: 10)
    #[arg(long)]
    max_concurrency: Option<usize>,

    /// Process newline-delimited JSON (one record per line)
    #[arg(long)]
    ndjson: bool,

    /// Compact report output (no pretty-printing)
    #[arg(long)]
    compact: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args = Args::parse();

    // Build config
    let mut config = SiftConfig::default();
    if let Some(key) = args.key {
        config.target_key = key;
    }
    if let Some(size) = args.chunk_size {
        config.chunk_size = size;
    }
    if let Some(max) = args.max_concurrency {
        config.max_concurrency = max;
    }
    if args.ndjson {
        config.input_format = InputFormat::Ndjson;
    }

    tracing::info!(
        input = %args.input.display(),
        output = %args.output.display(),
        key = %config.target_key,
        chunk_size = config.chunk_size,
        max_concurrency = config.max_concurrency,
        "Starting extraction"
    );

    let pipeline = Pipeline::new(config).context("Invalid configuration")?;
    let summary = match pipeline.run_file(&args.input, &args.output).await {
        Ok(summary) => summary,
        Err(err) => {
            tracing::error!(kind = err.kind(), "{}", err);
            return Err(err).context("Extraction run failed");
        }
    };

    let report = RunReport::new(
        args.input.display().to_string(),
        args.output.display().to_string(),
        &summary,
    );
    let output = if args.compact {
        serde_json::to_string(&report)?
    } else {
        serde_json::to_string_pretty(&report)?
    };
    println!("{}", output);

    Ok(())
}
