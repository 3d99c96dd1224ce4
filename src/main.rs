use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use ledger_ingest::{
    insert_entries, setup_database, verify_count, ImportBatch, Ledger, Pipeline, PipelineConfig,
    StatementFormat,
};
use rusqlite::Connection;
use std::fs::File;
use std::io::{self, BufReader, Write};
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Csv,
    Json,
}

/// Clean a bank statement export into outgoing transactions
#[derive(Debug, Parser)]
#[command(name = "ledger-ingest", version)]
struct Cli {
    /// Statement file to ingest
    input: PathBuf,

    /// Export format preset
    #[arg(long, default_value = "danskebank", env = "LEDGER_INGEST_FORMAT")]
    format: StatementFormat,

    /// JSON file with pipeline settings (overrides the preset)
    #[arg(long, env = "LEDGER_INGEST_CONFIG")]
    config: Option<PathBuf>,

    #[arg(long, env = "LEDGER_INGEST_DELIMITER")]
    delimiter: Option<char>,

    /// Encoding label, e.g. cp1252, latin1, utf-8
    #[arg(long, env = "LEDGER_INGEST_ENCODING")]
    encoding: Option<String>,

    #[arg(long, env = "LEDGER_INGEST_CHUNK_SIZE")]
    chunk_size: Option<usize>,

    #[arg(long, value_enum, default_value_t = OutputFormat::Csv)]
    output: OutputFormat,

    /// Also store the printed rows in this SQLite database
    #[arg(long, env = "LEDGER_INGEST_DB")]
    db: Option<PathBuf>,

    /// Print (and store) every row, deposits included, instead of outgoing only
    #[arg(long)]
    include_deposits: bool,

    /// Log level when RUST_LOG is unset
    #[arg(long, default_value = "info")]
    log_level: String,
}

/// What one invocation produced
#[derive(Debug, PartialEq)]
struct RunReport {
    rows: usize,
    total: f64,
    /// Rows newly written to the database, when `--db` was given
    inserted: Option<usize>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    setup_logging(&cli.log_level);

    let stdout = io::stdout();
    let mut out = stdout.lock();
    let report = run(&cli, &mut out)?;

    info!(rows = report.rows, total = report.total, "done");
    Ok(())
}

/// Ingest, print, then optionally persist the same rows that were printed
fn run<W: Write>(cli: &Cli, out: &mut W) -> Result<RunReport> {
    let config = build_config(cli)?;
    info!(
        format = cli.format.name(),
        input = %cli.input.display(),
        encoding = %config.encoding,
        chunk_size = config.chunk_size,
        "ingesting statement"
    );

    let file = File::open(&cli.input)
        .with_context(|| format!("Failed to open file: {}", cli.input.display()))?;
    let pipeline = Pipeline::new(config);
    let out_delimiter = pipeline.config().delimiter_byte()?;

    let entries = if cli.include_deposits {
        pipeline.ledger(BufReader::new(file)).map(Ledger::into_entries)
    } else {
        pipeline.run(BufReader::new(file)).map(|f| f.into_entries())
    }
    .with_context(|| format!("Failed to ingest {}", cli.input.display()))?;
    let ledger = Ledger::new(entries);

    match cli.output {
        OutputFormat::Csv => ledger.write_csv(&mut *out, out_delimiter)?,
        OutputFormat::Json => write_json(out, &ledger)?,
    }

    let inserted = match &cli.db {
        Some(db_path) => Some(persist(db_path, &cli.input, &ledger)?),
        None => None,
    };

    Ok(RunReport {
        rows: ledger.len(),
        total: ledger.total_amount(),
        inserted,
    })
}

/// Preset, then config file, then individual flags/env
fn build_config(cli: &Cli) -> Result<PipelineConfig> {
    let mut config = match &cli.config {
        Some(path) => PipelineConfig::from_json_file(path)?,
        None => cli.format.config(),
    };

    if let Some(delimiter) = cli.delimiter {
        config = config.with_delimiter(delimiter);
    }
    if let Some(encoding) = &cli.encoding {
        config = config.with_encoding(encoding);
    }
    if let Some(chunk_size) = cli.chunk_size {
        config = config.with_chunk_size(chunk_size);
    }

    config.validate()?;
    Ok(config)
}

fn persist(db_path: &Path, input: &Path, ledger: &Ledger) -> Result<usize> {
    let mut conn = Connection::open(db_path)
        .with_context(|| format!("Failed to open database: {}", db_path.display()))?;
    setup_database(&conn)?;

    let source_file = input
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("unknown.csv");
    let batch = ImportBatch::new(source_file);
    let inserted = insert_entries(&mut conn, ledger.entries(), &batch)?;
    let total = verify_count(&conn)?;
    info!(inserted, total, db = %db_path.display(), "database updated");

    Ok(inserted)
}

fn write_json<W: Write, T: serde::Serialize>(out: &mut W, value: &T) -> Result<()> {
    serde_json::to_writer_pretty(&mut *out, value).context("Failed to write JSON output")?;
    writeln!(out)?;
    Ok(())
}

fn setup_logging(log_level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(log_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).with_writer(io::stderr))
        .init();
}
