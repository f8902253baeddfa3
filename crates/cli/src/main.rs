use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use document_store::JsonDocumentStore;
use ingest::{Sink, SinkOptions};
use settings_loader::{load_settings, Settings};
use source_extractor::{InfoExtractor, KeywordExtractor, PatternExtractor};
use statement_csv::CsvStatementParser;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Loads bank statement CSV exports into the local document store.
#[derive(Debug, Parser)]
#[command(name = "ledgerlake", version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Ingest every CSV file found in the unprocessed directory
    Ingest {
        /// Identify sources by filename keyword instead of the
        /// institution-prefix pattern
        #[arg(long)]
        keyword_extractor: bool,
    },
    /// Write a synthetic statement file for exercising the pipeline
    GenerateSynthetic {
        /// Number of rows to generate
        #[arg(long)]
        rows: Option<usize>,
        /// Directory to write the statement into
        #[arg(long)]
        dir: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    let settings = load_settings();

    match args.command {
        Command::Ingest { keyword_extractor } => run_ingest(&settings, keyword_extractor),
        Command::GenerateSynthetic { rows, dir } => {
            let rows = rows.unwrap_or(settings.synthetic_rows);
            let dir = dir.unwrap_or_else(|| settings.synthetic_dir.clone());
            let path = synthetic::write_statement(rows, &dir)
                .context("failed to generate synthetic statement")?;
            info!(file = %path.display(), rows, "synthetic statement generated");
            Ok(())
        }
    }
}

fn run_ingest(settings: &Settings, keyword_extractor: bool) -> Result<()> {
    let extractor: Box<dyn InfoExtractor> = if keyword_extractor {
        Box::new(KeywordExtractor::default())
    } else {
        Box::new(PatternExtractor::new(&settings.source_prefix)?)
    };

    let sink = Sink::new(
        Box::new(JsonDocumentStore::new(&settings.store_dir)),
        extractor,
        Box::new(CsvStatementParser::new()),
        SinkOptions {
            unprocessed_dir: settings.unprocessed_dir.clone(),
            processed_dir: settings.processed_dir.clone(),
            move_processed_files: settings.move_processed_files,
            timeout: Some(settings.timeout),
        },
    );

    let stats = sink.run().context("ingestion of CSV files failed")?;
    info!("data ingestion process completed");
    stats.log();

    Ok(())
}
