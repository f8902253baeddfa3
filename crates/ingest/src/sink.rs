use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use anyhow::{bail, Context, Result};
use document_store::TransactionRepository;
use source_extractor::InfoExtractor;
use statement_csv::{normalize_records, StatementParser};
use tracing::{debug, info, warn};

use crate::Stats;

/// Directory layout and behavior flags for one ingestion run.
pub struct SinkOptions {
    /// Directory scanned for statement files.
    pub unprocessed_dir: PathBuf,
    /// Where successfully ingested files are moved, when enabled.
    pub processed_dir: PathBuf,
    /// Move files out of the unprocessed directory after persistence.
    pub move_processed_files: bool,
    /// Soft deadline for the whole run, checked between files.
    pub timeout: Option<Duration>,
}

/// Drives the ingestion pipeline over a directory of statement exports.
///
/// Files are processed one at a time, in listing order. Each file runs
/// through source extraction, CSV parsing, normalization, persistence and
/// (optionally) relocation; whatever goes wrong with one file is recorded in
/// [`Stats`] and the run moves on. The only fatal error is being unable to
/// list the directory in the first place.
pub struct Sink {
    repo: Box<dyn TransactionRepository>,
    extractor: Box<dyn InfoExtractor>,
    parser: Box<dyn StatementParser>,
    options: SinkOptions,
}

impl Sink {
    pub fn new(
        repo: Box<dyn TransactionRepository>,
        extractor: Box<dyn InfoExtractor>,
        parser: Box<dyn StatementParser>,
        options: SinkOptions,
    ) -> Self {
        Self {
            repo,
            extractor,
            parser,
            options,
        }
    }

    /// Processes every eligible file in the unprocessed directory and
    /// returns the run statistics.
    pub fn run(&self) -> Result<Stats> {
        let dir = &self.options.unprocessed_dir;
        info!(dir = %dir.display(), "reading statements from sink directory");

        let entries: Vec<fs::DirEntry> = fs::read_dir(dir)
            .and_then(|entries| entries.collect::<io::Result<_>>())
            .with_context(|| format!("failed to read directory {}", dir.display()))?;

        let deadline = self.options.timeout.map(|timeout| Instant::now() + timeout);

        let mut stats = Stats::new();
        stats.total_files = entries.len();

        for entry in &entries {
            let file_name = entry.file_name().to_string_lossy().into_owned();

            if deadline.is_some_and(|deadline| Instant::now() >= deadline) {
                warn!(file = file_name.as_str(), "run deadline exceeded");
                stats.add_failure(&file_name, "run deadline exceeded".to_string());
                continue;
            }

            match self.process_file(&entry.path(), &file_name) {
                Ok(()) => stats.increment_processed(),
                Err(err) => {
                    let reason = format!("{err:#}");
                    warn!(
                        file = file_name.as_str(),
                        error = reason.as_str(),
                        "failed to ingest file"
                    );
                    stats.add_failure(&file_name, reason);
                }
            }
        }

        Ok(stats)
    }

    fn process_file(&self, path: &Path, file_name: &str) -> Result<()> {
        validate_entry(path, file_name)?;

        let info = self.extractor.extract_info(file_name)?;
        let records = self
            .parser
            .parse(path, &info.data_source, &info.account_id)?;
        let transactions = normalize_records(&records, &info.data_source, &info.account_id)?;

        self.repo.bulk_upsert_transactions(&transactions)?;

        if self.options.move_processed_files {
            relocate_processed(path, &self.options.processed_dir)?;
        }

        debug!(file = file_name, "file ingested");
        Ok(())
    }
}

/// Only regular files with a `.csv`/`.CSV` suffix enter the pipeline.
fn validate_entry(path: &Path, file_name: &str) -> Result<()> {
    if path.is_dir() {
        bail!("{file_name} is a directory, not a statement file");
    }
    let is_csv = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"));
    if !is_csv {
        bail!("{file_name} does not have a .csv extension");
    }
    Ok(())
}

/// Moves an ingested file into the processed directory, creating it on
/// demand. Persistence has already succeeded by the time this runs: a failed
/// move leaves the file in place, and re-ingesting it later only re-upserts
/// the same natural keys.
fn relocate_processed(path: &Path, processed_dir: &Path) -> Result<()> {
    create_processed_dir(processed_dir)?;

    let base_name = path
        .file_name()
        .with_context(|| format!("statement path {} has no file name", path.display()))?;
    let target = processed_dir.join(base_name);
    fs::rename(path, &target).with_context(|| {
        format!(
            "failed to move {} to {}",
            path.display(),
            target.display()
        )
    })?;

    debug!(from = %path.display(), to = %target.display(), "relocated processed file");
    Ok(())
}

#[cfg(unix)]
fn create_processed_dir(dir: &Path) -> Result<()> {
    use std::os::unix::fs::DirBuilderExt;
    fs::DirBuilder::new()
        .recursive(true)
        .mode(0o750)
        .create(dir)
        .with_context(|| format!("failed to create directory {}", dir.display()))
}

#[cfg(not(unix))]
fn create_processed_dir(dir: &Path) -> Result<()> {
    fs::create_dir_all(dir).with_context(|| format!("failed to create directory {}", dir.display()))
}
