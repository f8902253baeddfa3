use std::fs::File;
use std::path::Path;

use anyhow::{Context, Result};
use csv::ReaderBuilder;
use models::RawRecord;
use tracing::{debug, info};

/// Lexical pass over a statement file: rows in, header-keyed string maps out.
/// Implementations must not coerce types or validate values.
pub trait StatementParser: Send + Sync {
    fn parse(&self, path: &Path, data_source: &str, account_id: &str) -> Result<Vec<RawRecord>>;
}

/// Comma-delimited parser tolerant of column reordering and short trailing
/// columns. The first line is the header; its lowercased names become the
/// record keys, so files may order their columns however they like.
pub struct CsvStatementParser;

impl CsvStatementParser {
    pub fn new() -> Self {
        CsvStatementParser
    }
}

impl Default for CsvStatementParser {
    fn default() -> Self {
        Self::new()
    }
}

impl StatementParser for CsvStatementParser {
    fn parse(&self, path: &Path, data_source: &str, account_id: &str) -> Result<Vec<RawRecord>> {
        info!(
            file = %path.display(),
            data_source,
            account_id,
            "parsing statement csv"
        );

        let file = File::open(path)
            .with_context(|| format!("failed to open file {}", path.display()))?;

        let mut reader = ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_reader(file);

        let mut rows = reader.records();

        // An empty file is a "no data" outcome, not a malformed one.
        let header = match rows.next() {
            Some(row) => {
                row.with_context(|| format!("failed to read CSV header from {}", path.display()))?
            }
            None => return Ok(Vec::new()),
        };
        let columns: Vec<String> = header.iter().map(|name| name.to_lowercase()).collect();

        let mut records = Vec::new();
        for row in rows {
            let row = row
                .with_context(|| format!("failed to read record from CSV in {}", path.display()))?;

            if row.len() < columns.len() {
                debug!(
                    file = %path.display(),
                    fields = row.len(),
                    expected = columns.len(),
                    "skipping short record"
                );
                continue;
            }

            let mut record = RawRecord::with_capacity(columns.len());
            for (idx, name) in columns.iter().enumerate() {
                record.insert(name.clone(), row.get(idx).unwrap_or("").to_string());
            }
            records.push(record);
        }

        Ok(records)
    }
}
