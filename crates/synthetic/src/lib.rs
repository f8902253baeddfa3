//! Synthetic statement generator for demos and end-to-end testing.
//!
//! The output file carries the recognized statement header and a filename
//! the keyword extractor matches, so it flows through the regular ingestion
//! pipeline without special casing.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::Local;
use csv::Writer;
use models::Transaction;
use rand::Rng;
use tracing::info;

const MAX_AMOUNT: f64 = 1_000.0;
const MAX_BALANCE: f64 = 10_000.0;
const MAX_ACCOUNT_ID: u32 = 10_000;

pub const SYNTHETIC_DATA_SOURCE: &str = "synthetic";
pub const OUTPUT_FILE_NAME: &str = "test-synthetic-data.csv";

const HEADER: [&str; 8] = [
    "Details",
    "Posting Date",
    "Description",
    "Category",
    "Amount",
    "Type",
    "Balance",
    "Check or Slip #",
];

/// Builds `rows` synthetic transactions dated today.
pub fn generate_documents(rows: usize) -> Vec<Transaction> {
    let mut rng = rand::thread_rng();
    let posting_date = Local::now().format("%m/%d/%Y").to_string();

    (0..rows)
        .map(|i| Transaction {
            details: "SALE".to_string(),
            posting_date: posting_date.clone(),
            description: format!("Synthetic transaction {i}"),
            amount: rng.gen::<f64>() * MAX_AMOUNT,
            category: SYNTHETIC_DATA_SOURCE.to_string(),
            txn_type: "DEBIT".to_string(),
            balance: rng.gen::<f64>() * MAX_BALANCE,
            check_or_slip_num: String::new(),
            data_source: SYNTHETIC_DATA_SOURCE.to_string(),
            account_id: format!("{:04}", rng.gen_range(0..MAX_ACCOUNT_ID)),
        })
        .collect()
}

/// Writes a synthetic statement CSV into `dir`, creating the directory on
/// demand. Returns the path of the written file.
pub fn write_statement(rows: usize, dir: &Path) -> Result<PathBuf> {
    create_output_dir(dir)?;

    let path = dir.join(OUTPUT_FILE_NAME);
    let mut writer = Writer::from_path(&path)
        .with_context(|| format!("failed to create file {}", path.display()))?;

    writer
        .write_record(HEADER)
        .context("failed to write header")?;

    for document in generate_documents(rows) {
        writer
            .write_record(&[
                document.details.as_str(),
                document.posting_date.as_str(),
                document.description.as_str(),
                document.category.as_str(),
                &format!("{:.2}", document.amount),
                document.txn_type.as_str(),
                &format!("{:.2}", document.balance),
                document.check_or_slip_num.as_str(),
            ])
            .context("failed to write row")?;
    }
    writer.flush().context("failed to flush statement file")?;

    info!(rows, file = %path.display(), "wrote synthetic statement");
    Ok(path)
}

#[cfg(unix)]
fn create_output_dir(dir: &Path) -> Result<()> {
    use std::os::unix::fs::DirBuilderExt;
    fs::DirBuilder::new()
        .recursive(true)
        .mode(0o750)
        .create(dir)
        .with_context(|| format!("failed to create directory {}", dir.display()))
}

#[cfg(not(unix))]
fn create_output_dir(dir: &Path) -> Result<()> {
    fs::create_dir_all(dir).with_context(|| format!("failed to create directory {}", dir.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use statement_csv::{normalize_records, CsvStatementParser, StatementParser};
    use tempfile::TempDir;

    #[test]
    fn test_generate_documents_shape() {
        let documents = generate_documents(5);
        assert_eq!(documents.len(), 5);
        for doc in &documents {
            assert_eq!(doc.details, "SALE");
            assert_eq!(doc.data_source, SYNTHETIC_DATA_SOURCE);
            assert_eq!(doc.account_id.len(), 4);
            assert!(doc.amount >= 0.0 && doc.amount < MAX_AMOUNT);
            assert!(doc.balance >= 0.0 && doc.balance < MAX_BALANCE);
        }
    }

    #[test]
    fn test_written_statement_round_trips_through_the_parser() {
        let dir = TempDir::new().unwrap();
        let path = write_statement(10, dir.path()).unwrap();
        assert_eq!(path.file_name().unwrap(), OUTPUT_FILE_NAME);

        let records = CsvStatementParser::new()
            .parse(&path, SYNTHETIC_DATA_SOURCE, "0000")
            .unwrap();
        assert_eq!(records.len(), 10);

        let transactions = normalize_records(&records, SYNTHETIC_DATA_SOURCE, "0000").unwrap();
        assert_eq!(transactions.len(), 10);
        assert!(transactions.iter().all(|tx| tx.txn_type == "DEBIT"));
    }

    #[test]
    fn test_write_statement_zero_rows_is_header_only() {
        let dir = TempDir::new().unwrap();
        let path = write_statement(0, dir.path()).unwrap();

        let records = CsvStatementParser::new()
            .parse(&path, SYNTHETIC_DATA_SOURCE, "0000")
            .unwrap();
        assert!(records.is_empty());
    }
}
