use std::fs;
use std::io;
use std::path::Path;
use std::time::Duration;

use document_store::{JsonDocumentStore, StoreError, TransactionRepository};
use ingest::{Sink, SinkOptions};
use models::Transaction;
use source_extractor::{KeywordExtractor, PatternExtractor};
use statement_csv::CsvStatementParser;
use tempfile::TempDir;

const VALID_STATEMENT: &str = "\
Details,Posting Date,Description,Amount,Type,Balance,Check or Slip #
DEBIT,01/01/2024,Coffee,-4.50,DEBIT_CARD,100.00,
CREDIT,01/02/2024,ONLINE PAYMENT THANK YOU,1000.00,PAYMENT,1100.00,
";

fn write_file(dir: &Path, name: &str, content: &str) {
    fs::write(dir.join(name), content).unwrap();
}

fn sink_over(
    repo: Box<dyn TransactionRepository>,
    unprocessed: &Path,
    processed: &Path,
    move_processed_files: bool,
) -> Sink {
    Sink::new(
        repo,
        Box::new(PatternExtractor::new("chase").unwrap()),
        Box::new(CsvStatementParser::new()),
        SinkOptions {
            unprocessed_dir: unprocessed.to_path_buf(),
            processed_dir: processed.to_path_buf(),
            move_processed_files,
            timeout: None,
        },
    )
}

/// Repository double that always fails its write.
struct FailingRepository;

impl TransactionRepository for FailingRepository {
    fn bulk_upsert_transactions(&self, _: &[Transaction]) -> document_store::Result<()> {
        Err(StoreError::WriteCollection {
            name: "transactions_chase".to_string(),
            source: io::Error::new(io::ErrorKind::Other, "disk full"),
        })
    }
}

#[test]
fn test_run_ingests_valid_statement_end_to_end() {
    let input = TempDir::new().unwrap();
    let store_dir = TempDir::new().unwrap();
    write_file(input.path(), "chase1234_jan.csv", VALID_STATEMENT);

    let sink = sink_over(
        Box::new(JsonDocumentStore::new(store_dir.path())),
        input.path(),
        &input.path().join("processed"),
        false,
    );
    let stats = sink.run().unwrap();

    assert_eq!(stats.total_files, 1);
    assert_eq!(stats.processed_files, 1);
    assert_eq!(stats.failed_files, 0);

    let store = JsonDocumentStore::new(store_dir.path());
    let mut persisted = store.transactions("chase").unwrap();
    persisted.sort_by(|a, b| a.posting_date.cmp(&b.posting_date));
    assert_eq!(persisted.len(), 2);
    assert_eq!(persisted[0].details, "DEBIT");
    assert_eq!(persisted[0].posting_date, "01/01/2024");
    assert_eq!(persisted[0].description, "Coffee");
    assert_eq!(persisted[0].amount, -4.50);
    assert_eq!(persisted[0].txn_type, "DEBIT_CARD");
    assert_eq!(persisted[0].balance, 100.00);
    assert_eq!(persisted[0].account_id, "1234");

    let log = store.sync_log().unwrap();
    assert_eq!(log.len(), 1);
    assert_eq!(log[0].records_uploaded, 2);
}

#[test]
fn test_run_isolates_per_file_failures() {
    // Scenario: 3 entries, one with a bad extension, one that no extractor
    // recognizes, one valid.
    let input = TempDir::new().unwrap();
    let store_dir = TempDir::new().unwrap();
    write_file(input.path(), "notes.txt", "not a statement");
    write_file(input.path(), "randomfile.csv", VALID_STATEMENT);
    write_file(input.path(), "chase1234_jan.csv", VALID_STATEMENT);

    let sink = sink_over(
        Box::new(JsonDocumentStore::new(store_dir.path())),
        input.path(),
        &input.path().join("processed"),
        false,
    );
    let stats = sink.run().unwrap();

    assert_eq!(stats.total_files, 3);
    assert_eq!(stats.processed_files, 1);
    assert_eq!(stats.failed_files, 2);
    assert!(stats.failures["notes.txt"].contains(".csv extension"));
    assert!(stats.failures["randomfile.csv"].contains("unable to extract source info"));
}

#[test]
fn test_run_records_subdirectories_as_failures() {
    let input = TempDir::new().unwrap();
    let store_dir = TempDir::new().unwrap();
    fs::create_dir(input.path().join("archive.csv")).unwrap();

    let sink = sink_over(
        Box::new(JsonDocumentStore::new(store_dir.path())),
        input.path(),
        &input.path().join("processed"),
        false,
    );
    let stats = sink.run().unwrap();

    assert_eq!(stats.total_files, 1);
    assert_eq!(stats.failed_files, 1);
    assert!(stats.failures["archive.csv"].contains("directory"));
}

#[test]
fn test_run_fails_only_for_unreadable_input_directory() {
    let store_dir = TempDir::new().unwrap();
    let sink = sink_over(
        Box::new(JsonDocumentStore::new(store_dir.path())),
        Path::new("definitely-not-a-directory"),
        Path::new("processed"),
        false,
    );

    let err = sink.run().unwrap_err();
    assert!(err.to_string().contains("failed to read directory"));
}

#[test]
fn test_reingesting_the_same_file_does_not_duplicate() {
    let input = TempDir::new().unwrap();
    let store_dir = TempDir::new().unwrap();
    write_file(input.path(), "chase1234_jan.csv", VALID_STATEMENT);

    for _ in 0..2 {
        let sink = sink_over(
            Box::new(JsonDocumentStore::new(store_dir.path())),
            input.path(),
            &input.path().join("processed"),
            false,
        );
        let stats = sink.run().unwrap();
        assert_eq!(stats.processed_files, 1);
    }

    let store = JsonDocumentStore::new(store_dir.path());
    assert_eq!(store.transactions("chase").unwrap().len(), 2);
    // The audit trail still shows both runs.
    assert_eq!(store.sync_log().unwrap().len(), 2);
}

#[test]
fn test_run_moves_processed_files_when_enabled() {
    let input = TempDir::new().unwrap();
    let store_dir = TempDir::new().unwrap();
    let processed = input.path().join("done");
    write_file(input.path(), "chase1234_jan.csv", VALID_STATEMENT);

    let sink = sink_over(
        Box::new(JsonDocumentStore::new(store_dir.path())),
        input.path(),
        &processed,
        true,
    );
    let stats = sink.run().unwrap();

    assert_eq!(stats.processed_files, 1);
    assert!(!input.path().join("chase1234_jan.csv").exists());
    assert!(processed.join("chase1234_jan.csv").exists());
}

#[test]
fn test_persistence_failure_is_recorded_not_fatal() {
    let input = TempDir::new().unwrap();
    write_file(input.path(), "chase1234_jan.csv", VALID_STATEMENT);

    let sink = sink_over(
        Box::new(FailingRepository),
        input.path(),
        &input.path().join("processed"),
        false,
    );
    let stats = sink.run().unwrap();

    assert_eq!(stats.processed_files, 0);
    assert_eq!(stats.failed_files, 1);
    assert!(stats.failures["chase1234_jan.csv"].contains("disk full"));
    // Persistence failed, so the file must stay put even with move enabled.
    assert!(input.path().join("chase1234_jan.csv").exists());
}

#[test]
fn test_total_normalization_loss_fails_the_file() {
    let input = TempDir::new().unwrap();
    let store_dir = TempDir::new().unwrap();
    write_file(
        input.path(),
        "chase1234_feb.csv",
        "Details,Posting Date,Description,Amount\nDEBIT,bad-date,Coffee,-4.50\n",
    );

    let sink = sink_over(
        Box::new(JsonDocumentStore::new(store_dir.path())),
        input.path(),
        &input.path().join("processed"),
        false,
    );
    let stats = sink.run().unwrap();

    assert_eq!(stats.failed_files, 1);
    assert!(stats.failures["chase1234_feb.csv"].contains("dropped during normalization"));
}

#[test]
fn test_header_only_file_is_processed_without_sync_log() {
    let input = TempDir::new().unwrap();
    let store_dir = TempDir::new().unwrap();
    write_file(
        input.path(),
        "chase1234_mar.csv",
        "Details,Posting Date,Description,Amount,Type,Balance,Check or Slip #\n",
    );

    let sink = sink_over(
        Box::new(JsonDocumentStore::new(store_dir.path())),
        input.path(),
        &input.path().join("processed"),
        false,
    );
    let stats = sink.run().unwrap();

    assert_eq!(stats.processed_files, 1);
    assert_eq!(stats.failed_files, 0);

    let store = JsonDocumentStore::new(store_dir.path());
    assert!(store.transactions("chase").unwrap().is_empty());
    assert!(store.sync_log().unwrap().is_empty());
}

#[test]
fn test_expired_deadline_fails_remaining_files() {
    let input = TempDir::new().unwrap();
    let store_dir = TempDir::new().unwrap();
    write_file(input.path(), "chase1234_jan.csv", VALID_STATEMENT);
    write_file(input.path(), "chase5678_jan.csv", VALID_STATEMENT);

    let sink = Sink::new(
        Box::new(JsonDocumentStore::new(store_dir.path())),
        Box::new(PatternExtractor::new("chase").unwrap()),
        Box::new(CsvStatementParser::new()),
        SinkOptions {
            unprocessed_dir: input.path().to_path_buf(),
            processed_dir: input.path().join("processed"),
            move_processed_files: false,
            timeout: Some(Duration::ZERO),
        },
    );
    let stats = sink.run().unwrap();

    assert_eq!(stats.total_files, 2);
    assert_eq!(stats.processed_files, 0);
    assert_eq!(stats.failed_files, 2);
    for reason in stats.failures.values() {
        assert!(reason.contains("deadline"));
    }
}

#[test]
fn test_keyword_extractor_handles_synthetic_files() {
    let input = TempDir::new().unwrap();
    let store_dir = TempDir::new().unwrap();
    write_file(input.path(), "test-synthetic-data.csv", VALID_STATEMENT);

    let sink = Sink::new(
        Box::new(JsonDocumentStore::new(store_dir.path())),
        Box::new(KeywordExtractor::default()),
        Box::new(CsvStatementParser::new()),
        SinkOptions {
            unprocessed_dir: input.path().to_path_buf(),
            processed_dir: input.path().join("processed"),
            move_processed_files: false,
            timeout: None,
        },
    );
    let stats = sink.run().unwrap();

    assert_eq!(stats.processed_files, 1);
    let store = JsonDocumentStore::new(store_dir.path());
    let persisted = store.transactions("synthetic").unwrap();
    assert_eq!(persisted.len(), 2);
    assert!(persisted.iter().all(|tx| tx.account_id == "0000"));
}
