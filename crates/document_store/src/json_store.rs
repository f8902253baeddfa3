use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use chrono::Utc;
use models::{SyncLog, Transaction};
use serde::de::DeserializeOwned;
use serde::Serialize;
use sha2::{Digest, Sha256};
use tracing::{debug, info};

use crate::{Result, StoreError, TransactionRepository};

const TRANSACTIONS_COLLECTION: &str = "transactions";
const SYNC_COLLECTION: &str = "dataSync";

/// File-backed document store: one JSON file per collection under a root
/// directory. Transactions live in `transactions_<data_source>.json` as an
/// object keyed by the hash of their natural key; the sync log is an array
/// in `dataSync.json`.
///
/// The ingestion run is the only writer, so whole-collection rewrites are
/// safe and need no locking.
pub struct JsonDocumentStore {
    root: PathBuf,
}

impl JsonDocumentStore {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    /// Reads back every transaction persisted for a data source. Mainly for
    /// operator inspection and tests; the ingestion pipeline itself never
    /// reads.
    pub fn transactions(&self, data_source: &str) -> Result<Vec<Transaction>> {
        let name = transactions_collection(data_source);
        let documents: BTreeMap<String, Transaction> =
            self.read_collection(&name)?.unwrap_or_default();
        Ok(documents.into_values().collect())
    }

    /// Reads back the full sync log, oldest entry first.
    pub fn sync_log(&self) -> Result<Vec<SyncLog>> {
        Ok(self.read_collection(SYNC_COLLECTION)?.unwrap_or_default())
    }

    fn collection_path(&self, name: &str) -> PathBuf {
        self.root.join(format!("{name}.json"))
    }

    fn read_collection<T: DeserializeOwned>(&self, name: &str) -> Result<Option<T>> {
        let path = self.collection_path(name);
        let raw = match fs::read_to_string(&path) {
            Ok(raw) => raw,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(source) => {
                return Err(StoreError::ReadCollection {
                    name: name.to_string(),
                    source,
                })
            }
        };
        serde_json::from_str(&raw)
            .map(Some)
            .map_err(|source| StoreError::DecodeCollection {
                name: name.to_string(),
                source,
            })
    }

    fn write_collection<T: Serialize>(&self, name: &str, value: &T) -> Result<()> {
        let encoded =
            serde_json::to_string_pretty(value).map_err(|source| StoreError::EncodeCollection {
                name: name.to_string(),
                source,
            })?;

        fs::create_dir_all(&self.root).map_err(|source| StoreError::WriteCollection {
            name: name.to_string(),
            source,
        })?;
        fs::write(self.collection_path(name), encoded).map_err(|source| {
            StoreError::WriteCollection {
                name: name.to_string(),
                source,
            }
        })
    }

    fn append_sync_log(&self, collection_name: &str, records_uploaded: i64) -> Result<()> {
        let mut log: Vec<SyncLog> = self.read_collection(SYNC_COLLECTION)?.unwrap_or_default();
        log.push(SyncLog {
            collection_name: collection_name.to_string(),
            sync_timestamp: Utc::now(),
            records_uploaded,
        });
        self.write_collection(SYNC_COLLECTION, &log)
    }
}

impl TransactionRepository for JsonDocumentStore {
    fn bulk_upsert_transactions(&self, transactions: &[Transaction]) -> Result<()> {
        if transactions.is_empty() {
            debug!("no transactions to upsert");
            return Ok(());
        }

        // A batch always comes from a single file, so a single data source.
        let data_source = &transactions[0].data_source;
        let name = transactions_collection(data_source);

        let mut documents: BTreeMap<String, Transaction> =
            self.read_collection(&name)?.unwrap_or_default();
        for transaction in transactions {
            documents.insert(document_id(transaction), transaction.clone());
        }
        self.write_collection(&name, &documents)?;

        info!(
            collection = name.as_str(),
            count = transactions.len(),
            "upserted documents into collection"
        );

        self.append_sync_log(&name, transactions.len() as i64)
    }
}

fn transactions_collection(data_source: &str) -> String {
    format!("{TRANSACTIONS_COLLECTION}_{data_source}")
}

/// Stable document id: hex digest of the natural key.
fn document_id(transaction: &Transaction) -> String {
    let mut hasher = Sha256::new();
    hasher.update(transaction.natural_key().as_bytes());
    hex::encode(hasher.finalize())
}
