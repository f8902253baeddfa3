//! Durable persistence for normalized transactions.
//!
//! The [`TransactionRepository`] trait is the seam the ingestion pipeline
//! writes through; [`JsonDocumentStore`] is the bundled adapter, keeping one
//! JSON document collection per data source on disk.

mod json_store;

pub use json_store::JsonDocumentStore;

use models::Transaction;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, StoreError>;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to read collection {name}: {source}")]
    ReadCollection {
        name: String,
        source: std::io::Error,
    },

    #[error("failed to write collection {name}: {source}")]
    WriteCollection {
        name: String,
        source: std::io::Error,
    },

    #[error("collection {name} holds invalid JSON: {source}")]
    DecodeCollection {
        name: String,
        source: serde_json::Error,
    },

    #[error("failed to encode collection {name}: {source}")]
    EncodeCollection {
        name: String,
        source: serde_json::Error,
    },
}

/// Write-side contract for persisting a batch of transactions.
///
/// Upserts are keyed by [`Transaction::natural_key`], which is what makes
/// re-ingesting the same file safe: equal keys overwrite instead of
/// duplicating. An empty batch is a successful no-op.
pub trait TransactionRepository: Send + Sync {
    fn bulk_upsert_transactions(&self, transactions: &[Transaction]) -> Result<()>;
}
