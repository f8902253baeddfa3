use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// One CSV data row keyed by its own lowercased header names. No fixed
/// schema: whatever columns the statement carries end up here verbatim.
pub type RawRecord = HashMap<String, String>;

/// A normalized bank statement row, shaped for the document store.
///
/// The serde renames pin the persisted document field names, so stored
/// records keep matching their natural keys across re-ingestions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    #[serde(rename = "Details")]
    pub details: String,
    #[serde(rename = "PostingDate")]
    pub posting_date: String,
    #[serde(rename = "Description")]
    pub description: String,
    #[serde(rename = "Amount")]
    pub amount: f64,
    #[serde(rename = "category")]
    pub category: String,
    #[serde(rename = "Type")]
    pub txn_type: String,
    #[serde(rename = "Balance")]
    pub balance: f64,
    #[serde(rename = "CheckOrSlipNum")]
    pub check_or_slip_num: String,
    #[serde(rename = "dataSource")]
    pub data_source: String,
    #[serde(rename = "accountID")]
    pub account_id: String,
}

impl Transaction {
    /// Signature of the fields that identify a transaction across
    /// re-ingestions. Two rows with the same signature are the same logical
    /// record and must overwrite each other in the store.
    pub fn natural_key(&self) -> String {
        format!(
            "{}|{}|{}|{}|{}",
            self.details, self.posting_date, self.description, self.data_source, self.account_id
        )
    }
}

/// Append-only audit entry, one per successfully persisted file batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyncLog {
    pub collection_name: String,
    pub sync_timestamp: DateTime<Utc>,
    pub records_uploaded: i64,
}
