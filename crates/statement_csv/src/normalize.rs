use anyhow::{bail, Result};
use chrono::NaiveDate;
use models::{RawRecord, Transaction};
use tracing::{debug, warn};

/// Header aliases that may carry the posting date, checked in order.
const POSTING_DATE_ALIASES: [&str; 2] = ["post date", "posting date"];

/// Statement exports write dates as MM/DD/YYYY.
const POSTING_DATE_FORMAT: &str = "%m/%d/%Y";

/// Converts raw records into validated transactions.
///
/// Individual records that fail validation are dropped and logged, never
/// surfaced. Losing the whole batch is different: a file that had records
/// but normalized to none is suspicious, so that case is an error.
pub fn normalize_records(
    records: &[RawRecord],
    data_source: &str,
    account_id: &str,
) -> Result<Vec<Transaction>> {
    let mut transactions = Vec::with_capacity(records.len());
    for record in records {
        if let Some(transaction) = normalize_record(record, data_source, account_id) {
            transactions.push(transaction);
        }
    }

    if !records.is_empty() && transactions.is_empty() {
        bail!(
            "all {} records were dropped during normalization",
            records.len()
        );
    }

    Ok(transactions)
}

fn normalize_record(
    record: &RawRecord,
    data_source: &str,
    account_id: &str,
) -> Option<Transaction> {
    let posting_date = match posting_date_value(record) {
        Some(value) => value.to_string(),
        None => {
            debug!("skipping record with empty posting date");
            return None;
        }
    };

    if NaiveDate::parse_from_str(&posting_date, POSTING_DATE_FORMAT).is_err() {
        debug!(
            value = posting_date.as_str(),
            "skipping record with invalid posting date format"
        );
        return None;
    }

    let amount_raw = field(record, "amount");
    let amount = match amount_raw.parse::<f64>() {
        Ok(amount) => amount,
        Err(_) => {
            debug!(
                value = amount_raw.as_str(),
                "skipping record with invalid amount"
            );
            return None;
        }
    };

    // A bad balance is recoverable, unlike a bad amount: keep the record
    // and fall back to 0.0.
    let balance = match record.get("balance").map(String::as_str) {
        Some(raw) if !raw.is_empty() => match raw.parse::<f64>() {
            Ok(balance) => balance,
            Err(_) => {
                warn!(value = raw, "invalid balance value, defaulting to 0.0");
                0.0
            }
        },
        _ => 0.0,
    };

    Some(Transaction {
        details: field(record, "details"),
        posting_date,
        description: field(record, "description"),
        amount,
        category: field(record, "category"),
        txn_type: field(record, "type"),
        balance,
        check_or_slip_num: field(record, "check or slip #"),
        data_source: data_source.to_string(),
        account_id: account_id.to_string(),
    })
}

fn posting_date_value(record: &RawRecord) -> Option<&str> {
    POSTING_DATE_ALIASES
        .iter()
        .filter_map(|alias| record.get(*alias))
        .map(String::as_str)
        .find(|value| !value.is_empty())
}

fn field(record: &RawRecord, name: &str) -> String {
    record.get(name).cloned().unwrap_or_default()
}
