//! Schema-tolerant reading of bank statement CSV exports.
//!
//! Parsing happens in two passes. The lexical pass ([`StatementParser`])
//! turns a file into header-keyed [`models::RawRecord`] maps without any
//! interpretation of the values. The normalization pass
//! ([`normalize_records`]) applies the date/amount/balance policy and
//! produces typed [`models::Transaction`] entities.

mod normalize;
mod parser;

pub use normalize::normalize_records;
pub use parser::{CsvStatementParser, StatementParser};
