use serde::Serialize;
use std::collections::HashMap;
use tracing::{error, info};

/// Per-run counters, owned by the [`crate::Sink`] for the duration of one
/// ingestion run. Every directory entry ends up either processed or in
/// `failures`, never both.
#[derive(Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Stats {
    pub total_files: usize,
    pub processed_files: usize,
    pub failed_files: usize,
    pub failures: HashMap<String, String>,
}

impl Stats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a failed file and the reason it failed.
    pub fn add_failure(&mut self, file: &str, reason: String) {
        self.failed_files += 1;
        self.failures.insert(file.to_string(), reason);
    }

    pub fn increment_processed(&mut self) {
        self.processed_files += 1;
    }

    /// Emits the final statistics as pretty JSON.
    pub fn log(&self) {
        match serde_json::to_string_pretty(self) {
            Ok(json) => info!("ingestion stats:\n{json}"),
            Err(err) => error!(error = %err, "failed to encode ingestion stats"),
        }
    }
}
