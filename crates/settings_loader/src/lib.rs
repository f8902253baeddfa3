//! # Settings Loader
//!
//! Centralized runtime configuration for the loader binaries. Everything
//! comes from environment variables with logged defaults, so a bare
//! `ledgerlake ingest` works out of the box and a `.env` file (loaded by the
//! binary) can override any of it.

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use tracing::{debug, warn};

const DEFAULT_STORE_DIR: &str = "./store";
const DEFAULT_CSV_DIR: &str = "./data";
const DEFAULT_UNPROCESSED_DIR: &str = "unprocessed";
const DEFAULT_PROCESSED_DIR: &str = "processed";
const DEFAULT_MOVE_PROCESSED_FILES: bool = false;
const DEFAULT_TIMEOUT_SECS: u64 = 30;
const DEFAULT_SOURCE_PREFIX: &str = "chase";
const DEFAULT_SYNTHETIC_DIR: &str = "tmp/synthetic";
const DEFAULT_SYNTHETIC_ROWS: usize = 100;

const ENV_STORE_DIR: &str = "STORE_DIR";
const ENV_CSV_DIR: &str = "CSV_DIR";
const ENV_UNPROCESSED_DIR: &str = "UNPROCESSED_DIR";
const ENV_PROCESSED_DIR: &str = "PROCESSED_DIR";
const ENV_MOVE_PROCESSED_FILES: &str = "MOVE_PROCESSED_FILES";
const ENV_TIMEOUT_SECS: &str = "INGEST_TIMEOUT_SECS";
const ENV_SOURCE_PREFIX: &str = "SOURCE_PREFIX";

/// Application configuration assembled from the environment.
#[derive(Debug, Clone)]
pub struct Settings {
    /// Root directory of the JSON document store.
    pub store_dir: PathBuf,
    /// Directory scanned for new statement files.
    pub unprocessed_dir: PathBuf,
    /// Directory ingested files are moved into, when enabled.
    pub processed_dir: PathBuf,
    pub move_processed_files: bool,
    /// Soft deadline for a whole ingestion run.
    pub timeout: Duration,
    /// Institution prefix the pattern extractor matches on.
    pub source_prefix: String,
    /// Defaults for the synthetic statement generator.
    pub synthetic_dir: PathBuf,
    pub synthetic_rows: usize,
}

/// Reads the configuration from environment variables, falling back to
/// defaults for anything unset.
pub fn load_settings() -> Settings {
    let csv_dir = env_or(ENV_CSV_DIR, DEFAULT_CSV_DIR);
    let unprocessed_name = env_or(ENV_UNPROCESSED_DIR, DEFAULT_UNPROCESSED_DIR);
    let processed_name = env_or(ENV_PROCESSED_DIR, DEFAULT_PROCESSED_DIR);

    let unprocessed_dir = PathBuf::from(&csv_dir).join(unprocessed_name);
    let processed_dir = PathBuf::from(&csv_dir).join(processed_name);
    debug!(
        unprocessed = %unprocessed_dir.display(),
        processed = %processed_dir.display(),
        "constructed directory paths"
    );

    Settings {
        store_dir: PathBuf::from(env_or(ENV_STORE_DIR, DEFAULT_STORE_DIR)),
        unprocessed_dir,
        processed_dir,
        move_processed_files: env_bool(ENV_MOVE_PROCESSED_FILES, DEFAULT_MOVE_PROCESSED_FILES),
        timeout: Duration::from_secs(env_parsed(ENV_TIMEOUT_SECS, DEFAULT_TIMEOUT_SECS)),
        source_prefix: env_or(ENV_SOURCE_PREFIX, DEFAULT_SOURCE_PREFIX),
        synthetic_dir: PathBuf::from(DEFAULT_SYNTHETIC_DIR),
        synthetic_rows: DEFAULT_SYNTHETIC_ROWS,
    }
}

fn env_or(name: &str, default: &str) -> String {
    match env::var(name) {
        Ok(value) if !value.is_empty() => {
            debug!(var = name, value = value.as_str(), "using environment override");
            value
        }
        _ => {
            debug!(var = name, value = default, "using default");
            default.to_string()
        }
    }
}

fn env_bool(name: &str, default: bool) -> bool {
    match env::var(name) {
        Ok(value) if !value.is_empty() => match value.parse::<bool>() {
            Ok(parsed) => parsed,
            Err(_) => {
                warn!(
                    var = name,
                    value = value.as_str(),
                    default,
                    "invalid boolean value, using default"
                );
                default
            }
        },
        _ => default,
    }
}

fn env_parsed<T: std::str::FromStr + std::fmt::Display + Copy>(name: &str, default: T) -> T {
    match env::var(name) {
        Ok(value) if !value.is_empty() => match value.parse::<T>() {
            Ok(parsed) => parsed,
            Err(_) => {
                warn!(
                    var = name,
                    value = value.as_str(),
                    %default,
                    "invalid value, using default"
                );
                default
            }
        },
        _ => default,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Environment-variable tests mutate process state, so everything runs
    // in one test to avoid interleaving.
    #[test]
    fn test_load_settings_defaults_and_overrides() {
        let settings = load_settings();
        assert_eq!(
            settings.unprocessed_dir,
            PathBuf::from("./data").join("unprocessed")
        );
        assert_eq!(
            settings.processed_dir,
            PathBuf::from("./data").join("processed")
        );
        assert!(!settings.move_processed_files);
        assert_eq!(settings.timeout, Duration::from_secs(30));
        assert_eq!(settings.source_prefix, "chase");

        unsafe {
            env::set_var(ENV_CSV_DIR, "/srv/statements");
            env::set_var(ENV_MOVE_PROCESSED_FILES, "true");
            env::set_var(ENV_TIMEOUT_SECS, "120");
        }
        let settings = load_settings();
        assert_eq!(
            settings.unprocessed_dir,
            PathBuf::from("/srv/statements").join("unprocessed")
        );
        assert!(settings.move_processed_files);
        assert_eq!(settings.timeout, Duration::from_secs(120));

        unsafe {
            env::set_var(ENV_MOVE_PROCESSED_FILES, "not-a-bool");
        }
        let settings = load_settings();
        assert!(!settings.move_processed_files);

        unsafe {
            env::remove_var(ENV_CSV_DIR);
            env::remove_var(ENV_MOVE_PROCESSED_FILES);
            env::remove_var(ENV_TIMEOUT_SECS);
        }
    }
}
