use regex::Regex;
use thiserror::Error;

/// Data source tag and account identifier inferred from a statement filename.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceInfo {
    pub data_source: String,
    pub account_id: String,
}

pub type Result<T> = std::result::Result<T, ExtractError>;

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("unable to extract source info from filename: {0}")]
    UnableToExtractInfo(String),

    #[error("invalid extractor pattern for prefix '{prefix}': {source}")]
    InvalidPattern {
        prefix: String,
        source: regex::Error,
    },
}

/// Infers a [`SourceInfo`] from a filename. Which variant runs is chosen by
/// the caller; extractors never look at file contents.
pub trait InfoExtractor: Send + Sync {
    fn extract_info(&self, filename: &str) -> Result<SourceInfo>;
}

/// Matches a literal institution prefix followed by exactly four digits,
/// e.g. `chase1234_jan.csv` -> `{chase, 1234}`. Matching is case-insensitive
/// over the whole filename.
pub struct PatternExtractor {
    prefix: String,
    pattern: Regex,
}

impl PatternExtractor {
    pub fn new(prefix: &str) -> Result<Self> {
        let prefix = prefix.to_lowercase();
        let pattern =
            Regex::new(&format!(r"{}(\d{{4}})", regex::escape(&prefix))).map_err(|source| {
                ExtractError::InvalidPattern {
                    prefix: prefix.clone(),
                    source,
                }
            })?;
        Ok(Self { prefix, pattern })
    }
}

impl InfoExtractor for PatternExtractor {
    fn extract_info(&self, filename: &str) -> Result<SourceInfo> {
        let lower = filename.to_lowercase();
        match self.pattern.captures(&lower) {
            Some(caps) => Ok(SourceInfo {
                data_source: self.prefix.clone(),
                account_id: caps[1].to_string(),
            }),
            None => Err(ExtractError::UnableToExtractInfo(filename.to_string())),
        }
    }
}

/// Fallback for files without an account number in their name: a
/// case-insensitive keyword lookup. Matched files get the placeholder
/// account id `0000`.
pub struct KeywordExtractor {
    keywords: Vec<String>,
}

/// Placeholder account id for sources that carry none in the filename.
pub const PLACEHOLDER_ACCOUNT_ID: &str = "0000";

impl KeywordExtractor {
    pub fn new(keywords: &[&str]) -> Self {
        Self {
            keywords: keywords.iter().map(|k| k.to_lowercase()).collect(),
        }
    }
}

impl Default for KeywordExtractor {
    fn default() -> Self {
        Self::new(&["synthetic", "test"])
    }
}

impl InfoExtractor for KeywordExtractor {
    fn extract_info(&self, filename: &str) -> Result<SourceInfo> {
        let lower = filename.to_lowercase();
        for keyword in &self.keywords {
            if lower.contains(keyword.as_str()) {
                return Ok(SourceInfo {
                    data_source: keyword.clone(),
                    account_id: PLACEHOLDER_ACCOUNT_ID.to_string(),
                });
            }
        }
        Err(ExtractError::UnableToExtractInfo(filename.to_string()))
    }
}
