use std::path::PathBuf;
use thiserror::Error;

/// Errors raised by ingestion and reporting.
#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("cannot derive run date from file name '{}' (expected YYYY-MM-DD ... HH:MM)", path.display())]
    MalformedFilename { path: PathBuf },

    #[error("failed to decode result block: {source}\n--- block ---\n{block}\n-------------")]
    BlockDecode {
        block: String,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("invalid result record for test '{test}': {detail}\n--- block ---\n{block}\n-------------")]
    InvalidRecord {
        test: String,
        detail: String,
        block: String,
    },

    #[error("Cannot combine --days-back with --latest")]
    ConflictingFilters { days_back: u32 },

    #[error("config error: {0}")]
    Config(String),

    #[error("failed to read '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("database error: {0}")]
    Database(String),

    #[error("failed to serialize output: {0}")]
    Output(String),
}

impl From<rusqlite::Error> for LedgerError {
    fn from(e: rusqlite::Error) -> Self {
        LedgerError::Database(e.to_string())
    }
}

impl LedgerError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        LedgerError::Io {
            path: path.into(),
            source,
        }
    }

    pub fn block_decode(block: &str, source: serde_yaml::Error) -> Self {
        LedgerError::BlockDecode {
            block: block.to_string(),
            source,
        }
    }

    pub fn invalid_record(block: &str, test: &str, detail: impl Into<String>) -> Self {
        LedgerError::InvalidRecord {
            test: test.to_string(),
            detail: detail.into(),
            block: block.to_string(),
        }
    }

    /// True for errors caused by how the tool was invoked rather than by the data or the store.
    pub fn is_usage(&self) -> bool {
        matches!(
            self,
            LedgerError::ConflictingFilters { .. } | LedgerError::Config(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, LedgerError>;
