//! Log ingestion: file → chunks → decoded results → store.

pub mod chunks;
pub mod decode;
pub mod failures;
pub mod filename;
pub(crate) mod upsert;

pub use chunks::ChunkParser;
pub use upsert::ChunkOutcome;

use crate::errors::{LedgerError, Result};
use crate::model::{DecodedResult, RunDate};
use crate::storage::Store;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FileOutcome {
    pub path: PathBuf,
    pub run_date: String,
    pub chunks: usize,
    pub added: usize,
    pub duplicates: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BatchOutcome {
    pub files: Vec<FileOutcome>,
    /// Files whose name carried no run date.
    pub skipped: Vec<PathBuf>,
}

impl BatchOutcome {
    pub fn added(&self) -> usize {
        self.files.iter().map(|f| f.added).sum()
    }

    pub fn duplicates(&self) -> usize {
        self.files.iter().map(|f| f.duplicates).sum()
    }
}

pub struct Ingestor {
    store: Store,
    parser: ChunkParser,
}

impl Ingestor {
    pub fn new(store: Store) -> Self {
        Self {
            store,
            parser: ChunkParser::new(),
        }
    }

    pub fn with_parser(store: Store, parser: ChunkParser) -> Self {
        Self { store, parser }
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    /// Upserts one chunk's results in its own transaction.
    pub fn ingest_chunk(
        &self,
        run_date: &RunDate,
        suite: &str,
        test_group: &str,
        results: &[DecodedResult],
    ) -> Result<ChunkOutcome> {
        self.store.write_txn(|conn| {
            upsert::upsert_results(conn, run_date, suite, test_group, results)
        })
    }

    /// Decodes every chunk before writing anything, then upserts the whole file in one
    /// transaction. A decode error leaves the store untouched.
    pub fn ingest_file(&self, path: &Path) -> Result<FileOutcome> {
        let run_date = filename::run_date_from_path(path)?;
        let bytes = std::fs::read(path).map_err(|e| LedgerError::io(path, e))?;
        let text = String::from_utf8_lossy(&bytes);
        info!("FILE: \"{}\"", path.display());

        let mut decoded = Vec::new();
        for chunk in self.parser.parse(&text) {
            let results = decode::decode_block(&chunk.block, &chunk.test_group)?;
            decoded.push((chunk, results));
        }

        let total = self.store.write_txn(|conn| {
            let mut total = ChunkOutcome::default();
            for (chunk, results) in &decoded {
                info!("  {} - {}", chunk.suite, chunk.test_group);
                let outcome = upsert::upsert_results(
                    conn,
                    &run_date,
                    &chunk.suite,
                    &chunk.test_group,
                    results,
                )?;
                total.absorb(outcome);
            }
            Ok(total)
        })?;

        Ok(FileOutcome {
            path: path.to_path_buf(),
            run_date: run_date.to_db_string(),
            chunks: decoded.len(),
            added: total.added,
            duplicates: total.duplicates,
        })
    }

    /// Ingests every regular, non-hidden file directly inside `dir`, in name order.
    ///
    /// Files whose name carries no run date are skipped with a warning; any other error stops the
    /// batch. Files already committed stay committed.
    pub fn ingest_dir(&self, dir: &Path) -> Result<BatchOutcome> {
        let mut paths = Vec::new();
        for entry in std::fs::read_dir(dir).map_err(|e| LedgerError::io(dir, e))? {
            let entry = entry.map_err(|e| LedgerError::io(dir, e))?;
            let path = entry.path();
            let hidden = entry.file_name().to_string_lossy().starts_with('.');
            if !hidden && path.is_file() {
                paths.push(path);
            }
        }
        paths.sort();

        let mut batch = BatchOutcome::default();
        for path in paths {
            match self.ingest_file(&path) {
                Ok(outcome) => batch.files.push(outcome),
                Err(LedgerError::MalformedFilename { path }) => {
                    warn!("skipping {}: no run date in file name", path.display());
                    batch.skipped.push(path);
                }
                Err(e) => return Err(e),
            }
        }
        Ok(batch)
    }
}
