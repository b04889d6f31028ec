use super::args::*;

pub mod failures;
pub mod ingest;
pub mod report;

use runledger_core::config::{LedgerConfig, DEFAULT_DB_FILE};
use runledger_core::Store;
use std::path::{Path, PathBuf};
use tracing::debug;

pub fn dispatch(cli: Cli) -> anyhow::Result<i32> {
    match cli.cmd {
        Command::Ingest(args) => ingest::run(args),
        Command::Report(args) => report::run(args),
        Command::Failures(args) => failures::run(args),
    }
}

/// `--db` / `RUNLEDGER_DB`, then the config file, then the built-in default.
pub(crate) fn resolve_db_path(store: &StoreArgs, cfg: &LedgerConfig) -> PathBuf {
    store
        .db
        .clone()
        .or_else(|| cfg.db.clone())
        .unwrap_or_else(|| PathBuf::from(DEFAULT_DB_FILE))
}

pub(crate) fn open_store(store: &StoreArgs, cfg: &LedgerConfig) -> anyhow::Result<Store> {
    let path = resolve_db_path(store, cfg);
    ensure_parent_dir(&path)?;
    debug!("using results store {}", path.display());
    let store = Store::open(&path)?;
    store.init_schema()?;
    Ok(store)
}

pub(crate) fn ensure_parent_dir(path: &Path) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    Ok(())
}
