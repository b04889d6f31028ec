use super::open_store;
use crate::cli::args::IngestArgs;
use crate::exit_codes::EXIT_SUCCESS;
use runledger_core::config::resolve_config;
use runledger_core::ingest::{ChunkParser, Ingestor};
use tracing::info;

pub fn run(args: IngestArgs) -> anyhow::Result<i32> {
    if args.file.is_none() && args.dir.is_none() {
        println!("No file or directory to process");
        return Ok(EXIT_SUCCESS);
    }

    let cfg = resolve_config(args.store.config.as_deref())?;
    let parser = ChunkParser::with_ignore_patterns(cfg.ingest.compiled_patterns()?);
    let ingestor = Ingestor::with_parser(open_store(&args.store, &cfg)?, parser);

    if let Some(file) = &args.file {
        let outcome = ingestor.ingest_file(file)?;
        info!(
            "done: {} added, {} duplicate(s) skipped",
            outcome.added, outcome.duplicates
        );
    } else if let Some(dir) = &args.dir {
        let batch = ingestor.ingest_dir(dir)?;
        info!(
            "done: {} file(s), {} added, {} duplicate(s) skipped, {} file(s) without run date",
            batch.files.len(),
            batch.added(),
            batch.duplicates(),
            batch.skipped.len()
        );
    }
    Ok(EXIT_SUCCESS)
}
