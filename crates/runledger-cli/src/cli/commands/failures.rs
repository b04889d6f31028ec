use crate::cli::args::FailuresArgs;
use crate::exit_codes::EXIT_SUCCESS;
use runledger_core::config::resolve_config;
use runledger_core::ingest::failures::write_failure_files;
use runledger_core::ingest::ChunkParser;
use tracing::info;

pub fn run(args: FailuresArgs) -> anyhow::Result<i32> {
    let cfg = resolve_config(args.config.as_deref())?;
    let parser = ChunkParser::with_ignore_patterns(cfg.ingest.compiled_patterns()?);

    if let Some(dir) = &args.out_dir {
        std::fs::create_dir_all(dir)?;
    }
    let written = write_failure_files(&args.file, args.out_dir.as_deref(), &parser)?;
    if written.is_empty() {
        info!("no failures in {}", args.file.display());
    }
    for path in &written {
        println!("{}", path.display());
    }
    Ok(EXIT_SUCCESS)
}
