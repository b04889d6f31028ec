use clap::{Parser, Subcommand, ValueEnum};
use runledger_core::SectionId;
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "runledger",
    version,
    about = "Ingest test-run logs into SQLite and report on recurring failures"
)]
pub struct Cli {
    #[command(subcommand)]
    pub cmd: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Ingest one log file, or every log file in a directory
    Ingest(IngestArgs),
    /// Print the failure report for a time window
    Report(ReportArgs),
    /// Write the FAIL results of one log file to per-suite YAML files
    Failures(FailuresArgs),
}

/// Store and config selection shared by the store-backed commands.
#[derive(clap::Args, Debug, Clone)]
pub struct StoreArgs {
    /// SQLite database (default: `db` from config, else runledger.db)
    #[arg(long, env = "RUNLEDGER_DB")]
    pub db: Option<PathBuf>,

    /// Config file (default: ./runledger.yaml when present)
    #[arg(long)]
    pub config: Option<PathBuf>,
}

#[derive(Parser, Debug, Clone)]
pub struct IngestArgs {
    /// Log file to ingest; takes precedence over --dir
    #[arg(long)]
    pub file: Option<PathBuf>,

    /// Directory whose files are ingested in name order
    #[arg(long)]
    pub dir: Option<PathBuf>,

    #[command(flatten)]
    pub store: StoreArgs,
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum ReportFormat {
    #[default]
    Text,
    Json,
}

#[derive(Parser, Debug, Clone)]
pub struct ReportArgs {
    /// Only results from the last N days
    #[arg(long, short = 'd', value_name = "N")]
    pub days_back: Option<u32>,

    /// Only results from the newest run
    #[arg(long, short = 'l')]
    pub latest: bool,

    #[arg(long, value_enum, default_value_t = ReportFormat::Text)]
    pub format: ReportFormat,

    /// Section to include (repeatable; default: all, or `report.sections` from config)
    #[arg(long = "section", value_name = "NAME", value_parser = parse_section)]
    pub sections: Vec<SectionId>,

    #[command(flatten)]
    pub store: StoreArgs,
}

#[derive(Parser, Debug, Clone)]
pub struct FailuresArgs {
    /// Log file to extract failures from
    #[arg(long)]
    pub file: PathBuf,

    /// Output directory (default: next to the input file)
    #[arg(long)]
    pub out_dir: Option<PathBuf>,

    #[arg(long)]
    pub config: Option<PathBuf>,
}

fn parse_section(s: &str) -> Result<SectionId, String> {
    SectionId::parse(s).ok_or_else(|| {
        let known: Vec<&str> = SectionId::ALL.iter().map(|id| id.as_str()).collect();
        format!("unknown section '{}' (expected one of: {})", s, known.join(", "))
    })
}
