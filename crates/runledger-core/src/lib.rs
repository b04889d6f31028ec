pub mod config;
pub mod errors;
pub mod ingest;
pub mod model;

pub mod report;
pub mod storage;

pub use errors::{LedgerError, Result};
pub use ingest::Ingestor;
pub use report::{Report, ReportContext, SectionId};
pub use storage::Store;
