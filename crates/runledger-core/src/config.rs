use crate::errors::{LedgerError, Result};
use crate::report::SectionId;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const SUPPORTED_CONFIG_VERSION: u32 = 1;
pub const DEFAULT_CONFIG_FILE: &str = "runledger.yaml";
pub const DEFAULT_DB_FILE: &str = "runledger.db";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LedgerConfig {
    pub version: u32,
    pub db: Option<PathBuf>,
    pub ingest: IngestSettings,
    pub report: ReportSettings,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            version: SUPPORTED_CONFIG_VERSION,
            db: None,
            ingest: IngestSettings::default(),
            report: ReportSettings::default(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct IngestSettings {
    /// Extra regexes; matching lines are dropped like separator lines.
    pub ignore_patterns: Vec<String>,
}

impl IngestSettings {
    pub fn compiled_patterns(&self) -> Result<Vec<Regex>> {
        self.ignore_patterns
            .iter()
            .map(|p| {
                Regex::new(p)
                    .map_err(|e| LedgerError::Config(format!("invalid ignore pattern '{}': {}", p, e)))
            })
            .collect()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ReportSettings {
    pub column_width: usize,
    pub top_n: usize,
    pub trace_prefix_lines: usize,
    /// Empty means every section.
    pub sections: Vec<SectionId>,
}

impl Default for ReportSettings {
    fn default() -> Self {
        Self {
            column_width: 40,
            top_n: 10,
            trace_prefix_lines: 8,
            sections: Vec::new(),
        }
    }
}

pub fn load_config(path: &Path) -> Result<LedgerConfig> {
    let raw = std::fs::read_to_string(path).map_err(|e| {
        LedgerError::Config(format!("failed to read config {}: {}", path.display(), e))
    })?;
    let cfg: LedgerConfig = serde_yaml::from_str(&raw)
        .map_err(|e| LedgerError::Config(format!("failed to parse YAML: {}", e)))?;
    validate(&cfg)?;
    Ok(cfg)
}

/// Loads `explicit` if given, else `runledger.yaml` from the working directory when present,
/// else built-in defaults.
pub fn resolve_config(explicit: Option<&Path>) -> Result<LedgerConfig> {
    match explicit {
        Some(path) => load_config(path),
        None => {
            let default_path = Path::new(DEFAULT_CONFIG_FILE);
            if default_path.is_file() {
                load_config(default_path)
            } else {
                Ok(LedgerConfig::default())
            }
        }
    }
}

fn validate(cfg: &LedgerConfig) -> Result<()> {
    if cfg.version != SUPPORTED_CONFIG_VERSION {
        return Err(LedgerError::Config(format!(
            "unsupported config version {} (supported: {})",
            cfg.version, SUPPORTED_CONFIG_VERSION
        )));
    }
    if cfg.report.column_width < 8 {
        return Err(LedgerError::Config(format!(
            "report.column_width must be at least 8 (got {})",
            cfg.report.column_width
        )));
    }
    if cfg.report.top_n == 0 {
        return Err(LedgerError::Config("report.top_n must be positive".into()));
    }
    if cfg.report.trace_prefix_lines == 0 {
        return Err(LedgerError::Config(
            "report.trace_prefix_lines must be positive".into(),
        ));
    }
    cfg.ingest.compiled_patterns()?;
    Ok(())
}
