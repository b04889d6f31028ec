//! Extracts FAIL results from a log file into per-suite YAML files.
//!
//! Output layout per suite: `group -> test -> record`, in file order, written to
//! `<input file name>_<suite>_failures.yml`.

use crate::errors::{LedgerError, Result};
use crate::ingest::chunks::ChunkParser;
use crate::ingest::decode::decode_block;
use crate::model::{DecodedResult, TestStatus, TRACE_LINE_SEPARATOR};
use serde::Serialize;
use serde_yaml::{Mapping, Value};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Debug, Clone, PartialEq)]
pub struct SuiteFailures {
    pub suite: String,
    /// `(test_group, failed results)` in first-seen order.
    pub groups: Vec<(String, Vec<DecodedResult>)>,
}

#[derive(Serialize)]
struct FailureRecord<'a> {
    status: TestStatus,
    elapsed: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    exception: Option<BTreeMap<&'a str, Vec<&'a str>>>,
}

impl SuiteFailures {
    pub fn failure_count(&self) -> usize {
        self.groups.iter().map(|(_, r)| r.len()).sum()
    }

    pub fn to_yaml(&self) -> Result<String> {
        let mut root = Mapping::new();
        for (group, results) in &self.groups {
            let mut tests = Mapping::new();
            for r in results {
                let exception = r.exception_name.as_deref().map(|name| {
                    let lines = r
                        .exception_trace
                        .as_deref()
                        .map(|t| t.split(TRACE_LINE_SEPARATOR).collect::<Vec<_>>())
                        .unwrap_or_default();
                    BTreeMap::from([(name, lines)])
                });
                let record = FailureRecord {
                    status: r.status,
                    elapsed: r.elapsed_time,
                    description: r.description.as_deref(),
                    exception,
                };
                let value = serde_yaml::to_value(&record)
                    .map_err(|e| LedgerError::Output(e.to_string()))?;
                tests.insert(Value::String(r.test_name.clone()), value);
            }
            root.insert(Value::String(group.clone()), Value::Mapping(tests));
        }
        serde_yaml::to_string(&Value::Mapping(root)).map_err(|e| LedgerError::Output(e.to_string()))
    }
}

/// Collects FAIL results per suite; suites without failures are omitted.
pub fn extract_failures(text: &str, parser: &ChunkParser) -> Result<Vec<SuiteFailures>> {
    let mut suites: Vec<SuiteFailures> = Vec::new();
    for chunk in parser.parse(text) {
        let failed: Vec<DecodedResult> = decode_block(&chunk.block, &chunk.test_group)?
            .into_iter()
            .filter(|r| r.status == TestStatus::Fail)
            .collect();
        if failed.is_empty() {
            continue;
        }
        for r in &failed {
            info!(
                "ADDING - failed test {} - {} - {}",
                chunk.suite, chunk.test_group, r.test_name
            );
        }

        let idx = match suites.iter().position(|s| s.suite == chunk.suite) {
            Some(i) => i,
            None => {
                suites.push(SuiteFailures {
                    suite: chunk.suite.clone(),
                    groups: Vec::new(),
                });
                suites.len() - 1
            }
        };
        let groups = &mut suites[idx].groups;
        match groups.iter_mut().find(|(g, _)| *g == chunk.test_group) {
            Some((_, existing)) => existing.extend(failed),
            None => groups.push((chunk.test_group.clone(), failed)),
        }
    }
    Ok(suites)
}

/// Writes one YAML file per suite with failures and returns the written paths.
pub fn write_failure_files(
    input: &Path,
    out_dir: Option<&Path>,
    parser: &ChunkParser,
) -> Result<Vec<PathBuf>> {
    let bytes = std::fs::read(input).map_err(|e| LedgerError::io(input, e))?;
    let text = String::from_utf8_lossy(&bytes);
    let file_name = input
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "results".to_string());
    let dir = match out_dir {
        Some(d) => d.to_path_buf(),
        None => input
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default(),
    };

    let mut written = Vec::new();
    for suite in extract_failures(&text, parser)? {
        let path = dir.join(format!("{}_{}_failures.yml", file_name, suite.suite));
        info!(
            "output to file: \"{}\" ({} failed tests)",
            path.display(),
            suite.failure_count()
        );
        std::fs::write(&path, suite.to_yaml()?).map_err(|e| LedgerError::io(&path, e))?;
        written.push(path);
    }
    Ok(written)
}
