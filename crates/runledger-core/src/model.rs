use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Storage format of `test_results.run_date`.
pub const RUN_DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Separator used when persisting multi-line exception traces.
///
/// This is the two-character sequence backslash + `n`, not a newline.
pub const TRACE_LINE_SEPARATOR: &str = "\\n";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TestStatus {
    Pass,
    Fail,
    Incomplete,
    Skipped,
}

impl TestStatus {
    /// Column order used by per-status breakdowns.
    pub const ALL: [TestStatus; 4] = [
        TestStatus::Pass,
        TestStatus::Fail,
        TestStatus::Incomplete,
        TestStatus::Skipped,
    ];

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "PASS" => Some(Self::Pass),
            "FAIL" => Some(Self::Fail),
            "INCOMPLETE" => Some(Self::Incomplete),
            "SKIPPED" => Some(Self::Skipped),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pass => "PASS",
            Self::Fail => "FAIL",
            Self::Incomplete => "INCOMPLETE",
            Self::Skipped => "SKIPPED",
        }
    }
}

impl fmt::Display for TestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Timestamp shared by every result ingested from one log file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RunDate(NaiveDateTime);

impl RunDate {
    pub fn new(at: NaiveDateTime) -> Self {
        Self(at)
    }

    pub fn datetime(&self) -> NaiveDateTime {
        self.0
    }

    /// The value persisted in `test_results.run_date`.
    pub fn to_db_string(&self) -> String {
        self.0.format(RUN_DATE_FORMAT).to_string()
    }
}

impl fmt::Display for RunDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format(RUN_DATE_FORMAT))
    }
}

/// One header-delimited section of a log file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    pub suite: String,
    pub test_group: String,
    pub block: String,
}

/// A single test entry decoded from a chunk's block.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DecodedResult {
    pub test_name: String,
    pub status: TestStatus,
    pub elapsed_time: f64,
    pub exception_name: Option<String>,
    /// Trace lines joined with [`TRACE_LINE_SEPARATOR`].
    pub exception_trace: Option<String>,
    pub description: Option<String>,
}

/// Row counts of the four entity tables.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RowCounts {
    pub tests: i64,
    pub test_groups: i64,
    pub suites: i64,
    pub test_results: i64,
}
