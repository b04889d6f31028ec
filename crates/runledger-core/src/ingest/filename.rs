use crate::errors::{LedgerError, Result};
use crate::model::{RunDate, RUN_DATE_FORMAT};
use chrono::NaiveDateTime;
use lazy_static::lazy_static;
use regex::Regex;
use std::path::Path;

lazy_static! {
    /// A date, then (anywhere later) the first HH:MM.
    static ref RUN_STAMP: Regex = Regex::new(r"(\d{4}-\d{2}-\d{2}).*?(\d{2}:\d{2})").unwrap();
}

/// Derives the run date from the file name (not the directory part) of `path`.
///
/// `nightly-2024-01-02-03:04.log` → `2024-01-02 03:04:00`.
pub fn run_date_from_path(path: &Path) -> Result<RunDate> {
    let malformed = || LedgerError::MalformedFilename {
        path: path.to_path_buf(),
    };
    let name = path.file_name().ok_or_else(malformed)?.to_string_lossy();
    let caps = RUN_STAMP.captures(&name).ok_or_else(malformed)?;
    let stamp = format!("{} {}:00", &caps[1], &caps[2]);
    let at = NaiveDateTime::parse_from_str(&stamp, RUN_DATE_FORMAT).map_err(|_| malformed())?;
    Ok(RunDate::new(at))
}
