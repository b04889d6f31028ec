//! Get-or-create writes for the four result entities.
//!
//! Identity checks are delegated to the UNIQUE constraints: every insert is
//! `ON CONFLICT DO NOTHING` followed by a lookup, so two writers racing on the same name still
//! end up sharing one row.

use crate::errors::Result;
use crate::model::{DecodedResult, RunDate};
use rusqlite::{params, Connection};
use serde::Serialize;
use tracing::info;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ChunkOutcome {
    pub added: usize,
    pub duplicates: usize,
}

impl ChunkOutcome {
    pub fn absorb(&mut self, other: ChunkOutcome) {
        self.added += other.added;
        self.duplicates += other.duplicates;
    }
}

/// First writer wins on `description`; later values for the same name are ignored.
pub(crate) fn get_or_create_test(
    conn: &Connection,
    name: &str,
    description: Option<&str>,
) -> Result<i64> {
    conn.execute(
        "INSERT INTO tests(name, description) VALUES (?1, ?2)
         ON CONFLICT(name) DO NOTHING",
        params![name, description],
    )?;
    Ok(conn.query_row(
        "SELECT test_id FROM tests WHERE name = ?1",
        params![name],
        |r| r.get(0),
    )?)
}

pub(crate) fn get_or_create_test_group(conn: &Connection, name: &str, test_id: i64) -> Result<i64> {
    conn.execute(
        "INSERT INTO test_groups(name, test_id) VALUES (?1, ?2)
         ON CONFLICT(name, test_id) DO NOTHING",
        params![name, test_id],
    )?;
    Ok(conn.query_row(
        "SELECT test_group_id FROM test_groups WHERE name = ?1 AND test_id = ?2",
        params![name, test_id],
        |r| r.get(0),
    )?)
}

pub(crate) fn get_or_create_suite(conn: &Connection, name: &str, test_group_id: i64) -> Result<i64> {
    conn.execute(
        "INSERT INTO suites(name, test_group_id) VALUES (?1, ?2)
         ON CONFLICT(name, test_group_id) DO NOTHING",
        params![name, test_group_id],
    )?;
    Ok(conn.query_row(
        "SELECT suite_id FROM suites WHERE name = ?1 AND test_group_id = ?2",
        params![name, test_group_id],
        |r| r.get(0),
    )?)
}

/// Returns false when a result for `(test_id, run_date)` already existed.
pub(crate) fn insert_result_once(
    conn: &Connection,
    test_id: i64,
    run_date: &RunDate,
    result: &DecodedResult,
) -> Result<bool> {
    let changed = conn.execute(
        "INSERT INTO test_results(status, elapsed_time, exception_name, exception_trace, test_id, run_date)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)
         ON CONFLICT(test_id, run_date) DO NOTHING",
        params![
            result.status.as_str(),
            result.elapsed_time,
            result.exception_name.as_deref().unwrap_or(""),
            result.exception_trace.as_deref().unwrap_or(""),
            test_id,
            run_date.to_db_string(),
        ],
    )?;
    Ok(changed == 1)
}

pub(crate) fn upsert_results(
    conn: &Connection,
    run_date: &RunDate,
    suite: &str,
    test_group: &str,
    results: &[DecodedResult],
) -> Result<ChunkOutcome> {
    let mut outcome = ChunkOutcome::default();
    for result in results {
        let test_id = get_or_create_test(conn, &result.test_name, result.description.as_deref())?;
        let test_group_id = get_or_create_test_group(conn, test_group, test_id)?;
        get_or_create_suite(conn, suite, test_group_id)?;

        if insert_result_once(conn, test_id, run_date, result)? {
            info!(
                "    ADD {} result for {} - {} - {}",
                run_date, suite, test_group, result.test_name
            );
            outcome.added += 1;
        } else {
            info!(
                "    SKIP duplicate {} result for {} - {} - {}",
                run_date, suite, test_group, result.test_name
            );
            outcome.duplicates += 1;
        }
    }
    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::TestStatus;
    use crate::storage::schema::DDL;
    use chrono::NaiveDate;

    fn conn() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(DDL).unwrap();
        conn
    }

    fn run(day: u32) -> RunDate {
        RunDate::new(
            NaiveDate::from_ymd_opt(2024, 3, day)
                .unwrap()
                .and_hms_opt(6, 0, 0)
                .unwrap(),
        )
    }

    fn result(name: &str, status: TestStatus) -> DecodedResult {
        DecodedResult {
            test_name: name.to_string(),
            status,
            elapsed_time: 0.5,
            exception_name: None,
            exception_trace: None,
            description: None,
        }
    }

    #[test]
    fn get_or_create_returns_existing_ids() {
        let c = conn();
        let a = get_or_create_test(&c, "t", Some("first")).unwrap();
        let b = get_or_create_test(&c, "t", Some("second")).unwrap();
        assert_eq!(a, b);
        let desc: Option<String> = c
            .query_row("SELECT description FROM tests WHERE test_id = ?1", [a], |r| r.get(0))
            .unwrap();
        assert_eq!(desc.as_deref(), Some("first"));

        let g1 = get_or_create_test_group(&c, "Smoke", a).unwrap();
        assert_eq!(g1, get_or_create_test_group(&c, "Smoke", a).unwrap());
        let s1 = get_or_create_suite(&c, "Nightly", g1).unwrap();
        assert_eq!(s1, get_or_create_suite(&c, "Nightly", g1).unwrap());
    }

    #[test]
    fn second_result_for_same_run_is_skipped_not_overwritten() {
        let c = conn();
        let first = upsert_results(&c, &run(1), "S", "G", &[result("t", TestStatus::Fail)]).unwrap();
        assert_eq!(first, ChunkOutcome { added: 1, duplicates: 0 });

        let again = upsert_results(&c, &run(1), "S", "G", &[result("t", TestStatus::Pass)]).unwrap();
        assert_eq!(again, ChunkOutcome { added: 0, duplicates: 1 });

        let status: String = c
            .query_row("SELECT status FROM test_results", [], |r| r.get(0))
            .unwrap();
        assert_eq!(status, "FAIL");
    }

    #[test]
    fn missing_exception_is_stored_as_empty_strings() {
        let c = conn();
        upsert_results(&c, &run(2), "S", "G", &[result("t", TestStatus::Pass)]).unwrap();
        let (name, trace): (String, String) = c
            .query_row(
                "SELECT exception_name, exception_trace FROM test_results",
                [],
                |r| Ok((r.get(0)?, r.get(1)?)),
            )
            .unwrap();
        assert_eq!(name, "");
        assert_eq!(trace, "");
    }
}
