//! SQLite schema for ingested test results.
//!
//! Tables:
//! - `tests`: one row per globally unique test name
//! - `test_groups`: group names scoped to their test
//! - `suites`: suite names scoped to their test group
//! - `test_results`: at most one result per test and run date

pub const DDL: &str = r#"
CREATE TABLE IF NOT EXISTS tests (
    test_id          INTEGER PRIMARY KEY AUTOINCREMENT,
    name             TEXT NOT NULL UNIQUE,
    description      TEXT
);

CREATE TABLE IF NOT EXISTS test_groups (
    test_group_id    INTEGER PRIMARY KEY AUTOINCREMENT,
    name             TEXT NOT NULL,
    test_id          INTEGER NOT NULL REFERENCES tests(test_id),
    UNIQUE(name, test_id)
);

CREATE TABLE IF NOT EXISTS suites (
    suite_id         INTEGER PRIMARY KEY AUTOINCREMENT,
    name             TEXT NOT NULL,
    test_group_id    INTEGER NOT NULL REFERENCES test_groups(test_group_id),
    UNIQUE(name, test_group_id)
);

CREATE TABLE IF NOT EXISTS test_results (
    test_result_id   INTEGER PRIMARY KEY AUTOINCREMENT,
    status           TEXT NOT NULL,
    elapsed_time     REAL NOT NULL,
    exception_name   TEXT NOT NULL DEFAULT '',
    exception_trace  TEXT NOT NULL DEFAULT '',
    test_id          INTEGER NOT NULL REFERENCES tests(test_id),
    run_date         TEXT NOT NULL,
    UNIQUE(test_id, run_date)
);

CREATE INDEX IF NOT EXISTS idx_test_results_run_date ON test_results(run_date);
CREATE INDEX IF NOT EXISTS idx_test_results_status ON test_results(status);
CREATE INDEX IF NOT EXISTS idx_test_groups_test ON test_groups(test_id);
"#;
