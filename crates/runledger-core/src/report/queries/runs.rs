use super::{NamesByKey, RUN_DATE_COLUMN};
use crate::errors::Result;
use crate::report::table::Table;
use crate::report::ReportContext;
use rusqlite::params_from_iter;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunCountRow {
    pub runs: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusPerRunRow {
    pub run_date: String,
    pub total: i64,
    pub pass: i64,
    pub fail: i64,
    pub incomplete: i64,
    pub skipped: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailuresPerRunRow {
    pub run_date: String,
    pub failures: i64,
    pub tests: Vec<String>,
}

pub fn run_count(ctx: &ReportContext<'_>) -> Result<Vec<RunCountRow>> {
    let sql = format!(
        "SELECT COUNT(DISTINCT tr.run_date) FROM test_results tr WHERE 1 = 1{}",
        ctx.predicate.sql(RUN_DATE_COLUMN)
    );
    let conn = ctx.store.lock()?;
    let runs: i64 = conn.query_row(&sql, params_from_iter(ctx.predicate.params()), |r| {
        r.get(0)
    })?;
    Ok(vec![RunCountRow { runs }])
}

pub fn run_count_table(rows: &[RunCountRow]) -> Table {
    let mut t = Table::new("Test runs in range", &["Runs"]);
    for row in rows {
        t.push_row(vec![row.runs.to_string()]);
    }
    t
}

pub fn status_per_run(ctx: &ReportContext<'_>) -> Result<Vec<StatusPerRunRow>> {
    let sql = format!(
        "SELECT tr.run_date,
                COUNT(*),
                SUM(tr.status = 'PASS'),
                SUM(tr.status = 'FAIL'),
                SUM(tr.status = 'INCOMPLETE'),
                SUM(tr.status = 'SKIPPED')
         FROM test_results tr
         WHERE 1 = 1{}
         GROUP BY tr.run_date
         ORDER BY tr.run_date ASC",
        ctx.predicate.sql(RUN_DATE_COLUMN)
    );
    let conn = ctx.store.lock()?;
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map(params_from_iter(ctx.predicate.params()), |r| {
            Ok(StatusPerRunRow {
                run_date: r.get(0)?,
                total: r.get(1)?,
                pass: r.get(2)?,
                fail: r.get(3)?,
                incomplete: r.get(4)?,
                skipped: r.get(5)?,
            })
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

pub fn status_per_run_table(rows: &[StatusPerRunRow]) -> Table {
    let mut t = Table::new(
        "Results per test run",
        &["Date", "Total", "PASS", "FAIL", "INCOMPLETE", "SKIPPED"],
    );
    for row in rows {
        t.push_row(vec![
            row.run_date.clone(),
            row.total.to_string(),
            row.pass.to_string(),
            row.fail.to_string(),
            row.incomplete.to_string(),
            row.skipped.to_string(),
        ]);
    }
    t
}

pub fn failures_per_run(ctx: &ReportContext<'_>) -> Result<Vec<FailuresPerRunRow>> {
    let filter = ctx.predicate.sql(RUN_DATE_COLUMN);
    let sql = format!(
        "SELECT tr.run_date, COUNT(*)
         FROM test_results tr
         WHERE tr.status = 'FAIL'{}
         GROUP BY tr.run_date
         ORDER BY tr.run_date ASC",
        filter
    );
    let names_sql = format!(
        "SELECT DISTINCT tr.run_date, t.name
         FROM test_results tr
         JOIN tests t ON t.test_id = tr.test_id
         WHERE tr.status = 'FAIL'{}",
        filter
    );
    let conn = ctx.store.lock()?;
    let mut stmt = conn.prepare(&sql)?;
    let mut rows = stmt
        .query_map(params_from_iter(ctx.predicate.params()), |r| {
            Ok(FailuresPerRunRow {
                run_date: r.get(0)?,
                failures: r.get(1)?,
                tests: Vec::new(),
            })
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    let mut names = NamesByKey::<String>::query(&conn, &names_sql, ctx.predicate.params())?;
    for row in &mut rows {
        row.tests = names.take(&row.run_date);
    }
    Ok(rows)
}

pub fn failures_per_run_table(rows: &[FailuresPerRunRow]) -> Table {
    let mut t = Table::new("Failures per test run", &["Date", "Fails"]);
    for row in rows {
        let mut details = vec!["Failed tests:".to_string()];
        details.extend(row.tests.iter().map(|n| format!("  {}", n)));
        t.push_row_with_details(vec![row.run_date.clone(), row.failures.to_string()], details);
    }
    t
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ReportSettings;
    use crate::model::TestStatus::*;
    use crate::report::filter::TimeFilter;
    use crate::report::queries::fixtures::*;

    #[test]
    fn counts_runs_and_statuses_per_run() {
        let s = store();
        add(&s, 1, "S", "G", &[result("a", Pass, 1.0), result("b", Fail, 1.0)]);
        add(&s, 2, "S", "G", &[result("a", Skipped, 0.0), result("b", Incomplete, 1.0)]);
        let settings = ReportSettings::default();
        let ctx = ReportContext::new(&s, TimeFilter::All, &settings, run(3).datetime()).unwrap();

        assert_eq!(run_count(&ctx).unwrap(), vec![RunCountRow { runs: 2 }]);

        let rows = status_per_run(&ctx).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].run_date, "2024-01-01 08:00:00");
        assert_eq!((rows[0].total, rows[0].pass, rows[0].fail), (2, 1, 1));
        assert_eq!((rows[1].incomplete, rows[1].skipped), (1, 1));
    }

    #[test]
    fn failures_per_run_lists_failing_tests() {
        let s = store();
        add(&s, 1, "S", "G", &[result("b", Fail, 1.0), result("a", Fail, 1.0), result("c", Pass, 1.0)]);
        add(&s, 2, "S", "G", &[result("a", Pass, 1.0)]);
        let settings = ReportSettings::default();
        let ctx = ReportContext::new(&s, TimeFilter::All, &settings, run(3).datetime()).unwrap();

        let rows = failures_per_run(&ctx).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].failures, 2);
        assert_eq!(rows[0].tests, vec!["a".to_string(), "b".to_string()]);
        let rendered = failures_per_run_table(&rows).render(settings.column_width);
        assert!(rendered.contains("    Failed tests:\n      a\n      b\n"));
    }

    #[test]
    fn failing_test_names_with_commas_stay_whole() {
        let s = store();
        add(&s, 1, "S", "G", &[result("login, with sso", Fail, 1.0), result("checkout", Fail, 1.0)]);
        add(&s, 1, "S", "H", &[result("pay, retry", Fail, 1.0)]);
        let settings = ReportSettings::default();
        let ctx = ReportContext::new(&s, TimeFilter::All, &settings, run(3).datetime()).unwrap();

        let rows = failures_per_run(&ctx).unwrap();
        assert_eq!(rows[0].failures, 3);
        assert_eq!(
            rows[0].tests,
            vec![
                "checkout".to_string(),
                "login, with sso".to_string(),
                "pay, retry".to_string()
            ]
        );
    }

    #[test]
    fn latest_filter_restricts_to_newest_run() {
        let s = store();
        add(&s, 1, "S", "G", &[result("a", Fail, 1.0)]);
        add(&s, 5, "S", "G", &[result("a", Pass, 1.0)]);
        let settings = ReportSettings::default();
        let ctx = ReportContext::new(&s, TimeFilter::Latest, &settings, run(9).datetime()).unwrap();
        assert_eq!(run_count(&ctx).unwrap()[0].runs, 1);
        assert!(failures_per_run(&ctx).unwrap().is_empty());
    }
}
