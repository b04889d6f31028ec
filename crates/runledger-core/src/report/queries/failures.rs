use super::{limit_param, NamesByKey, RUN_DATE_COLUMN};
use crate::errors::Result;
use crate::report::table::{format_average, Table};
use crate::report::ReportContext;
use rusqlite::params_from_iter;
use rusqlite::types::Value;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TopFailingRow {
    pub test_name: String,
    pub failures: i64,
    pub groups: Vec<String>,
    pub suites: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AlwaysFailingRow {
    pub test_name: String,
    pub failures: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupFailureRateRow {
    pub test_group: String,
    pub failures: i64,
    pub runs: i64,
    pub average: f64,
}

/// Ties keep store order (`test_id`).
pub fn top_failing_tests(ctx: &ReportContext<'_>) -> Result<Vec<TopFailingRow>> {
    let sql = format!(
        "SELECT t.test_id, t.name, COUNT(*) AS fails
         FROM test_results tr
         JOIN tests t ON t.test_id = tr.test_id
         WHERE tr.status = 'FAIL'{}
         GROUP BY t.test_id
         ORDER BY fails DESC, t.test_id ASC
         LIMIT ?",
        ctx.predicate.sql(RUN_DATE_COLUMN)
    );
    let mut params = ctx.predicate.params();
    params.push(limit_param(ctx));

    let conn = ctx.store.lock()?;
    let mut stmt = conn.prepare(&sql)?;
    let ranked = stmt
        .query_map(params_from_iter(params), |r| {
            Ok((
                r.get::<_, i64>(0)?,
                TopFailingRow {
                    test_name: r.get(1)?,
                    failures: r.get(2)?,
                    groups: Vec::new(),
                    suites: Vec::new(),
                },
            ))
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    if ranked.is_empty() {
        return Ok(Vec::new());
    }

    let ids: Vec<Value> = ranked.iter().map(|(id, _)| Value::Integer(*id)).collect();
    let placeholders = vec!["?"; ids.len()].join(", ");
    let mut groups = NamesByKey::<i64>::query(
        &conn,
        &format!(
            "SELECT g.test_id, g.name FROM test_groups g WHERE g.test_id IN ({})",
            placeholders
        ),
        ids.clone(),
    )?;
    let mut suites = NamesByKey::<i64>::query(
        &conn,
        &format!(
            "SELECT g.test_id, s.name
             FROM suites s
             JOIN test_groups g ON g.test_group_id = s.test_group_id
             WHERE g.test_id IN ({})",
            placeholders
        ),
        ids,
    )?;

    Ok(ranked
        .into_iter()
        .map(|(id, mut row)| {
            row.groups = groups.take(&id);
            row.suites = suites.take(&id);
            row
        })
        .collect())
}

pub fn top_failing_tests_table(rows: &[TopFailingRow]) -> Table {
    let mut t = Table::new(
        "Tests with most failures",
        &["Failures", "Test", "Groups", "Suites"],
    );
    for row in rows {
        t.push_row(vec![
            row.failures.to_string(),
            row.test_name.clone(),
            row.groups.join(", "),
            row.suites.join(", "),
        ]);
    }
    t
}

/// Tests whose FAIL count equals the number of distinct runs in the window.
pub fn tests_always_failing(ctx: &ReportContext<'_>) -> Result<Vec<AlwaysFailingRow>> {
    let sql = format!(
        "SELECT t.name, COUNT(*) AS fails
         FROM test_results tr
         JOIN tests t ON t.test_id = tr.test_id
         WHERE tr.status = 'FAIL'{}
         GROUP BY t.test_id
         HAVING COUNT(*) = (SELECT COUNT(DISTINCT w.run_date)
                              FROM test_results w
                             WHERE 1 = 1{})
         ORDER BY t.name ASC",
        ctx.predicate.sql(RUN_DATE_COLUMN),
        ctx.predicate.sql("w.run_date")
    );
    let mut params = ctx.predicate.params();
    params.extend(ctx.predicate.params());

    let conn = ctx.store.lock()?;
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map(params_from_iter(params), |r| {
            Ok(AlwaysFailingRow {
                test_name: r.get(0)?,
                failures: r.get(1)?,
            })
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

pub fn tests_always_failing_table(rows: &[AlwaysFailingRow]) -> Table {
    let mut t = Table::new("Tests failing in every run", &["Test", "Failures"]);
    for row in rows {
        t.push_row(vec![row.test_name.clone(), row.failures.to_string()]);
    }
    t
}

/// FAIL results per group name divided by the runs in which that group reported anything.
pub fn avg_failures_per_group(ctx: &ReportContext<'_>) -> Result<Vec<GroupFailureRateRow>> {
    let sql = format!(
        "SELECT g.name,
                SUM(tr.status = 'FAIL'),
                COUNT(DISTINCT tr.run_date)
         FROM test_groups g
         JOIN test_results tr ON tr.test_id = g.test_id
         WHERE 1 = 1{}
         GROUP BY g.name",
        ctx.predicate.sql(RUN_DATE_COLUMN)
    );
    let conn = ctx.store.lock()?;
    let mut stmt = conn.prepare(&sql)?;
    let mut rows = stmt
        .query_map(params_from_iter(ctx.predicate.params()), |r| {
            let failures: i64 = r.get(1)?;
            let runs: i64 = r.get(2)?;
            Ok(GroupFailureRateRow {
                test_group: r.get(0)?,
                failures,
                runs,
                average: if runs > 0 {
                    failures as f64 / runs as f64
                } else {
                    0.0
                },
            })
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    rows.sort_by(|a, b| {
        b.average
            .total_cmp(&a.average)
            .then_with(|| a.test_group.cmp(&b.test_group))
    });
    Ok(rows)
}

pub fn avg_failures_per_group_table(rows: &[GroupFailureRateRow]) -> Table {
    let mut t = Table::new(
        "Average failures per run by test group",
        &["Average", "Test Group"],
    );
    for row in rows {
        t.push_row(vec![format_average(row.average), row.test_group.clone()]);
    }
    t
}
