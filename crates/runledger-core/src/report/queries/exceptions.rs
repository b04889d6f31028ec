use super::{limit_param, NamesByKey, RUN_DATE_COLUMN};
use crate::errors::Result;
use crate::model::TRACE_LINE_SEPARATOR;
use crate::report::table::Table;
use crate::report::ReportContext;
use rusqlite::params_from_iter;
use serde::Serialize;
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExceptionNameRow {
    pub exception_name: String,
    pub occurrences: i64,
    pub tests: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TraceBucketRow {
    pub occurrences: i64,
    pub tests: Vec<String>,
    /// The shared prefix, one entry per line.
    pub trace: Vec<String>,
}

pub fn most_frequent_exception_names(ctx: &ReportContext<'_>) -> Result<Vec<ExceptionNameRow>> {
    let filter = ctx.predicate.sql(RUN_DATE_COLUMN);
    let sql = format!(
        "SELECT tr.exception_name, COUNT(*) AS num
         FROM test_results tr
         WHERE tr.exception_trace != ''{}
         GROUP BY tr.exception_name
         ORDER BY num DESC, tr.exception_name ASC
         LIMIT ?",
        filter
    );
    let names_sql = format!(
        "SELECT DISTINCT tr.exception_name, t.name
         FROM test_results tr
         JOIN tests t ON t.test_id = tr.test_id
         WHERE tr.exception_trace != ''{}",
        filter
    );
    let mut params = ctx.predicate.params();
    params.push(limit_param(ctx));

    let conn = ctx.store.lock()?;
    let mut stmt = conn.prepare(&sql)?;
    let mut rows = stmt
        .query_map(params_from_iter(params), |r| {
            Ok(ExceptionNameRow {
                exception_name: r.get(0)?,
                occurrences: r.get(1)?,
                tests: Vec::new(),
            })
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    let mut names = NamesByKey::<String>::query(&conn, &names_sql, ctx.predicate.params())?;
    for row in &mut rows {
        row.tests = names.take(&row.exception_name);
    }
    Ok(rows)
}

pub fn most_frequent_exception_names_table(rows: &[ExceptionNameRow]) -> Table {
    let mut t = Table::new("Most frequent exception names", &["Occurrences", "Exception"]);
    for row in rows {
        let mut details = vec!["Observed in:".to_string()];
        details.extend(row.tests.iter().map(|n| format!("  {}", n)));
        t.push_row_with_details(
            vec![row.occurrences.to_string(), row.exception_name.clone()],
            details,
        );
    }
    t
}

/// Groups traces by their first `trace_prefix_lines` lines.
///
/// Buckets are ordered by occurrence count, then by first appearance in the store.
pub fn most_frequent_exception_traces(ctx: &ReportContext<'_>) -> Result<Vec<TraceBucketRow>> {
    let sql = format!(
        "SELECT tr.exception_trace, t.name
         FROM test_results tr
         JOIN tests t ON t.test_id = tr.test_id
         WHERE tr.exception_trace != ''{}
         ORDER BY tr.test_result_id ASC",
        ctx.predicate.sql(RUN_DATE_COLUMN)
    );
    let conn = ctx.store.lock()?;
    let mut stmt = conn.prepare(&sql)?;
    let observed = stmt
        .query_map(params_from_iter(ctx.predicate.params()), |r| {
            Ok((r.get::<_, String>(0)?, r.get::<_, String>(1)?))
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    let mut buckets = bucket_traces(observed, ctx.settings.trace_prefix_lines);
    buckets.truncate(ctx.settings.top_n);
    Ok(buckets)
}

fn bucket_traces(observed: Vec<(String, String)>, prefix_lines: usize) -> Vec<TraceBucketRow> {
    let mut index: HashMap<Vec<String>, usize> = HashMap::new();
    let mut buckets: Vec<TraceBucketRow> = Vec::new();
    for (trace, test) in observed {
        let prefix: Vec<String> = trace
            .split(TRACE_LINE_SEPARATOR)
            .take(prefix_lines)
            .map(str::to_string)
            .collect();
        let slot = match index.get(&prefix) {
            Some(&i) => i,
            None => {
                index.insert(prefix.clone(), buckets.len());
                buckets.push(TraceBucketRow {
                    occurrences: 0,
                    tests: Vec::new(),
                    trace: prefix,
                });
                buckets.len() - 1
            }
        };
        let bucket = &mut buckets[slot];
        bucket.occurrences += 1;
        if !bucket.tests.contains(&test) {
            bucket.tests.push(test);
        }
    }
    for b in &mut buckets {
        b.tests.sort();
    }
    // Stable: equal counts keep first-seen order.
    buckets.sort_by(|a, b| b.occurrences.cmp(&a.occurrences));
    buckets
}

pub fn most_frequent_exception_traces_table(rows: &[TraceBucketRow]) -> Table {
    let mut t = Table::new("Most frequent exception traces", &["Occurrences", "Tests"]);
    for row in rows {
        let mut details = vec!["Observed in:".to_string()];
        details.extend(row.tests.iter().map(|n| format!("  {}", n)));
        details.push("Trace:".to_string());
        details.extend(row.trace.iter().map(|l| format!("  {}", l)));
        t.push_row_with_details(
            vec![row.occurrences.to_string(), row.tests.len().to_string()],
            details,
        );
    }
    t
}
