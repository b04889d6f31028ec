use super::{limit_param, RUN_DATE_COLUMN};
use crate::errors::Result;
use crate::report::table::{format_average, Table};
use crate::report::ReportContext;
use rusqlite::params_from_iter;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SlowTestRow {
    pub test_name: String,
    pub samples: i64,
    /// Mean elapsed seconds with the single slowest observation left out.
    pub average: f64,
}

/// Tests with one observation have nothing left after dropping the maximum and are omitted.
pub fn slowest_tests(ctx: &ReportContext<'_>) -> Result<Vec<SlowTestRow>> {
    let sql = format!(
        "SELECT t.name,
                COUNT(*),
                (SUM(tr.elapsed_time) - MAX(tr.elapsed_time)) / (COUNT(*) - 1) AS trimmed
         FROM test_results tr
         JOIN tests t ON t.test_id = tr.test_id
         WHERE 1 = 1{}
         GROUP BY t.test_id
         HAVING COUNT(*) > 1
         ORDER BY trimmed DESC, t.test_id ASC
         LIMIT ?",
        ctx.predicate.sql(RUN_DATE_COLUMN)
    );
    let mut params = ctx.predicate.params();
    params.push(limit_param(ctx));

    let conn = ctx.store.lock()?;
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map(params_from_iter(params), |r| {
            Ok(SlowTestRow {
                test_name: r.get(0)?,
                samples: r.get(1)?,
                average: r.get(2)?,
            })
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

pub fn slowest_tests_table(rows: &[SlowTestRow]) -> Table {
    let mut t = Table::new(
        "Slowest tests (average excluding slowest run)",
        &["Average (s)", "Samples", "Test"],
    );
    for row in rows {
        t.push_row(vec![
            format_average(row.average),
            row.samples.to_string(),
            row.test_name.clone(),
        ]);
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
    fn drops_the_single_slowest_observation() {
        let s = store();
        for (day, elapsed) in [(1, 1.0), (2, 2.0), (3, 3.0)] {
            add(&s, day, "S", "G", &[result("t", Pass, elapsed)]);
        }
        add(&s, 1, "S", "G", &[result("once", Pass, 99.0)]);
        let settings = ReportSettings::default();
        let ctx = ReportContext::new(&s, TimeFilter::All, &settings, run(9).datetime()).unwrap();

        let rows = slowest_tests(&ctx).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].test_name, "t");
        assert_eq!(rows[0].samples, 3);
        assert_eq!(format_average(rows[0].average), "1.50");
    }

    #[test]
    fn orders_by_trimmed_average() {
        let s = store();
        add(&s, 1, "S", "G", &[result("fast", Pass, 0.1), result("slow", Pass, 5.0)]);
        add(&s, 2, "S", "G", &[result("fast", Pass, 9.0), result("slow", Pass, 4.0)]);
        let settings = ReportSettings::default();
        let ctx = ReportContext::new(&s, TimeFilter::All, &settings, run(9).datetime()).unwrap();

        let names: Vec<String> = slowest_tests(&ctx)
            .unwrap()
            .into_iter()
            .map(|r| r.test_name)
            .collect();
        assert_eq!(names, vec!["slow".to_string(), "fast".to_string()]);
    }
}
