//! Time-window selection for reports.
//!
//! The window is resolved once into a [`Predicate`] of typed clauses; query modules splice the
//! predicate's SQL (placeholders only) into their `WHERE` and bind its parameters.

use crate::errors::{LedgerError, Result};
use crate::model::RUN_DATE_FORMAT;
use crate::storage::Store;
use chrono::{Duration, NaiveDateTime};
use rusqlite::types::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeFilter {
    All,
    DaysBack(u32),
    Latest,
}

impl TimeFilter {
    pub fn from_selectors(days_back: Option<u32>, latest: bool) -> Result<Self> {
        match (days_back, latest) {
            (Some(days_back), true) => Err(LedgerError::ConflictingFilters { days_back }),
            (Some(n), false) => Ok(TimeFilter::DaysBack(n)),
            (None, true) => Ok(TimeFilter::Latest),
            (None, false) => Ok(TimeFilter::All),
        }
    }

    pub fn describe(&self) -> String {
        match self {
            TimeFilter::All => "All recorded test results".to_string(),
            TimeFilter::DaysBack(n) => format!("Last {} days recorded test results", n),
            TimeFilter::Latest => "Latest recorded test results".to_string(),
        }
    }

    /// `now` bounds the days-back window; `Latest` reads the newest run date from `store`.
    pub fn resolve(&self, store: &Store, now: NaiveDateTime) -> Result<Predicate> {
        let clause = match self {
            TimeFilter::All => return Ok(Predicate::all()),
            TimeFilter::DaysBack(n) => {
                let from = now
                    .checked_sub_signed(Duration::days(i64::from(*n)))
                    .unwrap_or(NaiveDateTime::MIN);
                Clause::Between {
                    from: from.format(RUN_DATE_FORMAT).to_string(),
                    to: now.format(RUN_DATE_FORMAT).to_string(),
                }
            }
            TimeFilter::Latest => match store.max_run_date()? {
                Some(max) => Clause::Equals(max),
                None => Clause::Nothing,
            },
        };
        Ok(Predicate {
            clauses: vec![clause],
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Clause {
    /// Inclusive on both ends.
    Between { from: String, to: String },
    Equals(String),
    Nothing,
}

/// Conjunction of run-date clauses.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Predicate {
    clauses: Vec<Clause>,
}

impl Predicate {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn clauses(&self) -> &[Clause] {
        &self.clauses
    }

    /// SQL fragment, each clause prefixed with ` AND `, testing `column`.
    ///
    /// `column` must be a trusted column reference; only `?` placeholders carry values.
    pub fn sql(&self, column: &str) -> String {
        let mut out = String::new();
        for clause in &self.clauses {
            match clause {
                Clause::Between { .. } => {
                    out.push_str(&format!(" AND {} BETWEEN ? AND ?", column));
                }
                Clause::Equals(_) => out.push_str(&format!(" AND {} = ?", column)),
                Clause::Nothing => out.push_str(" AND 1 = 0"),
            }
        }
        out
    }

    /// Parameters in placeholder order of [`Predicate::sql`].
    pub fn params(&self) -> Vec<Value> {
        let mut out = Vec::new();
        for clause in &self.clauses {
            match clause {
                Clause::Between { from, to } => {
                    out.push(Value::Text(from.clone()));
                    out.push(Value::Text(to.clone()));
                }
                Clause::Equals(v) => out.push(Value::Text(v.clone())),
                Clause::Nothing => {}
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn now() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, 10)
            .unwrap()
            .and_hms_opt(12, 30, 0)
            .unwrap()
    }

    fn store() -> Store {
        let store = Store::memory().unwrap();
        store.init_schema().unwrap();
        store
    }

    #[test]
    fn days_back_and_latest_conflict() {
        let err = TimeFilter::from_selectors(Some(7), true).unwrap_err();
        assert!(matches!(err, LedgerError::ConflictingFilters { days_back: 7 }));
        assert!(err.is_usage());
        assert_eq!(TimeFilter::from_selectors(None, false).unwrap(), TimeFilter::All);
    }

    #[test]
    fn descriptions() {
        assert_eq!(TimeFilter::All.describe(), "All recorded test results");
        assert_eq!(
            TimeFilter::DaysBack(3).describe(),
            "Last 3 days recorded test results"
        );
        assert_eq!(TimeFilter::Latest.describe(), "Latest recorded test results");
    }

    #[test]
    fn all_adds_no_sql() {
        let p = TimeFilter::All.resolve(&store(), now()).unwrap();
        assert_eq!(p.sql("tr.run_date"), "");
        assert!(p.params().is_empty());
    }

    #[test]
    fn days_back_binds_both_bounds() {
        let p = TimeFilter::DaysBack(7).resolve(&store(), now()).unwrap();
        assert_eq!(p.sql("tr.run_date"), " AND tr.run_date BETWEEN ? AND ?");
        assert_eq!(
            p.params(),
            vec![
                Value::Text("2024-03-03 12:30:00".into()),
                Value::Text("2024-03-10 12:30:00".into()),
            ]
        );
    }

    #[test]
    fn huge_days_back_clamps_instead_of_overflowing() {
        let p = TimeFilter::DaysBack(u32::MAX).resolve(&store(), now()).unwrap();
        assert_eq!(p.params().len(), 2);
    }

    #[test]
    fn latest_on_empty_store_matches_nothing() {
        let p = TimeFilter::Latest.resolve(&store(), now()).unwrap();
        assert_eq!(p.clauses(), &[Clause::Nothing]);
        assert_eq!(p.sql("run_date"), " AND 1 = 0");
    }

    #[test]
    fn latest_uses_max_run_date() {
        let s = store();
        {
            let conn = s.lock().unwrap();
            conn.execute("INSERT INTO tests(name) VALUES ('t')", []).unwrap();
            for d in ["2024-01-01 00:00:00", "2024-02-01 00:00:00"] {
                conn.execute(
                    "INSERT INTO test_results(status, elapsed_time, test_id, run_date)
                     VALUES ('PASS', 1.0, 1, ?1)",
                    [d],
                )
                .unwrap();
            }
        }
        let p = TimeFilter::Latest.resolve(&s, now()).unwrap();
        assert_eq!(p.params(), vec![Value::Text("2024-02-01 00:00:00".into())]);
    }
}
