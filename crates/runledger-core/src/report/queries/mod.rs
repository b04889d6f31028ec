//! Aggregate queries behind each report section.
//!
//! Every query reads `test_results` as `tr` and appends the context predicate to its `WHERE`.
//! Parameters are bound in placeholder order; the top-N limit is always the last one.

pub mod exceptions;
pub mod failures;
pub mod runs;
pub mod timing;

use crate::errors::Result;
use crate::report::ReportContext;
use rusqlite::types::{FromSql, Value};
use rusqlite::{params_from_iter, Connection};
use std::collections::{BTreeSet, HashMap};
use std::hash::Hash;

pub(crate) const RUN_DATE_COLUMN: &str = "tr.run_date";

/// Distinct names per key from a query selecting `(key, name)` rows.
///
/// Names are gathered row by row, so any character in a name survives intact.
pub(crate) struct NamesByKey<K> {
    names: HashMap<K, BTreeSet<String>>,
}

impl<K: FromSql + Eq + Hash> NamesByKey<K> {
    pub(crate) fn query(conn: &Connection, sql: &str, params: Vec<Value>) -> Result<Self> {
        let mut stmt = conn.prepare(sql)?;
        let mut rows = stmt.query(params_from_iter(params))?;
        let mut names: HashMap<K, BTreeSet<String>> = HashMap::new();
        while let Some(row) = rows.next()? {
            names.entry(row.get(0)?).or_default().insert(row.get(1)?);
        }
        Ok(Self { names })
    }

    /// Sorted names for `key`; empty when the key had none.
    pub(crate) fn take(&mut self, key: &K) -> Vec<String> {
        self.names
            .remove(key)
            .map(|set| set.into_iter().collect())
            .unwrap_or_default()
    }
}

pub(crate) fn limit_param(ctx: &ReportContext<'_>) -> Value {
    Value::Integer(i64::try_from(ctx.settings.top_n).unwrap_or(i64::MAX))
}
