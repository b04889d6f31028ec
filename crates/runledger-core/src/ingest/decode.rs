//! Decodes a chunk's YAML block into typed results.
//!
//! Block shape, one entry per test:
//!
//! ```yaml
//! test_login:
//!   status: FAIL
//!   elapsed: 1.25
//!   exception:
//!     TimeoutError:
//!       - "at login.rb:12"
//!       - "at runner.rb:40"
//! ```
//!
//! Field names written as Ruby symbols (`:status`) are accepted, as is an outer key naming the
//! chunk's test group.

use crate::errors::{LedgerError, Result};
use crate::model::{DecodedResult, TestStatus, TRACE_LINE_SEPARATOR};
use serde::Deserialize;
use serde_yaml::{Mapping, Value};

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawRecord {
    #[serde(alias = ":status")]
    status: String,
    #[serde(alias = "elapsed_time", alias = ":elapsed", alias = ":elapsed_time")]
    elapsed: f64,
    #[serde(default, alias = ":exception")]
    exception: Option<Mapping>,
    #[serde(default, alias = ":description")]
    description: Option<String>,
}

pub fn decode_block(block: &str, test_group: &str) -> Result<Vec<DecodedResult>> {
    let doc: Value = serde_yaml::from_str(block).map_err(|e| LedgerError::block_decode(block, e))?;
    let Value::Mapping(top) = doc else {
        return Err(LedgerError::block_decode(
            block,
            serde::de::Error::custom("top level of a result block must be a mapping"),
        ));
    };
    let entries = unwrap_group(top, test_group);

    let mut out = Vec::with_capacity(entries.len());
    for (key, value) in entries {
        let Some(test_name) = scalar_to_string(&key) else {
            return Err(LedgerError::block_decode(
                block,
                serde::de::Error::custom(format!("test name must be a scalar, got {:?}", key)),
            ));
        };
        let record = decode_record(&test_name, value)
            .map_err(|detail| LedgerError::invalid_record(block, &test_name, detail))?;
        out.push(record);
    }
    Ok(out)
}

/// `{Group: {test: {...}}}` → `{test: {...}}` when the sole key is the chunk's group name.
fn unwrap_group(top: Mapping, test_group: &str) -> Mapping {
    if top.len() != 1 {
        return top;
    }
    let nested = match top.iter().next() {
        Some((Value::String(k), Value::Mapping(inner)))
            if k == test_group && inner.values().all(Value::is_mapping) =>
        {
            Some(inner.clone())
        }
        _ => None,
    };
    nested.unwrap_or(top)
}

/// Validation failures come back as a bare detail message; the caller attaches test and block.
fn decode_record(test_name: &str, value: Value) -> std::result::Result<DecodedResult, String> {
    let raw: RawRecord = serde_yaml::from_value(value).map_err(|e| e.to_string())?;

    let status = TestStatus::parse(raw.status.trim())
        .ok_or_else(|| format!("unknown status '{}'", raw.status))?;
    if !raw.elapsed.is_finite() || raw.elapsed < 0.0 {
        return Err(format!(
            "elapsed must be a non-negative number, got {}",
            raw.elapsed
        ));
    }

    let (exception_name, exception_trace) = match raw.exception {
        Some(exc) => decode_exception(exc)?,
        None => (None, None),
    };

    Ok(DecodedResult {
        test_name: test_name.to_string(),
        status,
        elapsed_time: raw.elapsed,
        exception_name,
        exception_trace,
        description: raw.description,
    })
}

fn decode_exception(
    exc: Mapping,
) -> std::result::Result<(Option<String>, Option<String>), String> {
    if exc.len() > 1 {
        return Err(format!(
            "exception must have a single entry, found {}",
            exc.len()
        ));
    }
    let Some((name, trace)) = exc.into_iter().next() else {
        return Ok((None, None));
    };
    let name = scalar_to_string(&name).ok_or("exception name must be a scalar")?;

    let lines = match trace {
        Value::Null => Vec::new(),
        Value::Sequence(items) => items
            .iter()
            .map(|item| scalar_to_string(item).ok_or("trace lines must be scalars"))
            .collect::<std::result::Result<Vec<_>, _>>()?,
        _ => return Err(format!("trace for exception '{}' must be a sequence", name)),
    };

    let trace = (!lines.is_empty()).then(|| lines.join(TRACE_LINE_SEPARATOR));
    Ok((Some(name), trace))
}

fn scalar_to_string(v: &Value) -> Option<String> {
    match v {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_minimal_records_in_block_order() {
        let block = "foo:\n  status: PASS\n  elapsed: 1.5\nbar:\n  status: FAIL\n  elapsed_time: 2\n";
        let results = decode_block(block, "Core").unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].test_name, "foo");
        assert_eq!(results[0].status, TestStatus::Pass);
        assert_eq!(results[0].elapsed_time, 1.5);
        assert_eq!(results[0].exception_name, None);
        assert_eq!(results[1].test_name, "bar");
        assert_eq!(results[1].status, TestStatus::Fail);
        assert_eq!(results[1].elapsed_time, 2.0);
    }

    #[test]
    fn joins_trace_lines_with_literal_backslash_n() {
        let block = r#"
t:
  status: FAIL
  elapsed: 0.1
  exception:
    RuntimeError:
      - "boom"
      - "at a.rb:1"
"#;
        let r = &decode_block(block, "G").unwrap()[0];
        assert_eq!(r.exception_name.as_deref(), Some("RuntimeError"));
        assert_eq!(r.exception_trace.as_deref(), Some("boom\\nat a.rb:1"));
        assert!(!r.exception_trace.as_ref().unwrap().contains('\n'));
    }

    #[test]
    fn accepts_ruby_symbol_keys_and_group_nesting() {
        let block = "Core:\n  t:\n    :status: SKIPPED\n    :elapsed: 0\n    :description: does things\n";
        let r = &decode_block(block, "Core").unwrap()[0];
        assert_eq!(r.test_name, "t");
        assert_eq!(r.status, TestStatus::Skipped);
        assert_eq!(r.description.as_deref(), Some("does things"));
    }

    #[test]
    fn empty_exception_mapping_means_no_exception() {
        let r = &decode_block("t:\n  status: PASS\n  elapsed: 1\n  exception: {}\n", "G").unwrap()[0];
        assert_eq!(r.exception_name, None);
        assert_eq!(r.exception_trace, None);
    }

    #[test]
    fn invalid_yaml_carries_the_block() {
        let block = "t:\n  status: [unclosed\n";
        let err = decode_block(block, "G").unwrap_err();
        match &err {
            LedgerError::BlockDecode { block: b, .. } => assert_eq!(b, block),
            other => panic!("expected BlockDecode, got {other:?}"),
        }
        assert!(err.to_string().contains("status: [unclosed"));
    }

    #[test]
    fn scalar_block_is_a_decode_error() {
        let err = decode_block("just some text\n", "G").unwrap_err();
        assert!(matches!(err, LedgerError::BlockDecode { .. }));
    }

    #[test]
    fn rejects_unknown_status_missing_fields_and_extra_fields() {
        let cases = [
            "t:\n  status: BROKEN\n  elapsed: 1\n",
            "t:\n  status: PASS\n",
            "t:\n  elapsed: 1\n",
            "t:\n  status: PASS\n  elapsed: 1\n  owner: qa\n",
            "t:\n  status: PASS\n  elapsed: -1\n",
            "t:\n  status: FAIL\n  elapsed: 1\n  exception:\n    A: [x]\n    B: [y]\n",
        ];
        for block in cases {
            let err = decode_block(block, "G").unwrap_err();
            assert!(
                matches!(err, LedgerError::InvalidRecord { ref test, .. } if test == "t"),
                "expected InvalidRecord for {block:?}, got {err:?}"
            );
        }
    }

    #[test]
    fn invalid_record_carries_the_block() {
        let block = "ok:\n  status: PASS\n  elapsed: 1\nt:\n  status: BROKEN\n  elapsed: 1\n";
        let err = decode_block(block, "G").unwrap_err();
        match &err {
            LedgerError::InvalidRecord { test, block: b, .. } => {
                assert_eq!(test, "t");
                assert_eq!(b, block);
            }
            other => panic!("expected InvalidRecord, got {other:?}"),
        }
        let msg = err.to_string();
        assert!(msg.contains("unknown status 'BROKEN'"));
        assert!(msg.contains("status: BROKEN"));
    }
}
