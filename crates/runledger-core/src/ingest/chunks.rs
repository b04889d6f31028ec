//! Splits a raw log file into header-delimited chunks.
//!
//! A header is `Suite - Group` (two bareword tokens). Everything after a header up to the next
//! header is that chunk's block. Separator and blank lines are dropped before they reach a block.

use crate::model::Chunk;
use lazy_static::lazy_static;
use regex::Regex;
use tracing::debug;

lazy_static! {
    static ref SEPARATOR: Regex = Regex::new(r"^(?:=+|---|--- \{\}|%.*%)$").unwrap();
    static ref HEADER: Regex = Regex::new(r"^(\w+) - (\w+)$").unwrap();
}

enum LineDisposition<'a> {
    Discard,
    Header { suite: &'a str, test_group: &'a str },
    Content,
}

struct Current {
    suite: String,
    test_group: String,
}

#[derive(Debug, Clone, Default)]
pub struct ChunkParser {
    ignore: Vec<Regex>,
}

impl ChunkParser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Lines matching any of `patterns` are dropped like separator lines.
    pub fn with_ignore_patterns(patterns: Vec<Regex>) -> Self {
        Self { ignore: patterns }
    }

    fn classify<'a>(&self, line: &'a str) -> LineDisposition<'a> {
        let trimmed = line.trim_end();
        if trimmed.trim_start().is_empty() || SEPARATOR.is_match(trimmed) {
            return LineDisposition::Discard;
        }
        if self.ignore.iter().any(|re| re.is_match(trimmed)) {
            debug!("ignoring noise line: {}", trimmed);
            return LineDisposition::Discard;
        }
        if let Some(caps) = HEADER.captures(trimmed) {
            let (Some(suite), Some(test_group)) = (caps.get(1), caps.get(2)) else {
                return LineDisposition::Content;
            };
            return LineDisposition::Header {
                suite: suite.as_str(),
                test_group: test_group.as_str(),
            };
        }
        LineDisposition::Content
    }

    pub fn parse(&self, text: &str) -> Vec<Chunk> {
        let mut chunks = Vec::new();
        let mut current: Option<Current> = None;
        let mut block = String::new();

        for raw in text.lines() {
            let line = raw.strip_suffix('\r').unwrap_or(raw);
            match self.classify(line) {
                LineDisposition::Discard => {}
                LineDisposition::Content => {
                    block.push_str(line);
                    block.push('\n');
                }
                LineDisposition::Header { suite, test_group } => {
                    flush(&mut chunks, current.as_ref(), &mut block);
                    current = Some(Current {
                        suite: suite.to_string(),
                        test_group: test_group.to_string(),
                    });
                }
            }
        }
        flush(&mut chunks, current.as_ref(), &mut block);
        chunks
    }
}

fn flush(chunks: &mut Vec<Chunk>, current: Option<&Current>, block: &mut String) {
    if block.is_empty() {
        return;
    }
    match current {
        Some(cur) => chunks.push(Chunk {
            suite: cur.suite.clone(),
            test_group: cur.test_group.clone(),
            block: std::mem::take(block),
        }),
        None => {
            debug!(
                "dropping {} preamble line(s) before the first header",
                block.lines().count()
            );
            block.clear();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TWO_CHUNKS: &str = "Alpha - Core
foo:
  status: PASS
  elapsed: 1.5
===
Alpha - Extra
bar:
  status: FAIL
  elapsed: 0.2
";

    #[test]
    fn header_starts_new_chunk_and_separator_is_dropped() {
        let chunks = ChunkParser::new().parse(TWO_CHUNKS);
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].suite, "Alpha");
        assert_eq!(chunks[0].test_group, "Core");
        assert_eq!(chunks[0].block, "foo:\n  status: PASS\n  elapsed: 1.5\n");
        assert_eq!(chunks[1].suite, "Alpha");
        assert_eq!(chunks[1].test_group, "Extra");
        assert_eq!(chunks[1].block, "bar:\n  status: FAIL\n  elapsed: 0.2\n");
    }

    #[test]
    fn all_separator_forms_are_discarded() {
        let text = "S - G\n---\n--- {}\n=======================\n%% mail footer %%\n\na: 1\n";
        let chunks = ChunkParser::new().parse(text);
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].block, "a: 1\n");
    }

    #[test]
    fn preamble_without_header_emits_nothing() {
        let chunks = ChunkParser::new().parse("stray: 1\nother: 2\n");
        assert!(chunks.is_empty());
    }

    #[test]
    fn preamble_is_not_attached_to_first_chunk() {
        let chunks = ChunkParser::new().parse("Mailed by robot\nS - G\nx: 1\n");
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].block, "x: 1\n");
    }

    #[test]
    fn header_with_empty_block_is_skipped() {
        let chunks = ChunkParser::new().parse("A - One\n===\nA - Two\nt: 1\n");
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].test_group, "Two");
    }

    #[test]
    fn header_requires_exactly_two_barewords() {
        let text = "S - G\nnot a - header line: 1\nx - y - z\n";
        let chunks = ChunkParser::new().parse(text);
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].block, "not a - header line: 1\nx - y - z\n");
    }

    #[test]
    fn crlf_line_endings_are_tolerated() {
        let chunks = ChunkParser::new().parse("S - G\r\nt:\r\n  status: PASS\r\n");
        assert_eq!(chunks[0].suite, "S");
        assert_eq!(chunks[0].block, "t:\n  status: PASS\n");
    }

    #[test]
    fn extra_ignore_patterns_drop_noise() {
        let parser = ChunkParser::with_ignore_patterns(vec![Regex::new("^TOTAL ").unwrap()]);
        let chunks = parser.parse("S - G\nTOTAL 12 tests\nt: 1\n");
        assert_eq!(chunks[0].block, "t: 1\n");
    }
}
