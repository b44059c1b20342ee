//! Trace tokenizer
//!
//! The instrumented compiler wraps every relevant operation in a pair of
//! markers: `@mf2vec@<op>>> <operand>>> <operand>@mf2vec@`. Tokenizing
//! strips error reports, joins wrapped lines, anchors on the prologue that
//! was sent to the compiler and cuts the rest into [`TraceRecord`]s.

pub mod op;
pub mod operand;

pub use op::{AnchorKind, Corner, Extension, FontCommand, GlyphCommand, HintKind, LigatureOp, Op, OutlineCommand, TransformKind};
pub use operand::{parse_number, parse_pair, parse_path, parse_rounded, parse_string, parse_truncated, unquote, OperandError};

use crate::core::errors::FatalError;
use regex::Regex;
use serde::Serialize;
use std::path::Path;
use std::sync::LazyLock;

/// Marker wrapped around every instrumented record in the log
pub const MARKER: &str = "@mf2vec@";

static ERROR_REPORT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^! (?s:.*?)^l\.(?s:.*?)\n\n").expect("error pattern is valid")
});

static RECORD: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r"(?s){m}([A-Za-z_:=|]+)(?:>> (?:(?:Path|Pen polygon) at line (\d+):)?(.*?))?{m}",
        m = regex::escape(MARKER)
    ))
    .expect("record pattern is valid")
});

static FIELD_SEPARATOR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r">> (?:(?:Path|Pen polygon) at line \d+:)?").expect("split pattern is valid")
});

/// One instrumented operation
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TraceRecord {
    /// Operation name as it appeared in the log
    pub name: String,
    #[serde(skip)]
    pub op: Op,
    /// Source line, when the compiler printed one for a path operand
    pub line: Option<u32>,
    pub body: String,
}

impl TraceRecord {
    pub fn new(name: &str, line: Option<u32>, body: &str) -> Self {
        Self {
            name: name.to_string(),
            op: Op::from_name(name),
            line,
            body: body.to_string(),
        }
    }

    /// The body split at every `>> ` separator
    pub fn fields(&self) -> Vec<&str> {
        FIELD_SEPARATOR.split(&self.body).collect()
    }

    pub fn first_field(&self) -> &str {
        FIELD_SEPARATOR.split(&self.body).next().unwrap_or("")
    }

    pub fn last_field(&self) -> &str {
        FIELD_SEPARATOR.split(&self.body).last().unwrap_or("")
    }

    /// Fields of a body that must have exactly `expected` of them
    pub fn exact_fields(&self, expected: usize) -> Result<Vec<&str>, OperandError> {
        let fields = self.fields();
        if fields.len() == expected {
            Ok(fields)
        } else {
            Err(OperandError::FieldCount {
                expected,
                found: fields.len(),
            })
        }
    }
}

/// Split the text of a compiler log into records.
///
/// Only output after the first occurrence of `prologue` is considered.
pub fn tokenize(log: &str, prologue: &str) -> Result<Vec<TraceRecord>, FatalError> {
    let stripped = ERROR_REPORT.replace_all(log, "");
    let joined: String = stripped.chars().filter(|&c| c != '\n' && c != '\r').collect();
    let (_, after) = joined
        .split_once(prologue)
        .ok_or(FatalError::MissingPrologue)?;

    let records = RECORD
        .captures_iter(after)
        .map(|caps| {
            let name = caps.get(1).map_or("", |m| m.as_str());
            let line = caps.get(2).and_then(|m| m.as_str().parse().ok());
            let body = caps.get(3).map_or("", |m| m.as_str());
            TraceRecord::new(name, line, body)
        })
        .collect::<Vec<_>>();
    tracing::debug!(count = records.len(), "tokenized trace");
    Ok(records)
}

/// Read a log file and tokenize it
pub fn read_trace(path: &Path, prologue: &str) -> Result<Vec<TraceRecord>, FatalError> {
    let log = std::fs::read_to_string(path).map_err(|source| FatalError::Unreadable {
        path: path.to_path_buf(),
        source,
    })?;
    tokenize(&log, prologue)
}

/// Remove the echoed prologue and every marker span from a raw log, leaving
/// only what the compiler printed on its own.
pub fn clean_log(log: &str, prologue: &str) -> String {
    let spaced = |text: &str| {
        text.chars()
            .map(|c| regex::escape(&c.to_string()))
            .collect::<Vec<_>>()
            .join("\n?")
    };
    let pattern = format!(
        r"(?s){prologue}\n|\n{marker}.*?\n{marker}",
        prologue = spaced(prologue),
        marker = spaced(MARKER)
    );
    match Regex::new(&pattern) {
        Ok(re) => re.replace_all(log, "").into_owned(),
        Err(err) => {
            tracing::warn!(%err, "can't build log cleaning pattern, leaving log unchanged");
            log.to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PROLOGUE: &str = "\\mode:=mf2vec;input font";

    fn log(body: &str) -> String {
        format!("This is METAFONT\n**{PROLOGUE}\n{body}\n")
    }

    #[test]
    fn test_missing_prologue_is_fatal() {
        let err = tokenize("no anchor here", PROLOGUE).unwrap_err();
        assert!(matches!(err, FatalError::MissingPrologue));
    }

    #[test]
    fn test_records_are_split_and_lines_joined() {
        let text = log(
            "@mf2vec@picture\n>> \"a\"\n>> \"b\"\n@mf2vec@\n\
             @mf2vec@contour\n>> Path at line 12:\n(0,0)..controls (1,1) and (2,2) ..cycle\n@mf2vec@",
        );
        let records = tokenize(&text, PROLOGUE).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].op, Op::Picture);
        assert_eq!(records[0].fields(), vec!["\"a\"", "\"b\""]);
        assert_eq!(records[1].op, Op::Contour);
        assert_eq!(records[1].line, Some(12));
        assert_eq!(records[1].body, "(0,0)..controls (1,1) and (2,2) ..cycle");
    }

    #[test]
    fn test_record_without_body() {
        let records = tokenize(&log("@mf2vec@addto@mf2vec@@mf2vec@pp:@mf2vec@"), PROLOGUE).unwrap();
        let names: Vec<&str> = records.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["addto", "pp:"]);
        assert_eq!(records[0].body, "");
    }

    #[test]
    fn test_error_reports_are_dropped() {
        let text = log(
            "! Undefined control sequence.\n<to be read again>\n@mf2vec@kern>> 3@mf2vec@\nl.7 foo\n\n\
             @mf2vec@end>> 10@mf2vec@",
        );
        let records = tokenize(&text, PROLOGUE).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].op, Op::End);
    }

    #[test]
    fn test_clean_log_removes_prologue_and_markers() {
        let raw = format!("head\n{PROLOGUE}\nkeep\n@mf2vec@addto\n>> \"x\"\n@mf2vec@\ntail");
        assert_eq!(clean_log(&raw, PROLOGUE), "head\nkeep\ntail");
    }
}
