//! Operand parsing
//!
//! Record bodies carry numbers, pairs, strings and paths exactly as the
//! compiler's `show` command prints them.

use crate::geometry::{PathJoin, PathSpec};
use kurbo::Point;
use regex::Regex;
use std::sync::LazyLock;
use thiserror::Error;

static PAIR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\((.*?),(.*?)\)").expect("pair pattern is valid")
});

static JOIN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"\.\.controls \((.*?),(.*?)\) and \((.*?),(.*?)\) \.\.(?:\((.*?),(.*?)\)|(cycle))",
    )
    .expect("join pattern is valid")
});

#[derive(Debug, Clone, PartialEq, Error)]
pub enum OperandError {
    #[error("expected a number, found `{0}`")]
    Number(String),
    #[error("expected a pair `(x,y)`, found `{0}`")]
    Pair(String),
    #[error("expected a path, found `{0}`")]
    Path(String),
    #[error("expected a string, found `{0}`")]
    String(String),
    #[error("expected {expected} fields, found {found}")]
    FieldCount { expected: usize, found: usize },
}

/// A finite number. The compiler never prints `inf` or `NaN`.
pub fn parse_number(text: &str) -> Result<f64, OperandError> {
    text.trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| OperandError::Number(text.to_string()))
}

/// A number rounded to the nearest integer
pub fn parse_rounded(text: &str) -> Result<i64, OperandError> {
    parse_number(text).map(|v| v.round() as i64)
}

/// A number truncated toward zero
pub fn parse_truncated(text: &str) -> Result<i64, OperandError> {
    parse_number(text).map(|v| v.trunc() as i64)
}

/// The first `(x,y)` pair in `text`
pub fn parse_pair(text: &str) -> Result<Point, OperandError> {
    let caps = PAIR
        .captures(text)
        .ok_or_else(|| OperandError::Pair(text.to_string()))?;
    let x = parse_number(&caps[1]).map_err(|_| OperandError::Pair(text.to_string()))?;
    let y = parse_number(&caps[2]).map_err(|_| OperandError::Pair(text.to_string()))?;
    Ok(Point::new(x, y))
}

/// Parse a path printed as `(x,y)..controls (a,b) and (c,d) ..(x,y)...`
pub fn parse_path(text: &str) -> Result<PathSpec, OperandError> {
    let malformed = || OperandError::Path(text.to_string());
    let first = PAIR.captures(text).ok_or_else(malformed)?;
    let whole = first.get(0).ok_or_else(malformed)?;
    let start = Point::new(
        parse_number(&first[1]).map_err(|_| malformed())?,
        parse_number(&first[2]).map_err(|_| malformed())?,
    );

    let number = |s: &str| parse_number(s).map_err(|_| malformed());
    let mut joins = Vec::new();
    for caps in JOIN.captures_iter(&text[whole.end()..]) {
        let c1 = Point::new(number(&caps[1])?, number(&caps[2])?);
        let c2 = Point::new(number(&caps[3])?, number(&caps[4])?);
        let end = match (caps.get(5), caps.get(6)) {
            (Some(x), Some(y)) => Some(Point::new(number(x.as_str())?, number(y.as_str())?)),
            _ => None,
        };
        joins.push(PathJoin { c1, c2, end });
        if end.is_none() {
            break;
        }
    }
    Ok(PathSpec { start, joins })
}

/// The contents of a double-quoted string, or `None` if `text` isn't one
pub fn unquote(text: &str) -> Option<&str> {
    let text = text.trim();
    if text.len() >= 2 && text.starts_with('"') && text.ends_with('"') {
        Some(&text[1..text.len() - 1])
    } else {
        None
    }
}

/// Like [`unquote`] but reports a string error for unquoted text
pub fn parse_string(text: &str) -> Result<&str, OperandError> {
    unquote(text).ok_or_else(|| OperandError::String(text.to_string()))
}
