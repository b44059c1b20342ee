//! Error types
//!
//! `FatalError` aborts a run. `Skip` describes a construct that was left
//! out; the interpreter logs it with the last known source line and moves
//! on to the next record.

use crate::trace::OperandError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FatalError {
    #[error("the prologue sent to the compiler does not appear in its output")]
    MissingPrologue,
    #[error("can't read trace {}: {source}", path.display())]
    Unreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum Skip {
    #[error("malformed operand for `{op}`: {source}")]
    Malformed {
        op: String,
        #[source]
        source: OperandError,
    },
    #[error("`{op}` is missing the record it expects to follow it")]
    Truncated { op: String },
    #[error("unknown picture `{0}`")]
    UnknownPicture(String),
    #[error("\"{name}\": {body}? This may be a syntax error in the source")]
    UnknownOperation { name: String, body: String },
    #[error("`{0}` belongs to an extension that is switched off")]
    ExtensionDisabled(String),
    #[error("`{op}` takes exactly {expected} argument(s) ({given} given)")]
    ArgumentCount {
        op: String,
        expected: usize,
        given: usize,
    },
    #[error("argument of `{0}` needs to be a string")]
    ExpectedString(String),
    #[error("ignoring complex picture expression")]
    ComplexPictureExpression,
    #[error("picture equation without a right-hand side")]
    EmptyPictureEquation,
    #[error("negated addto term without a picture")]
    NegatedAddtoTerm,
    #[error("cull keeping (0, 0) isn't allowed; ignoring this cull command")]
    CullKeepingZero,
    #[error("cull {mode} ({a}, {b}) is not supported")]
    UnsupportedCull { mode: String, a: i64, b: i64 },
    #[error("ligtable {0} is not supported, ignored")]
    UnsupportedLigtable(String),
    #[error("value `{value}` of PostScript private dictionary entry {key} is invalid")]
    InvalidPrivateEntry { key: String, value: String },
    #[error("glyph without code, unicode value and name")]
    AnonymousGlyph,
}

impl Skip {
    pub fn malformed(op: impl Into<String>, source: OperandError) -> Self {
        Skip::Malformed {
            op: op.into(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_skip_messages_name_the_construct() {
        let skip = Skip::UnsupportedCull {
            mode: "dropping".to_string(),
            a: 2,
            b: 3,
        };
        assert_eq!(skip.to_string(), "cull dropping (2, 3) is not supported");
        assert_eq!(
            Skip::UnknownPicture("p".to_string()).to_string(),
            "unknown picture `p`"
        );
    }
}
