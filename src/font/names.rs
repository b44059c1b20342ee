//! Glyph names and encodings

use crate::trace::{parse_rounded, unquote, OperandError};
use serde::Serialize;
use std::collections::BTreeMap;

/// Names for U+0020..=U+007E
const ASCII_NAMES: &[&str] = &[
    "space", "exclam", "quotedbl", "numbersign", "dollar", "percent", "ampersand", "quotesingle",
    "parenleft", "parenright", "asterisk", "plus", "comma", "hyphen", "period", "slash",
    "zero", "one", "two", "three", "four", "five", "six", "seven",
    "eight", "nine", "colon", "semicolon", "less", "equal", "greater", "question",
    "at", "A", "B", "C", "D", "E", "F", "G",
    "H", "I", "J", "K", "L", "M", "N", "O",
    "P", "Q", "R", "S", "T", "U", "V", "W",
    "X", "Y", "Z", "bracketleft", "backslash", "bracketright", "asciicircum", "underscore",
    "grave", "a", "b", "c", "d", "e", "f", "g",
    "h", "i", "j", "k", "l", "m", "n", "o",
    "p", "q", "r", "s", "t", "u", "v", "w",
    "x", "y", "z", "braceleft", "bar", "braceright", "asciitilde",
];

/// Names for U+00A0..=U+00FF
const LATIN1_NAMES: &[&str] = &[
    "uni00A0", "exclamdown", "cent", "sterling", "currency", "yen", "brokenbar", "section",
    "dieresis", "copyright", "ordfeminine", "guillemotleft", "logicalnot", "uni00AD", "registered", "macron",
    "degree", "plusminus", "twosuperior", "threesuperior", "acute", "mu", "paragraph", "periodcentered",
    "cedilla", "onesuperior", "ordmasculine", "guillemotright", "onequarter", "onehalf", "threequarters", "questiondown",
    "Agrave", "Aacute", "Acircumflex", "Atilde", "Adieresis", "Aring", "AE", "Ccedilla",
    "Egrave", "Eacute", "Ecircumflex", "Edieresis", "Igrave", "Iacute", "Icircumflex", "Idieresis",
    "Eth", "Ntilde", "Ograve", "Oacute", "Ocircumflex", "Otilde", "Odieresis", "multiply",
    "Oslash", "Ugrave", "Uacute", "Ucircumflex", "Udieresis", "Yacute", "Thorn", "germandbls",
    "agrave", "aacute", "acircumflex", "atilde", "adieresis", "aring", "ae", "ccedilla",
    "egrave", "eacute", "ecircumflex", "edieresis", "igrave", "iacute", "icircumflex", "idieresis",
    "eth", "ntilde", "ograve", "oacute", "ocircumflex", "otilde", "odieresis", "divide",
    "oslash", "ugrave", "uacute", "ucircumflex", "udieresis", "yacute", "thorn", "ydieresis",
];

/// Frequent names outside Latin-1
const EXTRA_NAMES: &[(u32, &str)] = &[
    (0x0131, "dotlessi"),
    (0x0141, "Lslash"),
    (0x0142, "lslash"),
    (0x0152, "OE"),
    (0x0153, "oe"),
    (0x0160, "Scaron"),
    (0x0161, "scaron"),
    (0x0178, "Ydieresis"),
    (0x017D, "Zcaron"),
    (0x017E, "zcaron"),
    (0x0192, "florin"),
    (0x02C6, "circumflex"),
    (0x02C7, "caron"),
    (0x02D8, "breve"),
    (0x02D9, "dotaccent"),
    (0x02DA, "ring"),
    (0x02DB, "ogonek"),
    (0x02DC, "tilde"),
    (0x02DD, "hungarumlaut"),
    (0x2013, "endash"),
    (0x2014, "emdash"),
    (0x2018, "quoteleft"),
    (0x2019, "quoteright"),
    (0x201A, "quotesinglbase"),
    (0x201C, "quotedblleft"),
    (0x201D, "quotedblright"),
    (0x201E, "quotedblbase"),
    (0x2020, "dagger"),
    (0x2021, "daggerdbl"),
    (0x2022, "bullet"),
    (0x2026, "ellipsis"),
    (0x2030, "perthousand"),
    (0x2039, "guilsinglleft"),
    (0x203A, "guilsinglright"),
    (0x2122, "trademark"),
    (0x2212, "minus"),
    (0xFB00, "ff"),
    (0xFB01, "fi"),
    (0xFB02, "fl"),
    (0xFB03, "ffi"),
    (0xFB04, "ffl"),
];

/// Production glyph name for a Unicode scalar value
pub fn name_from_unicode(unicode: u32) -> String {
    let named = match unicode {
        0x20..=0x7E => ASCII_NAMES.get((unicode - 0x20) as usize).copied(),
        0xA0..=0xFF => LATIN1_NAMES.get((unicode - 0xA0) as usize).copied(),
        _ => EXTRA_NAMES
            .iter()
            .find(|(u, _)| *u == unicode)
            .map(|(_, name)| *name),
    };
    match named {
        Some(name) => name.to_string(),
        None if unicode <= 0xFFFF => format!("uni{unicode:04X}"),
        None => format!("u{unicode:05X}"),
    }
}

/// Unicode value of a production glyph name, if it has one
pub fn unicode_from_name(name: &str) -> Option<u32> {
    if let Some(i) = ASCII_NAMES.iter().position(|n| *n == name) {
        return Some(0x20 + i as u32);
    }
    if let Some(i) = LATIN1_NAMES.iter().position(|n| *n == name) {
        return Some(0xA0 + i as u32);
    }
    if let Some((u, _)) = EXTRA_NAMES.iter().find(|(_, n)| *n == name) {
        return Some(*u);
    }
    let hex = name
        .strip_prefix("uni")
        .filter(|h| h.len() == 4)
        .or_else(|| name.strip_prefix('u').filter(|h| (4..=6).contains(&h.len())))?;
    u32::from_str_radix(hex, 16).ok().filter(|u| char::from_u32(*u).is_some())
}

/// A character operand: a code as the compiler sees it, or a string
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub enum CharRef {
    Code(i64),
    Text(String),
}

impl CharRef {
    /// Quoted operands are strings, everything else a rounded number
    pub fn parse(text: &str) -> Result<Self, OperandError> {
        match unquote(text) {
            Some(s) => Ok(CharRef::Text(s.to_string())),
            None => parse_rounded(text).map(CharRef::Code),
        }
    }

    /// The code the compiler would use: numbers as they are, strings by
    /// their first character
    pub fn code(&self) -> Option<i64> {
        match self {
            CharRef::Code(code) => Some(*code),
            CharRef::Text(s) => s.chars().next().map(|c| c as i64),
        }
    }

    /// Whether this is the numeric zero that marks an absent extensible piece
    pub fn is_zero(&self) -> bool {
        matches!(self, CharRef::Code(0))
    }
}

impl std::fmt::Display for CharRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CharRef::Code(code) => write!(f, "{code}"),
            CharRef::Text(s) => write!(f, "\"{s}\""),
        }
    }
}

/// Mapping from character codes to glyph names
#[derive(Debug, Clone, Default, PartialEq)]
pub enum Encoding {
    /// Codes are Unicode scalar values
    #[default]
    Unicode,
    /// A fixed table, e.g. one of the TeX font encodings
    Table {
        name: String,
        slots: BTreeMap<i64, (String, Option<u32>)>,
    },
}

impl Encoding {
    /// Name and Unicode value of the glyph at `code`
    pub fn slot(&self, code: i64) -> (String, Option<u32>) {
        match self {
            Encoding::Unicode => match u32::try_from(code).ok().filter(|u| char::from_u32(*u).is_some()) {
                Some(unicode) => (name_from_unicode(unicode), Some(unicode)),
                None => (format!("NameMe.{code}"), None),
            },
            Encoding::Table { slots, .. } => slots
                .get(&code)
                .cloned()
                .unwrap_or_else(|| (format!("NameMe.{code}"), None)),
        }
    }
}

/// Normalized encoding name used to pick encoding-specific behavior,
/// e.g. `TeX math italic` becomes `tex-math-italic`
pub fn normalize_encoding_name(name: &str) -> String {
    name.to_lowercase().replace(' ', "-")
}
