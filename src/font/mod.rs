//! Font model
//!
//! What the interpreter builds: glyphs with outlines and metrics, font-wide
//! info, and the OpenType lookups derived from the ligature and kerning
//! tables. The model is plain data; serialization to a font format is done
//! elsewhere (see `data::conversions` for the UFO export).

pub mod features;
pub mod kerning;
pub mod math;
pub mod names;

pub use features::{subtable_name, Lookup, LookupKind, LookupSpec, Lookups, Rule, ScriptLanguages, Subtable};
pub use kerning::KerningClassTable;
pub use names::{name_from_unicode, unicode_from_name, CharRef, Encoding};

use crate::geometry::Outline;
use serde::Serialize;
use std::collections::BTreeMap;

/// Post-processing a font editor is asked to do on a glyph or the whole font
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PostProcess {
    pub add_extrema: bool,
    pub add_inflections: bool,
    pub round: bool,
    pub auto_hint: bool,
    pub auto_instruct: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Anchor {
    pub class: String,
    /// `base`, `mark` or `basemark`
    pub point_type: String,
    pub x: f64,
    pub y: f64,
}

/// A component reference, transform as `[xx, xy, yx, yy, tx, ty]`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Reference {
    pub glyph: String,
    pub transform: [f64; 6],
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DiagonalHint {
    pub start: (f64, f64),
    pub end: (f64, f64),
    /// Unit vector
    pub direction: (f64, f64),
}

/// Stem hints, horizontal and vertical ones as `(position, width)`
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Hints {
    pub horizontal: Vec<(f64, f64)>,
    pub vertical: Vec<(f64, f64)>,
    pub diagonal: Vec<DiagonalHint>,
}

impl Hints {
    pub fn is_empty(&self) -> bool {
        self.horizontal.is_empty() && self.vertical.is_empty() && self.diagonal.is_empty()
    }
}

/// MATH table kerning, `(height, kern)` per corner
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MathKerning {
    pub top_right: Vec<(i64, i64)>,
    pub top_left: Vec<(i64, i64)>,
    pub bottom_right: Vec<(i64, i64)>,
    pub bottom_left: Vec<(i64, i64)>,
}

/// One piece of an extensible glyph assembly
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VerticalComponent {
    pub glyph: String,
    pub extender: bool,
    pub start_connector: i64,
    pub end_connector: i64,
    pub full_advance: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Glyph {
    pub name: String,
    /// Code in the input encoding, if the glyph is encoded
    pub code: Option<i64>,
    pub unicode: Option<u32>,
    pub outline: Outline,
    pub width: i64,
    pub height: i64,
    pub depth: i64,
    pub italic_correction: i64,
    pub top_accent: Option<i64>,
    pub anchors: Vec<Anchor>,
    pub references: Vec<Reference>,
    pub hints: Hints,
    pub math_kerning: MathKerning,
    pub vertical_variants: Vec<String>,
    pub vertical_components: Vec<VerticalComponent>,
    pub ligature_carets: Vec<i64>,
    pub comment: Option<String>,
    /// Compose from references when the serializer supports it
    pub build: bool,
    pub post_process: PostProcess,
}

impl Glyph {
    pub fn new(name: &str, code: Option<i64>, unicode: Option<u32>) -> Self {
        Self {
            name: name.to_string(),
            code,
            unicode,
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FontInfo {
    pub font_name: String,
    pub family_name: String,
    pub full_name: String,
    pub weight: String,
    pub version: String,
    pub copyright: String,
    pub comment: String,
    pub fontlog: String,
    pub ascent: i64,
    pub descent: i64,
    pub cap_height: Option<i64>,
    pub x_height: Option<i64>,
    pub underline_position: Option<i64>,
    pub underline_width: Option<i64>,
    pub italic_angle: f64,
    pub design_size: Option<f64>,
    pub units_per_em: Option<u32>,
    pub math_constants: BTreeMap<String, i64>,
    /// Validated PostScript private dictionary entries, values as text
    pub private_dict: BTreeMap<String, String>,
    pub post_process: PostProcess,
}

impl Default for FontInfo {
    fn default() -> Self {
        Self {
            font_name: "Untitled".to_string(),
            family_name: "Untitled".to_string(),
            full_name: "Untitled".to_string(),
            weight: "Regular".to_string(),
            version: "001.000".to_string(),
            copyright: String::new(),
            comment: String::new(),
            fontlog: String::new(),
            ascent: 0,
            descent: 0,
            cap_height: None,
            x_height: None,
            underline_position: None,
            underline_width: None,
            italic_angle: 0.0,
            design_size: None,
            units_per_em: None,
            math_constants: BTreeMap::new(),
            private_dict: BTreeMap::new(),
            post_process: PostProcess::default(),
        }
    }
}

impl FontInfo {
    /// Flat key-value view for serializers
    pub fn metadata(&self) -> BTreeMap<String, String> {
        let mut map = BTreeMap::new();
        map.insert("font_name".to_string(), self.font_name.clone());
        map.insert("family_name".to_string(), self.family_name.clone());
        map.insert("full_name".to_string(), self.full_name.clone());
        map.insert("weight".to_string(), self.weight.clone());
        map.insert("version".to_string(), self.version.clone());
        map.insert("copyright".to_string(), self.copyright.clone());
        map.insert("comment".to_string(), self.comment.clone());
        map.insert("fontlog".to_string(), self.fontlog.clone());
        map.insert("ascent".to_string(), self.ascent.to_string());
        map.insert("descent".to_string(), self.descent.to_string());
        map.insert("italic_angle".to_string(), self.italic_angle.to_string());
        let optional = [
            ("cap_height", self.cap_height),
            ("x_height", self.x_height),
            ("underline_position", self.underline_position),
            ("underline_width", self.underline_width),
        ];
        for (key, value) in optional {
            if let Some(value) = value {
                map.insert(key.to_string(), value.to_string());
            }
        }
        if let Some(size) = self.design_size {
            map.insert("design_size".to_string(), size.to_string());
        }
        if let Some(upm) = self.units_per_em {
            map.insert("units_per_em".to_string(), upm.to_string());
        }
        for (name, value) in &self.math_constants {
            map.insert(format!("math.{name}"), value.to_string());
        }
        for (key, value) in &self.private_dict {
            map.insert(format!("private.{key}"), value.clone());
        }
        map
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FontModel {
    pub info: FontInfo,
    pub glyphs: Vec<Glyph>,
    pub lookups: Lookups,
    #[serde(skip)]
    pub encoding: Encoding,
}

impl FontModel {
    pub fn new(encoding: Encoding) -> Self {
        Self {
            encoding,
            ..Default::default()
        }
    }

    pub fn glyph(&self, name: &str) -> Option<&Glyph> {
        self.glyphs.iter().find(|g| g.name == name)
    }

    pub fn glyph_mut(&mut self, name: &str) -> Option<&mut Glyph> {
        self.glyphs.iter_mut().find(|g| g.name == name)
    }

    pub fn glyph_by_code(&self, code: i64) -> Option<&Glyph> {
        self.glyphs.iter().find(|g| g.code == Some(code))
    }

    /// Insert a glyph, replacing any glyph of the same name
    pub fn upsert_glyph(&mut self, glyph: Glyph) -> &mut Glyph {
        let index = match self.glyphs.iter().position(|g| g.name == glyph.name) {
            Some(index) => {
                self.glyphs[index] = glyph;
                index
            }
            None => {
                self.glyphs.push(glyph);
                self.glyphs.len() - 1
            }
        };
        &mut self.glyphs[index]
    }

    /// Name of the glyph at `code`: an existing glyph, else the encoding's
    /// name for the slot
    pub fn name_for_code(&self, code: i64) -> String {
        match self.glyph_by_code(code) {
            Some(glyph) => glyph.name.clone(),
            None => self.encoding.slot(code).0,
        }
    }

    /// Glyph name a ligtable or charlist operand refers to.
    ///
    /// Without `generalized`, strings stand for the code of their first
    /// character, as the compiler sees them. With it, strings may also be
    /// `U+XXXX`, `0xXXXX`, four or five hex digits, or glyph names.
    pub fn resolve_name(&self, char_ref: &CharRef, generalized: bool) -> String {
        let text = match char_ref {
            CharRef::Code(code) => return self.name_for_code(*code),
            CharRef::Text(text) => text,
        };
        if !generalized {
            return match char_ref.code() {
                Some(code) => self.name_for_code(code),
                None => "NameMe.".to_string(),
            };
        }

        if let Some(hex) = text.strip_prefix("u+").or_else(|| text.strip_prefix("U+")) {
            if let Ok(unicode) = u32::from_str_radix(hex, 16) {
                return name_from_unicode(unicode);
            }
        }
        let hex = text
            .strip_prefix("0x")
            .or_else(|| text.strip_prefix("0X"))
            .unwrap_or(text);
        if hex.len() == 4 || hex.len() == 5 {
            if let Ok(code) = i64::from_str_radix(hex, 16) {
                return self.name_for_code(code);
            }
        }
        if self.glyph(text).is_some() {
            return text.clone();
        }
        if let Some(unicode) = unicode_from_name(text) {
            return self.name_for_code(i64::from(unicode));
        }
        let Some(first) = text.chars().next() else {
            return "NameMe.".to_string();
        };
        if text.chars().count() != 1 {
            tracing::warn!("`{text}` is not a valid glyph name, assuming `{first}`");
        }
        self.name_for_code(first as i64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn font_with(names: &[(&str, i64)]) -> FontModel {
        let mut font = FontModel::default();
        for (name, code) in names {
            font.upsert_glyph(Glyph::new(name, Some(*code), None));
        }
        font
    }

    #[test]
    fn test_upsert_replaces_by_name() {
        let mut font = FontModel::default();
        font.upsert_glyph(Glyph::new("A", Some(65), Some(65)));
        let mut again = Glyph::new("A", Some(65), Some(65));
        again.width = 500;
        font.upsert_glyph(again);
        assert_eq!(font.glyphs.len(), 1);
        assert_eq!(font.glyph("A").map(|g| g.width), Some(500));
    }

    #[test]
    fn test_resolve_name_plain() {
        let font = font_with(&[("A", 65)]);
        assert_eq!(font.resolve_name(&CharRef::Text("AB".to_string()), false), "A");
        assert_eq!(font.resolve_name(&CharRef::Code(66), false), "B");
        assert_eq!(font.resolve_name(&CharRef::Code(-3), false), "NameMe.-3");
    }

    #[test]
    fn test_resolve_name_generalized() {
        let font = font_with(&[("A", 65), ("A.alt", 1000)]);
        let resolve = |text: &str| font.resolve_name(&CharRef::Text(text.to_string()), true);
        assert_eq!(resolve("U+00E9"), "eacute");
        assert_eq!(resolve("0x0041"), "A");
        assert_eq!(resolve("00e9"), "eacute");
        assert_eq!(resolve("A.alt"), "A.alt");
        assert_eq!(resolve("ff"), "ff");
        assert_eq!(resolve("Bogus"), "B");
    }

    #[test]
    fn test_metadata_is_flat() {
        let mut info = FontInfo::default();
        info.cap_height = Some(700);
        info.math_constants.insert("AxisHeight".to_string(), 250);
        let metadata = info.metadata();
        assert_eq!(metadata.get("cap_height").map(String::as_str), Some("700"));
        assert_eq!(metadata.get("math.AxisHeight").map(String::as_str), Some("250"));
        assert!(!metadata.contains_key("x_height"));
    }
}
