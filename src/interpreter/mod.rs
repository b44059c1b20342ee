//! Trace interpreter
//!
//! One pass over the trace records. Pictures are built and combined as the
//! compiler did, glyphs are committed at every shipout, and the ligature,
//! kerning and variant tables are collected on the way. Everything that
//! needs all glyphs to exist is done afterwards in [`Interpreter::finish`].
//!
//! Handlers return `Result<(), Skip>`. A skip is logged with the last known
//! source line and the pass continues with the next record.

mod addto;
mod cull;
mod extensions;
mod finish;
mod ligtable;
mod outline_ops;
mod pen;
pub mod pictures;
pub mod prerun;
mod shipout;

pub use pen::Pen;
pub use pictures::{Picture, Pictures, NULL_PICTURE};
pub use prerun::{scan_extents, target_ppi, Extents, PpiPlan};

use crate::core::config::Settings;
use crate::core::errors::Skip;
use crate::engine::OutlineEngine;
use crate::font::{Anchor, CharRef, Encoding, FontModel, PostProcess};
use crate::geometry::utilities::round_units;
use crate::trace::{unquote, Corner, HintKind, LigatureOp, Op, TraceRecord};
use std::collections::{BTreeMap, HashMap, HashSet};
use tracing::{debug, info, warn};

/// Position in the record list, with the last source line seen so far
#[derive(Debug, Clone)]
pub struct Cursor<'a> {
    records: &'a [TraceRecord],
    pos: usize,
    last_line: Option<u32>,
}

impl<'a> Cursor<'a> {
    pub fn new(records: &'a [TraceRecord]) -> Self {
        Self {
            records,
            pos: 0,
            last_line: None,
        }
    }

    pub fn peek(&self) -> Option<&'a TraceRecord> {
        self.records.get(self.pos)
    }

    /// Take the next record
    pub fn advance(&mut self) -> Option<&'a TraceRecord> {
        let record = self.records.get(self.pos)?;
        self.pos += 1;
        if record.line.is_some() {
            self.last_line = record.line;
        }
        Some(record)
    }

    /// Take the next record only if its op satisfies `accept`
    pub fn advance_if(&mut self, accept: impl FnOnce(&Op) -> bool) -> Option<&'a TraceRecord> {
        match self.peek() {
            Some(record) if accept(&record.op) => self.advance(),
            _ => None,
        }
    }

    /// Take the record that `op` requires to follow it
    pub fn expect(&mut self, op: &str) -> Result<&'a TraceRecord, Skip> {
        self.advance()
            .ok_or_else(|| Skip::Truncated { op: op.to_string() })
    }

    pub fn last_line(&self) -> Option<u32> {
        self.last_line
    }
}

/// Picture name from a record field; the compiler prints names quoted
pub(crate) fn picture_name(field: &str) -> &str {
    unquote(field).unwrap_or_else(|| field.trim())
}

/// A kerning pair as the ligtable gave it
#[derive(Debug, Clone, PartialEq)]
pub struct KernPair {
    pub left: CharRef,
    pub right: CharRef,
    pub kern: i64,
}

/// The glyph a ligature rule produces
#[derive(Debug, Clone, PartialEq)]
pub enum LigatureResult {
    Char(CharRef),
    Glyph(String),
    /// The next glyph that is shipped out
    NextGlyph,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LigatureRule {
    pub result: LigatureResult,
    pub shape: LigatureOp,
    pub components: Vec<CharRef>,
    pub feature: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Charlist {
    pub base: CharRef,
    pub variants: Vec<CharRef>,
}

/// One piece of an extensible recipe; the depth of the piece's glyph is
/// filled in once all glyphs exist
#[derive(Debug, Clone, PartialEq)]
pub struct ExtensiblePiece {
    pub glyph: CharRef,
    pub extender: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Extensible {
    pub label: CharRef,
    pub pieces: Vec<ExtensiblePiece>,
}

/// `(glyph, feature, replacement)`; `None` stands for the next shipped glyph
#[derive(Debug, Clone, PartialEq)]
pub struct Replacement {
    pub glyph: Option<String>,
    pub feature: String,
    pub replacement: Option<String>,
}

/// Values the glyph and ligature extensions collect for the next shipout
#[derive(Debug, Clone, Default)]
struct GlyphScratch {
    name: Option<String>,
    unicode: Option<u32>,
    comment: Option<String>,
    top_accent: Option<i64>,
    build: bool,
    /// `(glyph text, transform text)`
    references: Vec<(String, String)>,
    post_process: PostProcess,
    hints: Vec<(HintKind, Vec<String>)>,
    math_kerning: Vec<(Corner, Vec<String>)>,
    replacements: Vec<Replacement>,
    anchors: Vec<Anchor>,
    carets: Vec<i64>,
}

/// Value of the last `ASCII` call with a hex string argument
#[derive(Debug, Clone, Copy, PartialEq)]
struct AsciiCode {
    value: i64,
    /// Code of the string's first character, what the compiler used
    first_char: i64,
    is_unicode: bool,
}

/// Tables collected over the whole trace
#[derive(Debug, Clone)]
struct Tables {
    kerns: Vec<KernPair>,
    ligatures: Vec<LigatureRule>,
    charlists: Vec<Charlist>,
    extensibles: Vec<Extensible>,
    skiptos: HashMap<String, Vec<CharRef>>,
    /// Last variant of a charlist and the charlist's base
    last_variants: Vec<(CharRef, CharRef)>,
    replacements: Vec<(String, String, String)>,
    /// `(glyph, referenced glyph, [xx, xy, yx, yy, tx, ty])`
    references: Vec<(String, String, [f64; 6])>,
    lig_feature: String,
}

impl Default for Tables {
    fn default() -> Self {
        Self {
            kerns: Vec::new(),
            ligatures: Vec::new(),
            charlists: Vec::new(),
            extensibles: Vec::new(),
            skiptos: HashMap::new(),
            last_variants: Vec::new(),
            replacements: Vec::new(),
            references: Vec::new(),
            lig_feature: "liga".to_string(),
        }
    }
}

/// Values given explicitly that computed defaults must not override
#[derive(Debug, Clone, Default)]
struct Specified {
    ascent: bool,
    descent: bool,
    top_accents: HashSet<String>,
    math_constants: HashSet<String>,
}

pub struct Interpreter<E: OutlineEngine> {
    settings: Settings,
    engine: E,
    pictures: Pictures,
    font: FontModel,
    glyph: GlyphScratch,
    ascii_code: Option<AsciiCode>,
    tables: Tables,
    specified: Specified,
    /// Math symbol font parameters by fontdimen number
    sigma: BTreeMap<u32, i64>,
    /// Math extension font parameters by fontdimen number
    xi: BTreeMap<u32, i64>,
    /// Every construct that was skipped, in trace order
    skipped: Vec<Skip>,
}

impl<E: OutlineEngine> Interpreter<E> {
    pub fn new(settings: Settings, engine: E) -> Self {
        Self::with_encoding(settings, engine, Encoding::Unicode)
    }

    pub fn with_encoding(settings: Settings, engine: E, encoding: Encoding) -> Self {
        let mut font = FontModel::new(encoding);
        let info = &mut font.info;
        if let Some(name) = &settings.font_name {
            info.font_name = name.clone();
        }
        if let Some(name) = &settings.family_name {
            info.family_name = name.clone();
        }
        if let Some(name) = &settings.full_name {
            info.full_name = name.clone();
        }
        info.version = settings.version.clone();
        info.copyright = settings.copyright.clone();
        info.comment = settings.comment.clone();
        info.fontlog = settings.fontlog.clone();
        info.italic_angle = settings.italic_angle;
        info.design_size = settings.design_size;
        info.underline_position = settings.underline_position.map(round_units);
        info.underline_width = settings.underline_width.map(round_units);
        info.units_per_em = settings.upm;
        info.ascent = settings.ascent.unwrap_or(0);
        info.descent = settings.descent.unwrap_or(0);

        Self {
            settings,
            engine,
            pictures: Pictures::new(),
            font,
            glyph: GlyphScratch::default(),
            ascii_code: None,
            tables: Tables::default(),
            specified: Specified::default(),
            sigma: BTreeMap::new(),
            xi: BTreeMap::new(),
            skipped: Vec::new(),
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn pictures(&self) -> &Pictures {
        &self.pictures
    }

    /// The font as built so far, before the table post-pass
    pub fn font(&self) -> &FontModel {
        &self.font
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    /// What was skipped so far; disabled extensions included
    pub fn skipped(&self) -> &[Skip] {
        &self.skipped
    }

    /// Interpret all records
    pub fn run(&mut self, records: &[TraceRecord]) {
        let mut cursor = Cursor::new(records);
        while let Some(record) = cursor.advance() {
            debug!(op = %record.name, line = ?cursor.last_line(), "record");
            if let Err(skip) = self.step(record, &mut cursor) {
                match skip {
                    Skip::ExtensionDisabled(_) => debug!(line = ?cursor.last_line(), "{skip}"),
                    _ => warn!(line = ?cursor.last_line(), "{skip}"),
                }
                self.skipped.push(skip);
            }
        }
        info!(
            records = records.len(),
            glyphs = self.font.glyphs.len(),
            skipped = self.skipped.len(),
            "trace interpreted"
        );
    }

    fn step(&mut self, record: &TraceRecord, cursor: &mut Cursor<'_>) -> Result<(), Skip> {
        if let Some(extension) = record.op.extension() {
            if !self.settings.extension_enabled(extension) {
                return Err(Skip::ExtensionDisabled(record.name.clone()));
            }
        }
        match &record.op {
            Op::Ascii => {
                self.ascii(record);
                Ok(())
            }
            Op::Addto => self.addto(record, cursor),
            Op::Cull => self.cull(record, cursor),
            Op::Picture => {
                self.declare_pictures(record);
                Ok(())
            }
            Op::PicEqn => self.picture_equation(record, cursor),
            Op::Shipout => self.shipout(record, cursor),
            Op::Ligtable => self.ligtable(record, cursor),
            Op::Fontdimen => self.fontdimen(record, cursor),
            Op::Charlist => self.charlist(record, cursor),
            Op::Extensible => self.extensible(record, cursor),
            Op::End => self.end(record),
            Op::AttachmentPoint(kind) => self.attachment_point(*kind, record),
            Op::Font(command) => self.font_command(*command, record),
            Op::Glyph(command) => self.glyph_command(*command, record),
            Op::LigatureComponents => self.ligature_components(record),
            Op::LigatureCarets => self.ligature_carets(record),
            Op::LigtableSwitch { feature, .. } => {
                self.tables.lig_feature = feature.clone();
                Ok(())
            }
            Op::Outline(command) => self.outline_command(*command, record),
            _ => Err(Skip::UnknownOperation {
                name: record.name.clone(),
                body: record.body.clone(),
            }),
        }
    }

    /// `picture a, b;` creates empty pictures
    fn declare_pictures(&mut self, record: &TraceRecord) {
        for field in record.fields() {
            self.pictures.declare(picture_name(field));
        }
    }

    /// `ASCII "<hex>"` remembers the value for the next shipout
    fn ascii(&mut self, record: &TraceRecord) {
        let text = unquote(&record.body).unwrap_or(record.body.trim());
        if text.is_empty() || text.len() % 2 != 0 {
            return;
        }
        let Some(first) = text.chars().next() else {
            return;
        };
        let (hex, is_unicode) = match text.get(..2) {
            Some(prefix) if prefix.eq_ignore_ascii_case("u+") => (&text[2..], true),
            _ => (text, false),
        };
        let hex = hex
            .strip_prefix("0x")
            .or_else(|| hex.strip_prefix("0X"))
            .unwrap_or(hex);
        match i64::from_str_radix(hex, 16) {
            Ok(value) => {
                self.ascii_code = Some(AsciiCode {
                    value,
                    first_char: first as i64,
                    is_unicode,
                })
            }
            Err(_) => debug!("ASCII argument `{text}` is not a hex code"),
        }
    }

    /// Run the table post-pass and hand out the font
    pub fn finish(mut self) -> FontModel {
        self.build_tables();
        self.font
    }
}

/// Interpret `records` with `engine` and return the finished font
pub fn interpret<E: OutlineEngine>(records: &[TraceRecord], settings: Settings, engine: E) -> FontModel {
    let mut interpreter = Interpreter::new(settings, engine);
    interpreter.run(records);
    interpreter.finish()
}
