//! Operation kinds
//!
//! Every record name in the trace maps to one `Op` when the log is
//! tokenized, so the interpreter dispatches on a closed set of variants
//! instead of comparing strings.

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TransformKind {
    Rotated,
    Scaled,
    Shifted,
    Slanted,
    XScaled,
    YScaled,
}

/// Shape of a `=:` ligature operator: `|` on either side and up to two `>`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LigatureOp {
    pub left_pipe: bool,
    pub right_pipe: bool,
    pub skip: u8,
}

impl LigatureOp {
    /// Parse the trace spelling, where `p` stands for `|` and `g` for `>`
    fn from_name(name: &str) -> Option<Self> {
        let (left, right) = name.split_once("=:")?;
        if !left.chars().all(|c| c == 'p') || !right.chars().all(|c| c == 'p' || c == 'g') {
            return None;
        }
        Some(Self {
            left_pipe: left.contains('p'),
            right_pipe: right.contains('p'),
            skip: right.chars().filter(|&c| c == 'g').count().min(2) as u8,
        })
    }

    /// The operator as written in a ligtable, e.g. `|=:>`
    pub fn spelling(&self) -> String {
        let mut s = String::new();
        if self.left_pipe {
            s.push('|');
        }
        s.push_str("=:");
        if self.right_pipe {
            s.push('|');
        }
        for _ in 0..self.skip {
            s.push('>');
        }
        s
    }
}

/// Which attachment-point macro produced an anchor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum AnchorKind {
    MarkBase,
    MarkMark,
    MkmkBasemark,
    MkmkMark,
}

impl AnchorKind {
    /// OpenType feature the anchor's lookup is registered under
    pub fn feature(&self) -> &'static str {
        match self {
            AnchorKind::MarkBase | AnchorKind::MarkMark => "mark",
            AnchorKind::MkmkBasemark | AnchorKind::MkmkMark => "mkmk",
        }
    }

    /// Role of the anchor point on the glyph it is attached to
    pub fn point_type(&self) -> &'static str {
        match self {
            AnchorKind::MarkBase => "base",
            AnchorKind::MarkMark | AnchorKind::MkmkMark => "mark",
            AnchorKind::MkmkBasemark => "basemark",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum FontCommand {
    Name,
    FamilyName,
    FullName,
    Weight,
    Version,
    Copyright,
    Comment,
    Fontlog,
    Ascent,
    Descent,
    CapHeight,
    UnderlinePosition,
    UnderlineWidth,
    AddExtrema,
    AddInflections,
    Round,
    AutoHint,
    AutoInstruct,
    MathConstant,
    PrivateDictionary,
}

impl FontCommand {
    fn from_name(name: &str) -> Option<Self> {
        Some(match name {
            "name" => Self::Name,
            "family_name" => Self::FamilyName,
            "full_name" => Self::FullName,
            "weight" => Self::Weight,
            "version" => Self::Version,
            "copyright" => Self::Copyright,
            "comment" => Self::Comment,
            "fontlog" => Self::Fontlog,
            "ascent" => Self::Ascent,
            "descent" => Self::Descent,
            "cap_height" => Self::CapHeight,
            "underline_position" => Self::UnderlinePosition,
            "underline_width" => Self::UnderlineWidth,
            "add_extrema" => Self::AddExtrema,
            "add_inflections" => Self::AddInflections,
            "round" => Self::Round,
            "auto_hint" => Self::AutoHint,
            "auto_instruct" => Self::AutoInstruct,
            "math_constant" => Self::MathConstant,
            "postscript_private_dictionary" => Self::PrivateDictionary,
            _ => return None,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum HintKind {
    Horizontal,
    Vertical,
    Diagonal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Corner {
    TopRight,
    TopLeft,
    BottomRight,
    BottomLeft,
}

impl Corner {
    pub fn is_right(&self) -> bool {
        matches!(self, Corner::TopRight | Corner::BottomRight)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum GlyphCommand {
    Name,
    Unicode,
    Comment,
    TopAccent,
    Build,
    AddReference,
    AddExtrema,
    AddInflections,
    Round,
    AutoHint,
    AutoInstruct,
    Hint(HintKind),
    MathKerning(Corner),
    ReplacedBy,
    ReplacementOf,
}

impl GlyphCommand {
    fn from_name(name: &str) -> Option<Self> {
        Some(match name {
            "name" => Self::Name,
            "unicode" => Self::Unicode,
            "comment" => Self::Comment,
            "top_accent" => Self::TopAccent,
            "build" => Self::Build,
            "add_reference" => Self::AddReference,
            "add_extrema" => Self::AddExtrema,
            "add_inflections" => Self::AddInflections,
            "round" => Self::Round,
            "auto_hint" => Self::AutoHint,
            "auto_instruct" => Self::AutoInstruct,
            "add_horizontal_hint" => Self::Hint(HintKind::Horizontal),
            "add_vertical_hint" => Self::Hint(HintKind::Vertical),
            "add_diagonal_hint" => Self::Hint(HintKind::Diagonal),
            "add_math_kerning_top_right" => Self::MathKerning(Corner::TopRight),
            "add_math_kerning_top_left" => Self::MathKerning(Corner::TopLeft),
            "add_math_kerning_bottom_right" => Self::MathKerning(Corner::BottomRight),
            "add_math_kerning_bottom_left" => Self::MathKerning(Corner::BottomLeft),
            "replaced_by" => Self::ReplacedBy,
            "replacement_of" => Self::ReplacementOf,
            _ => return None,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum OutlineCommand {
    SortCanonical,
    SortDir,
    NameByCoords,
    NameByIndex,
    MakeFirst,
    MakeFirstContour,
    Delete,
    DeleteContour,
}

impl OutlineCommand {
    fn from_name(name: &str) -> Option<Self> {
        Some(match name {
            "sort_canonical" => Self::SortCanonical,
            "sort_dir" => Self::SortDir,
            "point_name_by_coords" => Self::NameByCoords,
            "point_name_by_index" => Self::NameByIndex,
            "point_make_first" => Self::MakeFirst,
            "point_make_first_contour" => Self::MakeFirstContour,
            "point_delete" => Self::Delete,
            "point_delete_contour" => Self::DeleteContour,
            _ => return None,
        })
    }
}

/// Ligtable operator kinds that can be switched to another feature, with
/// the features each may use (the first is the default).
pub const LIGTABLE_FEATURES: &[(&str, &[&str])] = &[("lig", &["liga", "dlig", "hlig"])];

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum Op {
    Addto,
    Also,
    Contour,
    Doublepath,
    TurningCheck,
    TurningNumber,
    WithPen,
    WithWeight,
    Transform(TransformKind),
    Cull,
    Keeping,
    Dropping,
    Picture,
    PicEqn,
    Pic,
    Assign,
    Equate,
    Minus,
    Plus,
    Shipout,
    Ligtable,
    Label,
    SkipLabel,
    BoundaryLabel,
    Kern,
    Ligature(LigatureOp),
    SkipTo,
    Fontdimen,
    Charlist,
    Extensible,
    End,
    Ascii,
    AttachmentPoint(AnchorKind),
    Font(FontCommand),
    Glyph(GlyphCommand),
    LigatureComponents,
    LigatureCarets,
    LigtableSwitch { kind: String, feature: String },
    Outline(OutlineCommand),
    Unknown(String),
}

impl Op {
    pub fn from_name(name: &str) -> Op {
        match name {
            "addto" => Op::Addto,
            "also" => Op::Also,
            "contour" => Op::Contour,
            "doublepath" => Op::Doublepath,
            "turningcheck" => Op::TurningCheck,
            "turningnumber" => Op::TurningNumber,
            "withpen" => Op::WithPen,
            "withweight" => Op::WithWeight,
            "rotated" => Op::Transform(TransformKind::Rotated),
            "scaled" => Op::Transform(TransformKind::Scaled),
            "shifted" => Op::Transform(TransformKind::Shifted),
            "slanted" => Op::Transform(TransformKind::Slanted),
            "xscaled" => Op::Transform(TransformKind::XScaled),
            "yscaled" => Op::Transform(TransformKind::YScaled),
            "cull" => Op::Cull,
            "keeping" => Op::Keeping,
            "dropping" => Op::Dropping,
            "picture" => Op::Picture,
            "pic_eqn" => Op::PicEqn,
            "pic" => Op::Pic,
            "as" => Op::Assign,
            "eq" => Op::Equate,
            "mi" => Op::Minus,
            "pl" => Op::Plus,
            "shipout" => Op::Shipout,
            "ligtable" => Op::Ligtable,
            ":" => Op::Label,
            "::" => Op::SkipLabel,
            "pp:" => Op::BoundaryLabel,
            "kern" => Op::Kern,
            "skipto" => Op::SkipTo,
            "fontdimen" => Op::Fontdimen,
            "charlist" => Op::Charlist,
            "extensible" => Op::Extensible,
            "end" => Op::End,
            "ASCII" => Op::Ascii,
            "ligature_components" => Op::LigatureComponents,
            "ligature_carets" => Op::LigatureCarets,
            _ => Self::from_prefixed_name(name).unwrap_or_else(|| Op::Unknown(name.to_string())),
        }
    }

    fn from_prefixed_name(name: &str) -> Option<Op> {
        if name.contains("=:") {
            return LigatureOp::from_name(name).map(Op::Ligature);
        }
        if let Some(rest) = name.strip_prefix("attachment_point_") {
            return Some(Op::AttachmentPoint(match rest {
                "mark_base" => AnchorKind::MarkBase,
                "mark_mark" => AnchorKind::MarkMark,
                "mkmk_basemark" => AnchorKind::MkmkBasemark,
                "mkmk_mark" => AnchorKind::MkmkMark,
                _ => return None,
            }));
        }
        if let Some(rest) = name.strip_prefix("ligtable_switch_") {
            let (kind, feature) = rest.split_once("_to_")?;
            let supported = LIGTABLE_FEATURES
                .iter()
                .any(|(k, features)| *k == kind && features.contains(&feature));
            return supported.then(|| Op::LigtableSwitch {
                kind: kind.to_string(),
                feature: feature.to_string(),
            });
        }
        if let Some(rest) = name.strip_prefix("font_") {
            return FontCommand::from_name(rest).map(Op::Font);
        }
        if let Some(rest) = name.strip_prefix("glyph_") {
            return GlyphCommand::from_name(rest).map(Op::Glyph);
        }
        if let Some(rest) = name.strip_prefix("outline_") {
            return OutlineCommand::from_name(rest).map(Op::Outline);
        }
        None
    }

    /// Whether the op only appears when an extension macro set is loaded
    pub fn extension(&self) -> Option<Extension> {
        match self {
            Op::Ascii => Some(Extension::AsciiHexCode),
            Op::AttachmentPoint(_) => Some(Extension::AttachmentPoints),
            Op::Font(_) => Some(Extension::Font),
            Op::Glyph(_) => Some(Extension::Glyph),
            Op::LigatureComponents | Op::LigatureCarets => Some(Extension::Ligature),
            Op::LigtableSwitch { .. } => Some(Extension::LigtableSwitch),
            Op::Outline(_) => Some(Extension::Outline),
            _ => None,
        }
    }
}

/// Optional macro sets layered on top of the base instrumentation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Extension {
    AsciiHexCode,
    AttachmentPoints,
    Font,
    Glyph,
    Ligature,
    LigtableSwitch,
    Outline,
}
