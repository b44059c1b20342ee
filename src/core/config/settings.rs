//! Interpreter settings
//!
//! Everything that changes how a trace is turned into a font. All fields
//! have defaults, so a settings file only needs the values it changes.

use crate::font::ScriptLanguages;
use crate::trace::Extension;
use serde::{Deserialize, Serialize};

/// Inclusive code range; a single code when `end` is `None`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodeRange {
    pub start: i64,
    #[serde(default)]
    pub end: Option<i64>,
}

impl CodeRange {
    pub fn contains(&self, code: i64) -> bool {
        match self.end {
            Some(end) => (self.start..=end).contains(&code),
            None => code == self.start,
        }
    }
}

/// Tuning values for the geometry passes
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeometryParams {
    /// Scale applied around direction correction
    pub correct_direction_scale: f64,
    /// Scale applied around overlap removal
    pub remove_overlap_scale: f64,
    pub artifact_distance_threshold: f64,
    pub artifact_point_threshold: f64,
    pub collinear_distance_threshold: f64,
    pub make_lines_distance_threshold: f64,
}

impl Default for GeometryParams {
    fn default() -> Self {
        Self {
            correct_direction_scale: 10.0,
            remove_overlap_scale: 1000.0,
            artifact_distance_threshold: 0.01,
            artifact_point_threshold: 0.1,
            collinear_distance_threshold: 0.01,
            make_lines_distance_threshold: 0.01,
        }
    }
}

/// Optional macro sets the trace may use
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Extensions {
    pub attachment_points: bool,
    pub font: bool,
    pub glyph: bool,
    pub ligature: bool,
    pub ligtable_switch: bool,
    pub outline: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Fixed ascent; the tallest glyph height is used otherwise
    pub ascent: Option<i64>,
    /// Fixed descent; the deepest glyph depth is used otherwise
    pub descent: Option<i64>,
    pub charcode_from_last_ascii_hex_arg: bool,
    pub cull_at_shipout: bool,
    pub fix_contours: bool,
    pub remove_artifacts: bool,
    pub remove_collinear: bool,
    /// Turn straight cubic joins into lines when paths are read
    pub make_lines: bool,
    pub extensions: Extensions,
    /// Accept `U+XXXX`, hex codes and glyph names in ligtables and charlists
    pub generalized_code: bool,
    pub glyph_name_suffix: Option<String>,
    /// Ship every glyph as an alternate for this OpenType feature
    pub ot_sub_feature: Option<String>,
    pub only_code_points: Option<Vec<CodeRange>>,
    pub ignore_code_points: Option<Vec<CodeRange>>,
    pub input_encoding: Option<String>,
    pub kerning_classes: bool,
    pub scripts: Vec<ScriptLanguages>,
    pub set_italic_correction: bool,
    pub set_math_defaults: bool,
    pub set_top_accent: bool,
    /// -1 picks the skew character from the input encoding
    pub skewchar: i64,
    pub space_from_fontdimen: bool,
    pub stroke_accuracy: Option<f64>,
    pub stroke_simplify: bool,
    /// Appended to subtable names, for runs that add to an existing font
    pub subtable_index: Option<u32>,
    pub ppi: f64,
    pub use_ppi_factor: bool,
    pub upm: Option<u32>,
    pub font_name: Option<String>,
    pub family_name: Option<String>,
    pub full_name: Option<String>,
    pub version: String,
    pub copyright: String,
    pub comment: String,
    pub fontlog: String,
    pub italic_angle: f64,
    pub design_size: Option<f64>,
    pub underline_position: Option<f64>,
    pub underline_width: Option<f64>,
    pub geometry: GeometryParams,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            ascent: None,
            descent: None,
            charcode_from_last_ascii_hex_arg: false,
            cull_at_shipout: false,
            fix_contours: false,
            remove_artifacts: false,
            remove_collinear: false,
            make_lines: false,
            extensions: Extensions::default(),
            generalized_code: false,
            glyph_name_suffix: None,
            ot_sub_feature: None,
            only_code_points: None,
            ignore_code_points: None,
            input_encoding: None,
            kerning_classes: false,
            scripts: vec![
                ScriptLanguages::new("cyrl", &["dflt"]),
                ScriptLanguages::new("grek", &["dflt"]),
                ScriptLanguages::new("latn", &["dflt"]),
            ],
            set_italic_correction: true,
            set_math_defaults: true,
            set_top_accent: false,
            skewchar: -1,
            space_from_fontdimen: true,
            stroke_accuracy: None,
            stroke_simplify: true,
            subtable_index: None,
            ppi: 1000.0,
            use_ppi_factor: false,
            upm: None,
            font_name: None,
            family_name: None,
            full_name: None,
            version: "001.000".to_string(),
            copyright: String::new(),
            comment: String::new(),
            fontlog: String::new(),
            italic_angle: 0.0,
            design_size: None,
            underline_position: None,
            underline_width: None,
            geometry: GeometryParams::default(),
        }
    }
}

impl Settings {
    pub fn extension_enabled(&self, extension: Extension) -> bool {
        match extension {
            Extension::AsciiHexCode => self.charcode_from_last_ascii_hex_arg,
            Extension::AttachmentPoints => self.extensions.attachment_points,
            Extension::Font => self.extensions.font,
            Extension::Glyph => self.extensions.glyph,
            Extension::Ligature => self.extensions.ligature,
            Extension::LigtableSwitch => self.extensions.ligtable_switch,
            Extension::Outline => self.extensions.outline,
        }
    }

    /// Whether a glyph with this code is filtered out by the code ranges
    pub fn skips_code(&self, code: i64) -> bool {
        if let Some(only) = &self.only_code_points {
            if !only.iter().any(|r| r.contains(code)) {
                return true;
            }
        }
        self.ignore_code_points
            .as_ref()
            .is_some_and(|ignore| ignore.iter().any(|r| r.contains(code)))
    }

    pub fn make_lines_threshold(&self) -> Option<f64> {
        self.make_lines
            .then_some(self.geometry.make_lines_distance_threshold)
    }

    /// Reject combinations that can't work
    pub fn validate(&self) -> Result<(), String> {
        if self.ppi <= 0.0 {
            return Err(format!("ppi must be positive, got {}", self.ppi));
        }
        if self.upm == Some(0) {
            return Err("upm must be positive".to_string());
        }
        let ranges = self.only_code_points.iter().chain(self.ignore_code_points.iter()).flatten();
        for range in ranges {
            if range.end.is_some_and(|end| end < range.start) {
                return Err(format!(
                    "code range {}..{} is empty",
                    range.start,
                    range.end.unwrap_or(range.start)
                ));
            }
        }
        Ok(())
    }
}
