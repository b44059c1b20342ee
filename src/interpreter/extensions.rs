//! Extension macro records
//!
//! Font-wide values are written to the font model right away. Glyph and
//! ligature values wait in the glyph scratch until the next shipout.

use super::{picture_name, Interpreter, LigatureResult, LigatureRule, Replacement};
use crate::core::errors::Skip;
use crate::engine::OutlineEngine;
use crate::font::{subtable_name, Anchor, CharRef, LookupKind, LookupSpec};
use crate::geometry::utilities::round_units;
use crate::trace::{
    parse_number, parse_pair, parse_rounded, unquote, AnchorKind, FontCommand, GlyphCommand, LigatureOp,
    TraceRecord,
};
use tracing::{debug, warn};

const MARK_TO_BASE: &str = "gpos_mark2base";
const MARK_TO_MARK: &str = "gpos_mark2mark";

/// Fields of a record that takes exactly `expected` arguments
fn arguments<'r>(record: &'r TraceRecord, expected: usize) -> Result<Vec<&'r str>, Skip> {
    let fields = record.fields();
    if fields.len() != expected {
        return Err(Skip::ArgumentCount {
            op: record.name.clone(),
            expected,
            given: fields.len(),
        });
    }
    Ok(fields)
}

fn unquoted(text: &str) -> &str {
    unquote(text).unwrap_or(text)
}

/// `Some(valid)` for the private dictionary keys that are checked, `None`
/// for any other key
fn check_private_entry(key: &str, value: &str) -> Option<bool> {
    let array = || value.strip_prefix('[').and_then(|v| v.strip_suffix(']'));
    let integers = |text: &str| {
        text.split_whitespace()
            .map(str::parse::<i64>)
            .collect::<Result<Vec<i64>, _>>()
            .ok()
    };
    Some(match key {
        "BlueValues" | "FamilyBlues" | "OtherBlues" | "FamilyOtherBlues" => {
            let max_pairs = if matches!(key, "BlueValues" | "FamilyBlues") { 7 } else { 5 };
            array()
                .and_then(integers)
                .is_some_and(|values| values.len() % 2 == 0 && values.len() / 2 <= max_pairs)
        }
        "BlueScale" | "ExpansionFactor" => value.parse::<f64>().is_ok(),
        "BlueShift" | "BlueFuzz" | "lenIV" | "LanguageGroup" => value.parse::<i64>().is_ok(),
        "StdHW" | "StdVW" => array().is_some_and(|v| v.trim().parse::<i64>().is_ok()),
        "StemSnapH" | "StemSnapV" => array()
            .and_then(integers)
            .is_some_and(|values| values.len() <= 12 && values.windows(2).all(|w| w[0] <= w[1])),
        "forceBold" | "RndStemUp" => matches!(value, "true" | "false"),
        _ => return None,
    })
}

impl<E: OutlineEngine> Interpreter<E> {
    /// `attachment_point_<kind> class>> x>> y`
    pub(super) fn attachment_point(&mut self, kind: AnchorKind, record: &TraceRecord) -> Result<(), Skip> {
        let fields = record.fields();
        let malformed = |e| Skip::malformed(&record.name, e);
        let (class, x, y) = match fields[..] {
            [class, x, y] => (class, parse_number(x).map_err(malformed)?, parse_number(y).map_err(malformed)?),
            [class, pair] => {
                let p = parse_pair(pair).map_err(malformed)?;
                (class, p.x, p.y)
            }
            _ => {
                return Err(Skip::ArgumentCount {
                    op: record.name.clone(),
                    expected: 3,
                    given: fields.len(),
                })
            }
        };
        let class = picture_name(class).to_string();

        let spec = match kind.feature() {
            "mark" => LookupSpec {
                name: MARK_TO_BASE,
                kind: LookupKind::GposMarkToBase,
                feature: Some("mark"),
                after: None,
            },
            _ => LookupSpec {
                name: MARK_TO_MARK,
                kind: LookupKind::GposMarkToMark,
                feature: Some("mkmk"),
                after: Some(MARK_TO_BASE),
            },
        };
        let subtable = subtable_name(&format!("{}_subtable", spec.name), self.settings.subtable_index);
        self.font
            .lookups
            .subtable_mut(spec, &self.settings.scripts, &subtable)
            .add_anchor_class(&class);

        self.glyph.anchors.push(Anchor {
            class,
            point_type: kind.point_type().to_string(),
            x,
            y,
        });
        Ok(())
    }

    pub(super) fn font_command(&mut self, command: FontCommand, record: &TraceRecord) -> Result<(), Skip> {
        let info = &mut self.font.info;
        let text = || unquoted(record.body.trim()).to_string();
        match command {
            FontCommand::Name => info.font_name = text(),
            FontCommand::FamilyName => info.family_name = text(),
            FontCommand::FullName => info.full_name = text(),
            FontCommand::Weight => info.weight = text(),
            FontCommand::Version => info.version = text(),
            FontCommand::Copyright => info.copyright = text(),
            FontCommand::Comment => info.comment = text(),
            FontCommand::Fontlog => info.fontlog = text(),
            FontCommand::Ascent
            | FontCommand::Descent
            | FontCommand::CapHeight
            | FontCommand::UnderlinePosition
            | FontCommand::UnderlineWidth => {
                let fields = arguments(record, 2)?;
                let malformed = |e| Skip::malformed(&record.name, e);
                let hppp = parse_number(fields[0]).map_err(malformed)?;
                let value = round_units(parse_number(fields[1]).map_err(malformed)? * hppp);
                match command {
                    FontCommand::Ascent => {
                        info.ascent = value;
                        self.specified.ascent = true;
                    }
                    FontCommand::Descent => {
                        info.descent = value;
                        self.specified.descent = true;
                    }
                    FontCommand::CapHeight => info.cap_height = Some(value),
                    FontCommand::UnderlinePosition => info.underline_position = Some(value),
                    _ => info.underline_width = Some(value),
                }
            }
            FontCommand::AddExtrema => info.post_process.add_extrema = true,
            FontCommand::AddInflections => info.post_process.add_inflections = true,
            FontCommand::Round => info.post_process.round = true,
            FontCommand::AutoHint => info.post_process.auto_hint = true,
            FontCommand::AutoInstruct => info.post_process.auto_instruct = true,
            FontCommand::MathConstant => {
                let fields = arguments(record, 2)?;
                let name = unquoted(fields[0]).to_string();
                let value = parse_rounded(fields[1]).map_err(|e| Skip::malformed(&record.name, e))?;
                info.math_constants.insert(name.clone(), value);
                self.specified.math_constants.insert(name);
            }
            FontCommand::PrivateDictionary => {
                let fields = arguments(record, 2)?;
                let key = unquoted(fields[0]).to_string();
                let value = unquoted(fields[1]).trim().to_string();
                match check_private_entry(&key, &value) {
                    Some(false) => return Err(Skip::InvalidPrivateEntry { key, value }),
                    Some(true) => {}
                    None => warn!("unknown PostScript private dictionary entry {key}"),
                }
                info.private_dict.insert(key, value);
            }
        }
        Ok(())
    }

    pub(super) fn glyph_command(&mut self, command: GlyphCommand, record: &TraceRecord) -> Result<(), Skip> {
        let scratch = &mut self.glyph;
        let malformed = |e| Skip::malformed(&record.name, e);
        match command {
            GlyphCommand::Name | GlyphCommand::Comment => {
                let arg = arguments(record, 1)?[0];
                let text = unquote(arg)
                    .ok_or_else(|| Skip::ExpectedString(record.name.clone()))?
                    .to_string();
                if command == GlyphCommand::Name {
                    scratch.name = Some(text);
                } else {
                    scratch.comment = Some(text);
                }
            }
            GlyphCommand::Unicode => {
                let arg = arguments(record, 1)?[0];
                let unicode = match unquote(arg) {
                    Some(text) => {
                        let hex = text
                            .get(..2)
                            .filter(|p| p.eq_ignore_ascii_case("u+") || p.eq_ignore_ascii_case("0x"))
                            .map_or(text, |_| &text[2..]);
                        u32::from_str_radix(hex, 16).ok()
                    }
                    None => parse_rounded(arg).map_err(malformed)?.try_into().ok(),
                };
                match unicode {
                    Some(unicode) => scratch.unicode = Some(unicode),
                    None => {
                        return Err(Skip::malformed(
                            &record.name,
                            crate::trace::OperandError::Number(arg.to_string()),
                        ))
                    }
                }
            }
            GlyphCommand::TopAccent => {
                let arg = arguments(record, 1)?[0];
                scratch.top_accent = Some(parse_rounded(arg).map_err(malformed)?);
            }
            GlyphCommand::Build => scratch.build = true,
            GlyphCommand::AddReference => {
                let fields = arguments(record, 2)?;
                scratch.references.push((fields[0].to_string(), fields[1].to_string()));
            }
            GlyphCommand::AddExtrema => scratch.post_process.add_extrema = true,
            GlyphCommand::AddInflections => scratch.post_process.add_inflections = true,
            GlyphCommand::Round => scratch.post_process.round = true,
            GlyphCommand::AutoHint => scratch.post_process.auto_hint = true,
            GlyphCommand::AutoInstruct => scratch.post_process.auto_instruct = true,
            GlyphCommand::Hint(kind) => {
                let args = record.fields().into_iter().map(str::to_string).collect();
                scratch.hints.push((kind, args));
            }
            GlyphCommand::MathKerning(corner) => {
                let args = record.fields().into_iter().map(str::to_string).collect();
                scratch.math_kerning.push((corner, args));
            }
            GlyphCommand::ReplacedBy | GlyphCommand::ReplacementOf => {
                let fields = arguments(record, 2)?;
                let other = unquoted(fields[0]).to_string();
                let feature = unquoted(fields[1]).to_string();
                // the glyph being shipped is filled in at shipout
                let replacement = if command == GlyphCommand::ReplacementOf {
                    Replacement {
                        glyph: Some(other),
                        feature,
                        replacement: None,
                    }
                } else {
                    Replacement {
                        glyph: None,
                        feature,
                        replacement: Some(other),
                    }
                };
                scratch.replacements.push(replacement);
            }
        }
        Ok(())
    }

    /// A ligature of the listed components that produces the next glyph
    pub(super) fn ligature_components(&mut self, record: &TraceRecord) -> Result<(), Skip> {
        let components = record
            .fields()
            .into_iter()
            .map(CharRef::parse)
            .collect::<Result<Vec<CharRef>, _>>()
            .map_err(|e| Skip::malformed(&record.name, e))?;
        debug!(components = components.len(), "ligature of the next glyph");
        self.tables.ligatures.push(LigatureRule {
            result: LigatureResult::NextGlyph,
            shape: LigatureOp {
                left_pipe: false,
                right_pipe: false,
                skip: 0,
            },
            components,
            feature: self.tables.lig_feature.clone(),
        });
        Ok(())
    }

    pub(super) fn ligature_carets(&mut self, record: &TraceRecord) -> Result<(), Skip> {
        self.glyph.carets = record
            .fields()
            .into_iter()
            .map(parse_rounded)
            .collect::<Result<Vec<i64>, _>>()
            .map_err(|e| Skip::malformed(&record.name, e))?;
        Ok(())
    }
}
