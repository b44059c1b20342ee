//! `shipout`
//!
//! Commits the picture that follows as a glyph. Everything the glyph and
//! ligature extensions collected since the last shipout is attached to it
//! and then cleared.

use super::{picture_name, AsciiCode, Cursor, GlyphScratch, Interpreter, LigatureResult};
use crate::core::errors::Skip;
use crate::engine::{remove_overlap_scaled, OutlineEngine};
use crate::font::{name_from_unicode, CharRef, DiagonalHint, Glyph, MathKerning};
use crate::geometry::collinear::{fix_contours, remove_artifacts, remove_collinear};
use crate::geometry::utilities::{round_digits, round_units};
use crate::geometry::Outline;
use crate::trace::{parse_number, parse_pair, unquote, Corner, HintKind, OperandError, TraceRecord};
use kurbo::Affine;
use tracing::{debug, warn};

/// The box and position the compiler printed for a shipped picture
#[derive(Debug, Clone, Copy, PartialEq)]
pub(super) struct ShipoutBox {
    pub code: i64,
    /// Width, height, depth and italic correction in font units
    pub width: i64,
    pub height: i64,
    pub depth: i64,
    pub italic_correction: i64,
    pub x_offset: i64,
    pub y_offset: i64,
}

impl ShipoutBox {
    /// `hppp>> charcode>> charext>> wd>> ht>> dp>> ic>> dx>> dy>> xoffset>> yoffset`
    pub(super) fn parse(record: &TraceRecord) -> Result<Self, OperandError> {
        let fields = record.exact_fields(11)?;
        let value = |i: usize| parse_number(fields[i]);
        let hppp = value(0)?;
        let scaled = |i: usize| value(i).map(|v| round_units(v * hppp));
        Ok(Self {
            code: round_units(value(1)?) + round_units(value(2)?) * 256,
            width: scaled(3)?,
            height: scaled(4)?,
            depth: scaled(5)?,
            italic_correction: scaled(6)?,
            x_offset: round_units(value(9)?),
            y_offset: round_units(value(10)?),
        })
    }
}

impl<E: OutlineEngine> Interpreter<E> {
    pub(super) fn shipout(&mut self, record: &TraceRecord, cursor: &mut Cursor<'_>) -> Result<(), Skip> {
        let mut scratch = std::mem::take(&mut self.glyph);
        let ascii = self.ascii_code.take();
        let shipped = ShipoutBox::parse(record).map_err(|e| Skip::malformed("shipout", e))?;
        let picture = cursor.expect("shipout")?;
        let outline = self.shipped_outline(picture_name(&picture.body))?;

        let mut unicode = scratch.unicode;
        let mut code = match ascii {
            Some(AsciiCode {
                value,
                first_char,
                is_unicode,
            }) => {
                // charcode carries any offset from the ASCII value
                let code = value + (shipped.code - first_char);
                if is_unicode {
                    unicode = unicode.or(u32::try_from(code).ok());
                    -1
                } else {
                    code
                }
            }
            None => shipped.code,
        };
        let skip = code >= 0 && self.settings.skips_code(code);

        let mut name = scratch.name.clone();
        let mut substitution = None;
        if let Some(feature) = self.settings.ot_sub_feature.clone() {
            let base = if code < 0 {
                match (unicode, &name) {
                    (Some(unicode), _) => name_from_unicode(unicode),
                    (None, Some(name)) => name.clone(),
                    (None, None) => return Err(Skip::AnonymousGlyph),
                }
            } else {
                self.font.name_for_code(code)
            };
            let suffix = self
                .settings
                .glyph_name_suffix
                .clone()
                .unwrap_or_else(|| format!(".{feature}"));
            name = Some(format!("{base}{suffix}"));
            code = -1;
            unicode = None;
            substitution = Some((base, feature));
        }

        let mut glyph = match (unicode, code, name) {
            (Some(unicode), -1, name) => {
                let name = name.unwrap_or_else(|| name_from_unicode(unicode));
                Glyph::new(&name, None, Some(unicode))
            }
            (None, -1, Some(name)) => Glyph::new(&name, None, None),
            (_, code, _) if code < 0 => return Err(Skip::AnonymousGlyph),
            (unicode, code, name) => {
                let slot_unicode = self.font.encoding.slot(code).1;
                let name = name.unwrap_or_else(|| self.font.name_for_code(code));
                Glyph::new(&name, Some(code), unicode.or(slot_unicode))
            }
        };
        if skip {
            debug!(code, glyph = %glyph.name, "glyph filtered out by code range");
            return Ok(());
        }

        glyph.outline = outline;
        if shipped.x_offset != 0 || shipped.y_offset != 0 {
            glyph
                .outline
                .apply_affine(Affine::translate((shipped.x_offset as f64, shipped.y_offset as f64)));
        }
        glyph.width = shipped.width;
        glyph.height = shipped.height;
        glyph.depth = shipped.depth;
        let italic_correction = if self.settings.set_italic_correction {
            shipped.italic_correction
        } else {
            0
        };
        glyph.italic_correction = italic_correction;
        let advance = shipped.width + italic_correction;

        if let Some(top_accent) = scratch.top_accent {
            glyph.top_accent = Some(top_accent);
            self.specified.top_accents.insert(glyph.name.clone());
        } else if self.settings.set_top_accent {
            glyph.top_accent = Some(round_units(advance as f64 / 2.0));
        }
        glyph.anchors = std::mem::take(&mut scratch.anchors);

        if let Some((base, feature)) = substitution {
            self.tables.replacements.push((base, feature, glyph.name.clone()));
        }
        self.apply_glyph_scratch(&mut glyph, scratch, advance);

        for rule in &mut self.tables.ligatures {
            if rule.result == LigatureResult::NextGlyph {
                rule.result = LigatureResult::Glyph(glyph.name.clone());
            }
        }

        if self.settings.ascent.is_none() && !self.specified.ascent {
            self.font.info.ascent = self.font.info.ascent.max(glyph.height);
        }
        if self.settings.descent.is_none() && !self.specified.descent {
            self.font.info.descent = self.font.info.descent.max(glyph.depth);
        }
        debug!(glyph = %glyph.name, code = ?glyph.code, contours = glyph.outline.len(), "shipped");
        self.font.upsert_glyph(glyph);
        Ok(())
    }

    /// Clean up the picture in place and return a copy of it
    fn shipped_outline(&mut self, name: &str) -> Result<Outline, Skip> {
        let geometry = self.settings.geometry;
        let outline = self.pictures.outline_mut(name)?;
        if self.settings.fix_contours {
            fix_contours(outline);
        }
        if self.settings.remove_artifacts {
            remove_artifacts(
                outline,
                geometry.artifact_point_threshold,
                geometry.artifact_distance_threshold,
            );
        }
        if self.settings.remove_collinear {
            remove_collinear(outline, geometry.collinear_distance_threshold);
        }
        if self.settings.cull_at_shipout {
            remove_overlap_scaled(&mut self.engine, outline, geometry.remove_overlap_scale, false);
        }
        Ok(outline.clone())
    }

    fn apply_glyph_scratch(&mut self, glyph: &mut Glyph, scratch: GlyphScratch, advance: i64) {
        glyph.comment = scratch.comment;
        glyph.build = scratch.build;
        glyph.ligature_carets = scratch.carets;
        glyph.post_process = scratch.post_process;

        for (referenced, transform) in &scratch.references {
            let referenced = unquote(referenced).unwrap_or(referenced.trim());
            let target = self
                .font
                .resolve_name(&CharRef::Text(referenced.to_string()), self.settings.generalized_code);
            match parse_transform(transform) {
                Ok(matrix) => self.tables.references.push((glyph.name.clone(), target, matrix)),
                Err(err) => warn!(glyph = %glyph.name, "reference to {target} ignored: {err}"),
            }
        }

        if glyph.post_process.add_extrema {
            for contour in &mut glyph.outline.contours {
                self.engine.add_extrema(contour);
            }
        }
        if glyph.post_process.round {
            round_outline(&mut glyph.outline);
        }

        for (kind, args) in &scratch.hints {
            if let Err(err) = add_hint(glyph, *kind, args) {
                warn!(glyph = %glyph.name, "hint ignored: {err}");
            }
        }

        for (corner, args) in &scratch.math_kerning {
            match math_kern(*corner, args, advance) {
                Ok(kern) => corner_kerns(&mut glyph.math_kerning, *corner).push(kern),
                Err(err) => warn!(glyph = %glyph.name, "math kerning ignored: {err}"),
            }
        }

        for replacement in scratch.replacements {
            let glyph_name = replacement.glyph.unwrap_or_else(|| glyph.name.clone());
            let replacement_name = replacement.replacement.unwrap_or_else(|| glyph.name.clone());
            self.tables
                .replacements
                .push((glyph_name, replacement.feature, replacement_name));
        }
    }
}

/// `(tx,ty,xx,xy,yx,yy)` as `[xx, xy, yx, yy, tx, ty]`
fn parse_transform(text: &str) -> Result<[f64; 6], OperandError> {
    let malformed = || OperandError::Pair(text.to_string());
    let inner = text
        .trim()
        .strip_prefix('(')
        .and_then(|t| t.strip_suffix(')'))
        .ok_or_else(malformed)?;
    let values = inner
        .split(',')
        .map(parse_number)
        .collect::<Result<Vec<f64>, _>>()?;
    let [tx, ty, xx, xy, yx, yy] = values[..] else {
        return Err(malformed());
    };
    Ok([xx, xy, yx, yy, tx, ty])
}

pub(super) fn round_outline(outline: &mut Outline) {
    for contour in &mut outline.contours {
        for point in &mut contour.points {
            point.x = point.x.round();
            point.y = point.y.round();
        }
    }
}

fn add_hint(glyph: &mut Glyph, kind: HintKind, args: &[String]) -> Result<(), OperandError> {
    match kind {
        HintKind::Horizontal | HintKind::Vertical => {
            let values = args
                .iter()
                .map(|a| parse_number(a))
                .collect::<Result<Vec<f64>, _>>()?;
            if values.is_empty() {
                return Err(OperandError::FieldCount { expected: 2, found: 0 });
            }
            let min = values.iter().copied().fold(f64::INFINITY, f64::min);
            let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
            let hint = (min, max - min);
            if kind == HintKind::Horizontal {
                glyph.hints.horizontal.push(hint);
            } else {
                glyph.hints.vertical.push(hint);
            }
        }
        HintKind::Diagonal => {
            if !(2..=3).contains(&args.len()) {
                return Err(OperandError::FieldCount {
                    expected: 2,
                    found: args.len(),
                });
            }
            let points = args
                .iter()
                .map(|a| parse_pair(a).map(|p| (round_digits(p.x, 6), round_digits(p.y, 6))))
                .collect::<Result<Vec<(f64, f64)>, _>>()?;
            let (start, end) = (points[0], points[1]);
            let (dx, dy) = points
                .get(2)
                .copied()
                .unwrap_or((end.1 - start.1, end.0 - start.0));
            let length = dx.hypot(dy);
            let direction = if length > 0.0 { (dx / length, dy / length) } else { (dx, dy) };
            glyph.hints.diagonal.push(DiagonalHint { start, end, direction });
        }
    }
    Ok(())
}

/// `(height, kern)`; kerns on the right are relative to the advance
fn math_kern(corner: Corner, args: &[String], advance: i64) -> Result<(i64, i64), OperandError> {
    let [x, y] = args else {
        return Err(OperandError::FieldCount {
            expected: 2,
            found: args.len(),
        });
    };
    let (x, y) = (parse_number(x)?, parse_number(y)?);
    let x = if corner.is_right() { x - advance as f64 } else { x };
    Ok((round_units(x), round_units(y)))
}

fn corner_kerns(kerning: &mut MathKerning, corner: Corner) -> &mut Vec<(i64, i64)> {
    match corner {
        Corner::TopRight => &mut kerning.top_right,
        Corner::TopLeft => &mut kerning.top_left,
        Corner::BottomRight => &mut kerning.bottom_right,
        Corner::BottomLeft => &mut kerning.bottom_left,
    }
}
