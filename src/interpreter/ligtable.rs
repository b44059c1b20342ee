//! Font metric tables: `ligtable`, `charlist`, `extensible`, `fontdimen`
//! and `end`
//!
//! Ligtable steps arrive as one record per operator. A record's first field
//! is the operator's right operand; the character before the operator is
//! the last field of the record before it. A character's program runs from
//! its label to the next `skipto` or the end of the table, so labels stay
//! pending until then.

use super::{Charlist, Cursor, Extensible, ExtensiblePiece, Interpreter, KernPair, LigatureResult, LigatureRule};
use crate::core::errors::Skip;
use crate::engine::OutlineEngine;
use crate::font::names::normalize_encoding_name;
use crate::font::{CharRef, Glyph};
use crate::geometry::utilities::round_units;
use crate::trace::{parse_number, parse_truncated, Op, TraceRecord};
use tracing::warn;

/// `hppp>> value` bodies
fn scale_and_value(record: &TraceRecord) -> Result<(f64, &str), Skip> {
    let fields = record
        .exact_fields(2)
        .map_err(|e| Skip::malformed(&record.name, e))?;
    let hppp = parse_number(fields[0]).map_err(|e| Skip::malformed(&record.name, e))?;
    Ok((hppp, fields[1]))
}

fn char_ref(op: &str, text: &str) -> Result<CharRef, Skip> {
    CharRef::parse(text).map_err(|e| Skip::malformed(op, e))
}

impl<E: OutlineEngine> Interpreter<E> {
    pub(super) fn ligtable(&mut self, record: &TraceRecord, cursor: &mut Cursor<'_>) -> Result<(), Skip> {
        let (hppp, _) = scale_and_value(record)?;
        let mut previous = record;
        let mut pending: Vec<CharRef> = Vec::new();
        let mut kerns = Vec::new();
        let mut ligatures = Vec::new();
        let mut warned_skip = false;

        while let Some(step) = cursor.advance_if(|op| {
            matches!(
                op,
                Op::Label | Op::SkipLabel | Op::BoundaryLabel | Op::Kern | Op::Ligature(_) | Op::SkipTo
            )
        }) {
            let own = step.first_field();
            let last = previous.last_field();
            match &step.op {
                Op::Label => pending.push(char_ref(":", last)?),
                Op::SkipLabel => {
                    if let Some(labels) = self.tables.skiptos.get(last.trim()) {
                        pending.extend(labels.iter().cloned());
                    }
                }
                Op::BoundaryLabel => warn!("{}", Skip::UnsupportedLigtable("||:".to_string())),
                Op::Kern => {
                    let right = char_ref("kern", last)?;
                    let kern = parse_number(own).map_err(|e| Skip::malformed("kern", e))?;
                    let kern = (kern * hppp).trunc() as i64;
                    kerns.extend(pending.iter().map(|left| KernPair {
                        left: left.clone(),
                        right: right.clone(),
                        kern,
                    }));
                }
                Op::Ligature(shape) => {
                    if shape.skip > 0 && !warned_skip {
                        warn!("{}", Skip::UnsupportedLigtable(format!("`>` in {}", shape.spelling())));
                        warned_skip = true;
                    }
                    let right = char_ref(&step.name, last)?;
                    let result = char_ref(&step.name, own)?;
                    ligatures.extend(pending.iter().map(|left| LigatureRule {
                        result: LigatureResult::Char(result.clone()),
                        shape: *shape,
                        components: vec![left.clone(), right.clone()],
                        feature: self.tables.lig_feature.clone(),
                    }));
                }
                Op::SkipTo => {
                    // the pending labels continue at the matching `::` only
                    let label = if own.trim().is_empty() { last } else { own };
                    self.tables
                        .skiptos
                        .insert(label.trim().to_string(), std::mem::take(&mut pending));
                }
                _ => {}
            }
            previous = step;
        }

        self.tables.kerns.extend(kerns);
        self.tables.ligatures.extend(ligatures);
        Ok(())
    }

    /// `charlist <base>` followed by one `:` record per variant
    pub(super) fn charlist(&mut self, record: &TraceRecord, cursor: &mut Cursor<'_>) -> Result<(), Skip> {
        let base = char_ref("charlist", &record.body)?;
        let mut variants = Vec::new();
        while let Some(variant) = cursor.advance_if(|op| *op == Op::Label) {
            variants.push(char_ref("charlist", &variant.body)?);
        }
        if let Some(last) = variants.last() {
            self.tables.last_variants.push((last.clone(), base.clone()));
        }
        self.tables.charlists.push(Charlist { base, variants });
        Ok(())
    }

    /// `extensible <label>` followed by `top>> mid>> bot>> rep`
    pub(super) fn extensible(&mut self, record: &TraceRecord, cursor: &mut Cursor<'_>) -> Result<(), Skip> {
        let label = char_ref("extensible", &record.body)?;
        let recipe = cursor.expect("extensible")?;
        let fields = recipe
            .exact_fields(4)
            .map_err(|e| Skip::malformed("extensible", e))?;
        let [top, middle, bottom, repeat] = [fields[0], fields[1], fields[2], fields[3]]
            .map(|field| char_ref("extensible", field));
        let (top, middle, bottom, repeat) = (top?, middle?, bottom?, repeat?);

        // bottom to top, the repeater around the middle piece
        let piece = |glyph: &CharRef, extender| ExtensiblePiece {
            glyph: glyph.clone(),
            extender,
        };
        let mut pieces = Vec::new();
        if !bottom.is_zero() {
            pieces.push(piece(&bottom, false));
        }
        pieces.push(piece(&repeat, true));
        if !middle.is_zero() {
            pieces.push(piece(&middle, false));
            pieces.push(piece(&repeat, true));
        }
        if !top.is_zero() {
            pieces.push(piece(&top, false));
        }
        self.tables.extensibles.push(Extensible { label, pieces });
        Ok(())
    }

    /// `fontdimen hppp>> first` followed by the parameter values
    pub(super) fn fontdimen(&mut self, record: &TraceRecord, cursor: &mut Cursor<'_>) -> Result<(), Skip> {
        let (hppp, first) = scale_and_value(record)?;
        let first = parse_truncated(first).map_err(|e| Skip::malformed("fontdimen", e))?;
        let values = cursor.expect("fontdimen")?;
        let params = values
            .fields()
            .into_iter()
            .map(parse_number)
            .collect::<Result<Vec<f64>, _>>()
            .map_err(|e| Skip::malformed("fontdimen", e))?;
        let encoding = self
            .settings
            .input_encoding
            .as_deref()
            .map(normalize_encoding_name);

        for (k, value) in (first..).zip(params) {
            let scaled = round_units(value * hppp);
            match k {
                1 => {
                    self.font.info.italic_angle = if value == 0.0 {
                        0.0
                    } else {
                        -value.atan().to_degrees()
                    };
                }
                2 if self.settings.space_from_fontdimen => {
                    let mut space = Glyph::new("space", Some(32), Some(32));
                    if let Some(existing) = self.font.glyph("space") {
                        space = existing.clone();
                    }
                    space.width = scaled;
                    self.font.upsert_glyph(space);
                }
                5 => self.font.info.x_height = Some(scaled),
                _ => {}
            }
            let Ok(k) = u32::try_from(k) else {
                continue;
            };
            match encoding.as_deref() {
                Some("tex-math-symbols") if (5..=22).contains(&k) => {
                    self.sigma.insert(k, scaled);
                }
                Some("tex-math-extension") if (8..=13).contains(&k) => {
                    self.xi.insert(k, scaled);
                }
                _ => {}
            }
        }
        Ok(())
    }

    /// `end <design size>`
    pub(super) fn end(&mut self, record: &TraceRecord) -> Result<(), Skip> {
        let size = parse_number(&record.body).map_err(|e| Skip::malformed("end", e))?;
        if size != 0.0 {
            self.font.info.design_size = Some(size);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::Settings;
    use crate::interpreter::tests::{record, run_with};
    use crate::trace::LigatureOp;

    fn text(s: &str) -> CharRef {
        CharRef::Text(s.to_string())
    }

    #[test]
    fn test_kern_for_every_pending_label() {
        let interpreter = run_with(
            Settings::default(),
            &[
                record("ligtable", "10>> \"A\""),
                record(":", "\"V\""),
                record(":", "\"T\""),
                record("kern", "-1.29>> \"o\""),
                record("kern", "-0.5"),
            ],
        );
        assert_eq!(
            interpreter.tables.kerns,
            vec![
                KernPair { left: text("A"), right: text("T"), kern: -12 },
                KernPair { left: text("V"), right: text("T"), kern: -12 },
                KernPair { left: text("A"), right: text("o"), kern: -5 },
                KernPair { left: text("V"), right: text("o"), kern: -5 },
            ]
        );
    }

    #[test]
    fn test_ligature_shapes_and_feature() {
        let interpreter = run_with(
            Settings::default(),
            &[
                record("ligtable", "1>> \"f\""),
                record(":", "\"i\""),
                record("p=:", "\"fi\""),
            ],
        );
        let rule = &interpreter.tables.ligatures[0];
        assert_eq!(rule.result, LigatureResult::Char(text("fi")));
        assert_eq!(rule.components, vec![text("f"), text("i")]);
        assert_eq!(
            rule.shape,
            LigatureOp {
                left_pipe: true,
                right_pipe: false,
                skip: 0
            }
        );
        assert_eq!(rule.feature, "liga");
    }

    #[test]
    fn test_skipto_hands_labels_on() {
        let interpreter = run_with(
            Settings::default(),
            &[
                record("ligtable", "1>> \"a\""),
                record(":", "1"),
                record("skipto", "1>> \"b\""),
                record(":", "1"),
                record("::", "\"c\""),
                record("kern", "2"),
            ],
        );
        let lefts: Vec<&CharRef> = interpreter.tables.kerns.iter().map(|k| &k.left).collect();
        assert_eq!(lefts, vec![&text("b"), &text("a")]);
        assert!(interpreter.tables.kerns.iter().all(|k| k.right == text("c") && k.kern == 2));
    }

    #[test]
    fn test_skipto_ends_the_labels_program() {
        // "a": skipto 1; "b": "c" kern 1; 1:: "d" kern 2;
        let interpreter = run_with(
            Settings::default(),
            &[
                record("ligtable", "1>> \"a\""),
                record(":", "1"),
                record("skipto", "1>> \"b\""),
                record(":", "\"c\""),
                record("kern", "1>> 1"),
                record("::", "\"d\""),
                record("kern", "2"),
            ],
        );
        let kerns: Vec<(CharRef, CharRef, i64)> = interpreter
            .tables
            .kerns
            .iter()
            .map(|k| (k.left.clone(), k.right.clone(), k.kern))
            .collect();
        assert_eq!(
            kerns,
            vec![
                (text("b"), text("c"), 1),
                (text("b"), text("d"), 2),
                (text("a"), text("d"), 2),
            ]
        );
    }

    #[test]
    fn test_extensible_piece_order() {
        let interpreter = run_with(
            Settings::default(),
            &[
                record("extensible", "\"x\""),
                record("", "\"t\">> \"m\">> 0>> \"r\""),
                record("charlist", "\"p\""),
                record(":", "\"q\""),
                record(":", "\"x\""),
            ],
        );
        let recipe = &interpreter.tables.extensibles[0];
        let pieces: Vec<(CharRef, bool)> = recipe.pieces.iter().map(|p| (p.glyph.clone(), p.extender)).collect();
        assert_eq!(
            pieces,
            vec![(text("r"), true), (text("m"), false), (text("r"), true), (text("t"), false)]
        );
        assert_eq!(interpreter.tables.last_variants, vec![(text("x"), text("p"))]);
        assert_eq!(interpreter.tables.charlists[0].variants, vec![text("q"), text("x")]);
    }

    #[test]
    fn test_fontdimen_parameters() {
        let settings = Settings {
            input_encoding: Some("TeX math symbols".to_string()),
            ..Default::default()
        };
        let interpreter = run_with(
            settings,
            &[
                record("fontdimen", "100>> 1"),
                record("", "-0.25>> 3.33>> 0>> 0>> 4.3>> 7"),
                record("end", "10"),
            ],
        );
        let info = &interpreter.font().info;
        assert!((info.italic_angle - 14.036243467926479).abs() < 1e-9);
        assert_eq!(interpreter.font().glyph("space").map(|g| g.width), Some(333));
        assert_eq!(info.x_height, Some(430));
        assert_eq!(interpreter.sigma.get(&5), Some(&430));
        assert_eq!(interpreter.sigma.get(&6), Some(&700));
        assert_eq!(info.design_size, Some(10.0));
    }

    #[test]
    fn test_zero_slant_is_upright() {
        let interpreter = run_with(
            Settings::default(),
            &[record("fontdimen", "1>> 1"), record("", "0")],
        );
        assert_eq!(interpreter.font().info.italic_angle.to_bits(), 0.0f64.to_bits());
    }
}
