//! `addto` and picture equations
//!
//! `addto <pic> also <pic>` copies a picture, optionally transformed.
//! `addto <pic> contour|doublepath <path> withpen .. withweight ..` fills or
//! strokes a path:
//!
//! - contour without pen: filled, oriented by turning number and weight
//! - doublepath without pen: no ink
//! - contour with pen: stroked, only the inside of the stroke kept
//! - doublepath with pen: stroked
//!
//! `addto <pic> also -<pic>` adds a picture with every contour reversed.
//!
//! Picture equations `a = b`, `a := -b` and chains like `a = b = c` copy
//! a picture with its named points. Sums are not evaluated.

use super::pen::Pen;
use super::{picture_name, Cursor, Interpreter};
use crate::core::errors::Skip;
use crate::engine::OutlineEngine;
use crate::geometry::utilities::{rotate_degrees, slant};
use crate::geometry::{Outline, PathSpec};
use crate::trace::{parse_number, parse_pair, parse_path, parse_rounded, parse_truncated, Op, TraceRecord, TransformKind};
use kurbo::{Affine, Vec2};

/// Sign information the compiler prints before a filled contour
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Turning {
    check: i64,
    number: i64,
}

impl<E: OutlineEngine> Interpreter<E> {
    pub(super) fn addto(&mut self, record: &TraceRecord, cursor: &mut Cursor<'_>) -> Result<(), Skip> {
        let target = picture_name(&record.body).to_string();
        let turning = match cursor.advance_if(|op| *op == Op::TurningCheck) {
            Some(check) => {
                let number = cursor.expect("turningcheck")?;
                Some(Turning {
                    check: parse_truncated(&check.body).map_err(|e| Skip::malformed("turningcheck", e))?,
                    number: parse_truncated(&number.body).map_err(|e| Skip::malformed("turningnumber", e))?,
                })
            }
            None => None,
        };
        let term = cursor.expect("addto")?;
        // `also -q` shows the negated picture as a `pic` record after `mi`
        let negated_source = match term.op {
            Op::Minus => cursor.advance_if(|op| *op == Op::Pic).map(|pic| picture_name(&pic.body)),
            _ => None,
        };

        // The last pen and the last weight win
        let mut pen_text = None;
        let mut weight = 1;
        while let Some(option) = cursor.advance_if(|op| matches!(op, Op::WithPen | Op::WithWeight)) {
            if option.op == Op::WithPen {
                pen_text = Some(option.body.as_str());
            } else {
                weight = parse_rounded(&option.body).map_err(|e| Skip::malformed("withweight", e))?;
            }
        }

        match term.op {
            Op::Also => {
                let source = picture_name(&term.body);
                let transform = read_transforms(cursor)?;
                self.pictures.accumulate_transformed(&target, source, transform, false)
            }
            Op::Minus => {
                let source = negated_source
                    .or_else(|| Some(picture_name(&term.body)).filter(|name| !name.is_empty()))
                    .ok_or(Skip::NegatedAddtoTerm)?;
                self.pictures.accumulate(&target, source, true)
            }
            Op::Contour | Op::Doublepath => {
                let path = parse_path(&term.body).map_err(|e| Skip::malformed(&term.name, e))?;
                let pen = match pen_text {
                    Some(text) => Pen::parse(text).map_err(|e| Skip::malformed("withpen", e))?,
                    None => Pen::Null,
                };
                self.add_path(&target, &path, term.op == Op::Contour, &pen, weight, turning)
            }
            _ => Err(Skip::UnknownOperation {
                name: term.name.clone(),
                body: term.body.clone(),
            }),
        }
    }

    fn add_path(
        &mut self,
        target: &str,
        path: &PathSpec,
        is_contour: bool,
        pen: &Pen,
        weight: i64,
        turning: Option<Turning>,
    ) -> Result<(), Skip> {
        // fail before any stroking is done
        self.pictures.get(target)?;
        let make_lines = self.settings.make_lines_threshold();
        let copies = weight.unsigned_abs() as usize;
        let repeated = |path: &PathSpec| -> Outline {
            (0..copies).map(|_| path.to_contour(make_lines)).collect()
        };

        match (is_contour, pen.is_null()) {
            (true, true) => {
                if let Some(reverse) = fill_reversed(weight, turning) {
                    let paths = if reverse { repeated(&path.reversed()) } else { repeated(path) };
                    self.pictures.append(target, &paths)?;
                }
                Ok(())
            }
            (false, true) => Ok(()),
            (true, false) => {
                let paths = repeated(&path.reversed());
                let stroked = self.stroke(paths, pen, self.stroke_options(true));
                self.pictures.append(target, &stroked)
            }
            (false, false) => {
                let paths = repeated(path);
                let stroked = self.stroke(paths, pen, self.stroke_options(false));
                self.pictures.append(target, &stroked)
            }
        }
    }

    /// `pic_eqn <lhs>` followed by `as`/`eq`, `mi`, `pl` and `pic` records
    pub(super) fn picture_equation(&mut self, record: &TraceRecord, cursor: &mut Cursor<'_>) -> Result<(), Skip> {
        let mut targets = vec![picture_name(record.first_field())];
        let mut rhs: Option<(bool, &str)> = None;
        let mut negate = false;
        let mut complex = false;
        while let Some(term) =
            cursor.advance_if(|op| matches!(op, Op::Pic | Op::Assign | Op::Equate | Op::Plus | Op::Minus))
        {
            match (&term.op, rhs) {
                // the `=` right after `pic_eqn`, or after a chained target
                (Op::Assign | Op::Equate, None) if !negate => {}
                (Op::Assign | Op::Equate, Some((false, name))) if !complex => {
                    targets.push(name);
                    rhs = None;
                }
                (Op::Assign | Op::Equate, _) => complex = true,
                (Op::Minus, None) => negate = !negate,
                (Op::Plus, None) => {}
                (Op::Pic, None) => {
                    rhs = Some((negate, picture_name(&term.body)));
                    negate = false;
                }
                _ => complex = true,
            }
        }

        let Some((negated, source)) = rhs else {
            return Err(Skip::EmptyPictureEquation);
        };
        for target in targets {
            if negated {
                self.pictures.negate_assign(target, source)?;
            } else {
                self.pictures.assign(target, source)?;
            }
        }
        if complex {
            return Err(Skip::ComplexPictureExpression);
        }
        Ok(())
    }
}

/// Whether a filled contour has to be reversed to come out clockwise, or
/// `None` if nothing is added. The compiler fills counter-clockwise, the
/// engine clockwise.
fn fill_reversed(weight: i64, turning: Option<Turning>) -> Option<bool> {
    match turning {
        Some(Turning { check, number }) if check > 0 => {
            if (weight > 0) == (number > 0) {
                Some(true)
            } else if (weight < 0) == (number > 0) {
                Some(false)
            } else {
                None
            }
        }
        _ => match weight {
            w if w > 0 => Some(true),
            w if w < 0 => Some(false),
            _ => None,
        },
    }
}

/// Transforms following `also`, composed in the order they appear
fn read_transforms(cursor: &mut Cursor<'_>) -> Result<Affine, Skip> {
    let mut transform = Affine::IDENTITY;
    while let Some(record) = cursor.advance_if(|op| matches!(op, Op::Transform(_))) {
        let Op::Transform(kind) = record.op else {
            continue;
        };
        let malformed = |e| Skip::malformed(&record.name, e);
        let step = match kind {
            TransformKind::Shifted => {
                let shift = parse_pair(&record.body).map_err(malformed)?;
                Affine::translate(Vec2::new(shift.x, shift.y))
            }
            _ => {
                let value = parse_number(&record.body).map_err(malformed)?;
                match kind {
                    TransformKind::Rotated => rotate_degrees(value),
                    TransformKind::Scaled => Affine::scale(value),
                    TransformKind::Slanted => slant(value),
                    TransformKind::XScaled => Affine::scale_non_uniform(value, 1.0),
                    TransformKind::YScaled => Affine::scale_non_uniform(1.0, value),
                    TransformKind::Shifted => Affine::IDENTITY,
                }
            }
        };
        transform = step * transform;
    }
    Ok(transform)
}
