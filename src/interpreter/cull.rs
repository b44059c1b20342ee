//! `cull`
//!
//! A picture is a winding-number field; culling keeps or drops pixels by
//! their winding number. With contours instead of pixels only a few cases
//! can be expressed:
//!
//! - ranges that cover every possible positive (or negative) winding number
//! - `dropping (0, 0)`, which is overlap removal
//! - `keeping (a, b)` with `a >= 1`, the union of all `a`-fold intersections

use super::{picture_name, Cursor, Interpreter};
use crate::core::errors::Skip;
use crate::engine::{correct_direction_scaled, remove_overlap_scaled, OutlineEngine};
use crate::geometry::Outline;
use crate::trace::{parse_pair, parse_rounded, Op, TraceRecord};
use itertools::Itertools;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Keeping,
    Dropping,
}

impl Mode {
    fn as_str(&self) -> &'static str {
        match self {
            Mode::Keeping => "keeping",
            Mode::Dropping => "dropping",
        }
    }
}

impl<E: OutlineEngine> Interpreter<E> {
    pub(super) fn cull(&mut self, record: &TraceRecord, cursor: &mut Cursor<'_>) -> Result<(), Skip> {
        let name = picture_name(&record.body).to_string();
        let range = cursor.expect("cull")?;
        let mode = match range.op {
            Op::Keeping => Mode::Keeping,
            Op::Dropping => Mode::Dropping,
            _ => {
                return Err(Skip::UnknownOperation {
                    name: range.name.clone(),
                    body: range.body.clone(),
                })
            }
        };
        let pair = parse_pair(&range.body).map_err(|e| Skip::malformed(&range.name, e))?;
        let (a, b) = (pair.x.trunc() as i64, pair.y.trunc() as i64);
        let mut weight = 1;
        while let Some(option) = cursor.advance_if(|op| *op == Op::WithWeight) {
            weight = parse_rounded(&option.body).map_err(|e| Skip::malformed("withweight", e))?;
        }

        // A contour count bounds the winding number anywhere in the picture
        let count = self.pictures.get(&name)?.outline.len() as i64;
        let drop_positive =
            (mode == Mode::Dropping && a == 1 && b >= count) || (mode == Mode::Keeping && a <= -count && b == 0);
        let drop_negative =
            (mode == Mode::Dropping && -a >= count && b == 0) || (mode == Mode::Keeping && a == 1 && b >= count);

        if drop_positive || drop_negative {
            self.drop_by_sign(&name, drop_positive, drop_negative)
        } else if mode == Mode::Dropping && a == 0 && b == 0 {
            let scale = self.settings.geometry.remove_overlap_scale;
            let direction_scale = self.settings.geometry.correct_direction_scale;
            let outline = self.pictures.outline_mut(&name)?;
            remove_overlap_scaled(&mut self.engine, outline, scale, true);
            correct_direction_scaled(&mut self.engine, outline, direction_scale);
            Ok(())
        } else if mode == Mode::Keeping && a == 0 && b == 0 {
            Err(Skip::CullKeepingZero)
        } else if mode == Mode::Keeping && a >= 1 {
            self.keep_overlaps(&name, a as usize, weight)
        } else {
            Err(Skip::UnsupportedCull {
                mode: mode.as_str().to_string(),
                a,
                b,
            })
        }
    }

    /// Drop the contours whose direction flips (or doesn't) when directions
    /// are corrected, after overlaps are removed
    fn drop_by_sign(&mut self, name: &str, drop_positive: bool, drop_negative: bool) -> Result<(), Skip> {
        let scale = self.settings.geometry.remove_overlap_scale;
        let direction_scale = self.settings.geometry.correct_direction_scale;
        let outline = self.pictures.outline_mut(name)?;
        remove_overlap_scaled(&mut self.engine, outline, scale, true);
        let mut corrected = outline.clone();
        correct_direction_scaled(&mut self.engine, &mut corrected, direction_scale);

        let kept: Outline = outline
            .iter()
            .zip(corrected.iter())
            .filter(|(contour, fixed)| {
                let same = contour.is_clockwise() == fixed.is_clockwise();
                !(drop_positive && same || drop_negative && !same)
            })
            .map(|(contour, _)| contour.clone())
            .collect();
        *outline = kept;
        Ok(())
    }

    /// Union of the intersections of every `depth` contours, repeated
    /// `|weight|` times
    fn keep_overlaps(&mut self, name: &str, depth: usize, weight: i64) -> Result<(), Skip> {
        let contours = self.pictures.get(name)?.outline.contours.clone();
        let mut kept = Outline::new();
        for combination in contours.into_iter().combinations(depth) {
            let mut common = Outline::new();
            for (k, contour) in combination.into_iter().enumerate() {
                common.push(contour);
                if k != 0 {
                    self.engine.intersect(&mut common);
                }
            }
            kept.extend_from(&common);
        }
        self.engine.remove_overlap(&mut kept);
        if weight < 0 {
            kept.reverse_all();
        }

        let copies = weight.unsigned_abs() as usize;
        let outline = self.pictures.outline_mut(name)?;
        *outline = (0..copies).flat_map(|_| kept.contours.iter().cloned()).collect();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::Settings;
    use crate::engine::testing::{rect_contour, RecordingEngine};
    use crate::interpreter::tests::{assert_bbox, record};
    use kurbo::Rect;

    fn with_picture(contours: &[(Rect, bool)]) -> Interpreter<RecordingEngine> {
        let mut interpreter = Interpreter::new(Settings::default(), RecordingEngine::new());
        interpreter.pictures.declare("p");
        let outline = interpreter.pictures.outline_mut("p").unwrap();
        for (rect, clockwise) in contours {
            let contour = rect_contour(*rect);
            outline.push(if *clockwise { contour } else { contour.reversed() });
        }
        interpreter
    }

    fn cull(interpreter: &mut Interpreter<RecordingEngine>, records: &[TraceRecord]) -> Result<(), Skip> {
        let mut cursor = Cursor::new(records);
        interpreter.cull(&record("cull", "\"p\""), &mut cursor)
    }

    fn outline(interpreter: &Interpreter<RecordingEngine>) -> &Outline {
        &interpreter.pictures().get("p").unwrap().outline
    }

    #[test]
    fn test_dropping_negative_keeps_clockwise_union() {
        let mut interpreter = with_picture(&[
            (Rect::new(0.0, 0.0, 10.0, 10.0), true),
            (Rect::new(5.0, 0.0, 15.0, 10.0), true),
        ]);
        cull(&mut interpreter, &[record("dropping", "(-4095.99998,0)")]).unwrap();
        let p = outline(&interpreter);
        assert_eq!(p.len(), 1);
        assert!(p.contours[0].is_clockwise());
        assert_bbox(p, (0.0, 0.0, 15.0, 10.0));
    }

    #[test]
    fn test_dropping_positive_drops_clockwise() {
        let mut interpreter = with_picture(&[(Rect::new(0.0, 0.0, 10.0, 10.0), true)]);
        cull(&mut interpreter, &[record("dropping", "(1,4095.99998)")]).unwrap();
        assert!(outline(&interpreter).is_empty());
    }

    #[test]
    fn test_dropping_zero_removes_overlap() {
        let mut interpreter = with_picture(&[
            (Rect::new(0.0, 0.0, 10.0, 10.0), true),
            (Rect::new(20.0, 0.0, 30.0, 10.0), false),
        ]);
        cull(&mut interpreter, &[record("dropping", "(0,0)")]).unwrap();
        assert_eq!(interpreter.engine().count("remove_overlap"), 1);
        assert_eq!(interpreter.engine().count("correct_direction"), 1);
        assert_eq!(outline(&interpreter).len(), 1);
    }

    #[test]
    fn test_keeping_overlaps_with_weight() {
        let mut interpreter = with_picture(&[
            (Rect::new(0.0, 0.0, 10.0, 10.0), true),
            (Rect::new(5.0, 0.0, 15.0, 10.0), true),
            (Rect::new(100.0, 0.0, 110.0, 10.0), true),
        ]);
        cull(
            &mut interpreter,
            &[record("keeping", "(2,4095.99998)"), record("withweight", "-2")],
        )
        .unwrap();
        let p = outline(&interpreter);
        assert_eq!(p.len(), 2);
        assert!(p.iter().all(|c| !c.is_clockwise()));
        assert_bbox(p, (5.0, 0.0, 10.0, 10.0));
        assert_eq!(interpreter.engine().count("intersect"), 3);
    }

    #[test]
    fn test_unsupported_ranges() {
        let mut interpreter = with_picture(&[(Rect::new(0.0, 0.0, 10.0, 10.0), true)]);
        assert_eq!(
            cull(&mut interpreter, &[record("keeping", "(0,0)")]),
            Err(Skip::CullKeepingZero)
        );
        assert_eq!(
            cull(&mut interpreter, &[record("dropping", "(2,3)")]),
            Err(Skip::UnsupportedCull {
                mode: "dropping".to_string(),
                a: 2,
                b: 3
            })
        );
    }

    #[test]
    fn test_keeping_from_negative_bound_is_a_skip() {
        let mut interpreter = with_picture(&[(Rect::new(0.0, 0.0, 10.0, 10.0), true)]);
        assert_eq!(
            cull(&mut interpreter, &[record("keeping", "(-1,3)")]),
            Err(Skip::UnsupportedCull {
                mode: "keeping".to_string(),
                a: -1,
                b: 3
            })
        );
        assert_eq!(outline(&interpreter).len(), 1);
    }
}
