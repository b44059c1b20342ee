//! Built-in outline engine
//!
//! Covers what can be done without a boolean path library: direction
//! correction by nesting depth, extrema insertion, canonical ordering and
//! point merging. Overlap removal and intersection leave outlines as they
//! are; stroking is reported as unsupported so the interpreter falls back to
//! unstroked paths.

use super::{EllipticalPen, EngineError, OutlineEngine, StrokeOptions};
use crate::geometry::{Contour, Outline, OutlinePoint};
use kurbo::{BezPath, CubicBez, ParamCurve, ParamCurveExtrema, Point, Shape};
use std::cmp::Ordering;

const T_EPSILON: f64 = 1e-6;
const AREA_EPSILON: f64 = 1e-9;

#[derive(Debug, Clone, Default)]
pub struct BasicEngine;

impl BasicEngine {
    pub fn new() -> Self {
        Self
    }
}

impl OutlineEngine for BasicEngine {
    fn remove_overlap(&mut self, _outline: &mut Outline) {}

    fn correct_direction(&mut self, outline: &mut Outline) {
        let paths: Vec<Option<BezPath>> = outline
            .contours
            .iter()
            .map(|c| c.closed.then(|| c.to_bezpath()))
            .collect();

        for (i, contour) in outline.contours.iter_mut().enumerate() {
            if !contour.closed || contour.signed_area().abs() < AREA_EPSILON {
                continue;
            }
            let Some(probe) = contour.points.iter().find(|p| p.on_curve).map(OutlinePoint::pos) else {
                continue;
            };
            let depth = paths
                .iter()
                .enumerate()
                .filter(|(j, path)| *j != i && path.as_ref().is_some_and(|p| p.winding(probe) != 0))
                .count();
            let outer = depth % 2 == 0;
            if contour.is_clockwise() != outer {
                contour.reverse();
            }
        }
    }

    fn intersect(&mut self, _outline: &mut Outline) {}

    fn add_extrema(&mut self, contour: &mut Contour) {
        let Some(start) = contour.points.iter().position(|p| p.on_curve) else {
            return;
        };
        if contour.closed {
            contour.make_first(start);
        } else if start != 0 {
            return;
        }

        let n = contour.len();
        let points = &contour.points;
        let mut out = vec![points[0]];
        let mut previous = points[0].pos();
        let mut controls: Vec<Point> = Vec::new();
        let total = if contour.closed { n + 1 } else { n };
        for k in 1..total {
            let point = points[k % n];
            if !point.on_curve {
                controls.push(point.pos());
                continue;
            }
            if let [c1, c2] = controls[..] {
                split_at_extrema(&mut out, CubicBez::new(previous, c1, c2, point.pos()));
            } else {
                out.extend(controls.iter().copied().map(OutlinePoint::off));
                out.push(point);
            }
            controls.clear();
            previous = point.pos();
        }
        if contour.closed {
            out.pop();
            out.extend(controls.iter().copied().map(OutlinePoint::off));
        }
        contour.points = out;
    }

    fn stroke_elliptical(
        &mut self,
        _outline: &Outline,
        _pen: &EllipticalPen,
        _options: &StrokeOptions,
    ) -> Result<Outline, EngineError> {
        Err(EngineError::Unsupported("elliptical pens"))
    }

    fn stroke_convex(
        &mut self,
        _outline: &Outline,
        _pen: &Contour,
        _options: &StrokeOptions,
    ) -> Result<Outline, EngineError> {
        Err(EngineError::Unsupported("polygonal pens"))
    }

    fn canonicalize(&mut self, outline: &mut Outline) {
        for contour in outline.contours.iter_mut().filter(|c| c.closed) {
            let first = contour
                .points
                .iter()
                .enumerate()
                .filter(|(_, p)| p.on_curve)
                .min_by(|(_, a), (_, b)| compare_points(a, b))
                .map(|(i, _)| i);
            if let Some(index) = first {
                contour.make_first(index);
            }
        }
        outline.contours.sort_by(|a, b| match (a.points.first(), b.points.first()) {
            (Some(a), Some(b)) => compare_points(a, b),
            (None, Some(_)) => Ordering::Greater,
            (Some(_), None) => Ordering::Less,
            (None, None) => Ordering::Equal,
        });
    }

    fn merge_point(&mut self, contour: &mut Contour, index: usize) {
        let n = contour.len();
        if index >= n || !contour.points[index].on_curve || contour.on_curve_count() < 2 {
            return;
        }
        let wraps = contour.closed;
        let step = |i: usize, forward: bool| -> Option<usize> {
            match (forward, wraps) {
                (true, true) => Some((i + 1) % n),
                (false, true) => Some((i + n - 1) % n),
                (true, false) => (i + 1 < n).then_some(i + 1),
                (false, false) => i.checked_sub(1),
            }
        };

        let mut before = Vec::new();
        let mut cursor = step(index, false);
        while let Some(i) = cursor.filter(|&i| i != index && !contour.points[i].on_curve) {
            before.push(i);
            cursor = step(i, false);
        }
        let mut after = Vec::new();
        let mut cursor = step(index, true);
        while let Some(i) = cursor.filter(|&i| i != index && !contour.points[i].on_curve) {
            after.push(i);
            cursor = step(i, true);
        }

        let mut remove = vec![index];
        if before.len() == 2 && after.len() == 2 {
            // Keep the outer handles so the joined segment stays a cubic.
            remove.push(before[0]);
            remove.push(after[0]);
        } else {
            remove.extend(before);
            remove.extend(after);
        }
        let mut i = 0;
        contour.points.retain(|_| {
            let keep = !remove.contains(&i);
            i += 1;
            keep
        });
        if contour.closed {
            if let Some(start) = contour.points.iter().position(|p| p.on_curve) {
                contour.make_first(start);
            }
        }
    }
}

fn compare_points(a: &OutlinePoint, b: &OutlinePoint) -> Ordering {
    a.x.total_cmp(&b.x).then(a.y.total_cmp(&b.y))
}

fn split_at_extrema(out: &mut Vec<OutlinePoint>, cubic: CubicBez) {
    let mut params: Vec<f64> = cubic
        .extrema()
        .into_iter()
        .filter(|t| *t > T_EPSILON && *t < 1.0 - T_EPSILON)
        .collect();
    params.sort_by(f64::total_cmp);
    params.dedup_by(|a, b| (*a - *b).abs() < T_EPSILON);

    let mut t0 = 0.0;
    for t in params.into_iter().chain(std::iter::once(1.0)) {
        let piece = cubic.subsegment(t0..t);
        out.push(OutlinePoint::off(piece.p1));
        out.push(OutlinePoint::off(piece.p2));
        out.push(OutlinePoint::on(piece.p3));
        t0 = t;
    }
}
