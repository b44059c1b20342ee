//! Pen strokes
//!
//! The pen's boundary path decides how a stroke is made. Eight joins are an
//! ellipse, a two-join cycle is a razor, anything else is used as a convex
//! polygon. Razors are built here since a pen without height can't be
//! stroked by the engine.

use super::Interpreter;
use crate::engine::{correct_direction_scaled, remove_overlap_scaled, EllipticalPen, OutlineEngine, StrokeOptions};
use crate::geometry::utilities::distance;
use crate::geometry::{Contour, Outline, PathSpec};
use crate::trace::{parse_path, OperandError};
use kurbo::{Affine, Point};
use tracing::warn;

/// Pens that leave no ink of their own
const SIMPLE_PENS: [&str; 2] = ["(0,0) .. cycle", "(0,0)..controls (0,0) and (0,0) ..cycle"];

#[derive(Debug, Clone, PartialEq)]
pub enum Pen {
    Null,
    Elliptical(EllipticalPen),
    /// A straight line pen of `width`, rotated by `angle` radians
    Razor { width: f64, angle: f64 },
    /// Closed polygon, already in the orientation the engine expects
    Polygon(Contour),
}

impl Pen {
    pub fn parse(text: &str) -> Result<Pen, OperandError> {
        let text = text.trim();
        if SIMPLE_PENS.contains(&text) {
            return Ok(Pen::Null);
        }
        let path = parse_path(text)?;
        if path.all_points().all(|p| p == path.start) {
            return Ok(Pen::Null);
        }
        Ok(Self::from_path(&path))
    }

    fn from_path(path: &PathSpec) -> Pen {
        let end = |i: usize| path.joins[i].end.unwrap_or(path.start);
        match path.joins.len() {
            8 => {
                let (p0, p1, p3, p5) = (path.start, end(1), end(3), end(5));
                Pen::Elliptical(EllipticalPen {
                    width: distance(p0, p3),
                    minor_width: distance(p1, p5),
                    angle: (p3.y - p0.y).atan2(p3.x - p0.x),
                })
            }
            2 if path.is_cyclic() => {
                let (z1, z2) = (path.start, end(0));
                let (dx, dy) = (z2.x - z1.x, z2.y - z1.y);
                let angle = if dx == 0.0 {
                    std::f64::consts::FRAC_PI_2
                } else {
                    (dy / dx).atan()
                };
                Pen::Razor {
                    width: distance(z1, z2),
                    angle,
                }
            }
            n => {
                let points: Vec<Point> = std::iter::once(path.start)
                    .chain(path.joins.iter().take(n.saturating_sub(1)).map(|j| j.end.unwrap_or(path.start)))
                    .collect();
                Pen::Polygon(Contour::polygon(&points).reversed())
            }
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Pen::Null)
    }
}

impl<E: OutlineEngine> Interpreter<E> {
    pub(super) fn stroke_options(&self, remove_internal: bool) -> StrokeOptions {
        StrokeOptions {
            remove_internal,
            simplify: self.settings.stroke_simplify,
            accuracy: self.settings.stroke_accuracy,
        }
    }

    /// Stroke `paths` with `pen`. Directions are corrected afterwards.
    pub(super) fn stroke(&mut self, paths: Outline, pen: &Pen, options: StrokeOptions) -> Outline {
        let mut stroked = match pen {
            Pen::Null => paths,
            Pen::Elliptical(ellipse) => match self.engine.stroke_elliptical(&paths, ellipse, &options) {
                Ok(stroked) => stroked,
                Err(err) => {
                    warn!("{err}; adding the path without a pen");
                    paths
                }
            },
            Pen::Razor { width, angle } => self.stroke_razor(&paths, *width, *angle),
            Pen::Polygon(polygon) => self.stroke_polygon(paths, polygon, &options),
        };
        correct_direction_scaled(
            &mut self.engine,
            &mut stroked,
            self.settings.geometry.correct_direction_scale,
        );
        stroked
    }

    fn stroke_polygon(&mut self, paths: Outline, polygon: &Contour, options: &StrokeOptions) -> Outline {
        let first = match self.engine.stroke_convex(&paths, polygon, options) {
            Ok(stroked) => return stroked,
            Err(err) => err,
        };
        match self.engine.stroke_convex(&paths, &polygon.reversed(), options) {
            Ok(stroked) => stroked,
            Err(second) => {
                warn!(
                    "pen can't be used here ({first}, reversed: {second}); \
                     adding the path without a pen, it may not be closed"
                );
                paths
            }
        }
    }

    /// Sweep a razor along every segment. Each segment becomes a closed
    /// band between its two offset copies; the bands of one contour are
    /// merged before the next contour is added.
    fn stroke_razor(&mut self, paths: &Outline, width: f64, angle: f64) -> Outline {
        let half = width / 2.0;
        let mut result = Outline::new();
        for contour in paths {
            let mut contour = contour.clone();
            // Horizontal razor, so extrema land where the band is widest
            contour.apply_affine(Affine::rotate(-angle));
            self.engine.add_extrema(&mut contour);

            let mut bands = Outline::new();
            let len = contour.len();
            let starts: Vec<usize> = contour
                .on_curve_indices()
                .into_iter()
                .filter(|&i| contour.closed || i + 1 < len)
                .collect();
            for start in starts {
                let Some(end) = (start + 1..start + 4)
                    .map(|j| j % len)
                    .find(|&j| contour.points[j].on_curve)
                else {
                    continue;
                };
                let segment = contour.wrapped_slice(start, end);
                let mut right = Contour::from_points(segment, false);
                let mut left = right.reversed();
                right.apply_affine(Affine::translate((half, 0.0)));
                left.apply_affine(Affine::translate((-half, 0.0)));
                right.append(&left);
                right.closed = true;
                if !right.is_clockwise() {
                    right.reverse();
                }
                bands.push(right);
            }
            remove_overlap_scaled(
                &mut self.engine,
                &mut bands,
                self.settings.geometry.remove_overlap_scale,
                false,
            );
            result.extend_from(&bands);
        }
        result.apply_affine(Affine::rotate(angle));
        result
    }
}
