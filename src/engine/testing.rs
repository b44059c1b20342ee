//! Scripted engine for tests
//!
//! Overlap removal collapses all closed contours into their bounding box,
//! strokes return the path's bounding box grown by the pen, and every call
//! is recorded by name.

use super::{BasicEngine, EllipticalPen, EngineError, OutlineEngine, StrokeOptions};
use crate::geometry::{Contour, Outline};
use kurbo::{Point, Rect};

#[derive(Debug, Default)]
pub struct RecordingEngine {
    pub calls: Vec<&'static str>,
    /// Number of upcoming convex strokes that fail
    pub failing_convex_strokes: usize,
    basic: BasicEngine,
}

impl RecordingEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn count(&self, call: &str) -> usize {
        self.calls.iter().filter(|c| **c == call).count()
    }
}

/// Clockwise rectangle
pub fn rect_contour(rect: Rect) -> Contour {
    Contour::polygon(&[
        Point::new(rect.x0, rect.y0),
        Point::new(rect.x0, rect.y1),
        Point::new(rect.x1, rect.y1),
        Point::new(rect.x1, rect.y0),
    ])
}

fn grown(outline: &Outline, dx: f64, dy: f64) -> Outline {
    outline
        .bounding_box()
        .map(|bbox| rect_contour(bbox.inflate(dx, dy)))
        .into_iter()
        .collect()
}

impl OutlineEngine for RecordingEngine {
    fn remove_overlap(&mut self, outline: &mut Outline) {
        self.calls.push("remove_overlap");
        let (closed, open): (Vec<Contour>, Vec<Contour>) =
            outline.contours.drain(..).partition(|c| c.closed);
        let union = closed
            .iter()
            .filter_map(Contour::bounding_box)
            .reduce(|a, b| a.union(b));
        outline.contours = union.map(rect_contour).into_iter().chain(open).collect();
    }

    fn correct_direction(&mut self, outline: &mut Outline) {
        self.calls.push("correct_direction");
        self.basic.correct_direction(outline);
    }

    fn intersect(&mut self, outline: &mut Outline) {
        self.calls.push("intersect");
        let common = outline
            .contours
            .iter()
            .filter_map(Contour::bounding_box)
            .reduce(|a, b| a.intersect(b));
        outline.contours = common
            .filter(|r| r.area() > 0.0)
            .map(rect_contour)
            .into_iter()
            .collect();
    }

    fn add_extrema(&mut self, contour: &mut Contour) {
        self.calls.push("add_extrema");
        self.basic.add_extrema(contour);
    }

    fn stroke_elliptical(
        &mut self,
        outline: &Outline,
        pen: &EllipticalPen,
        _options: &StrokeOptions,
    ) -> Result<Outline, EngineError> {
        self.calls.push("stroke_elliptical");
        Ok(grown(outline, pen.width / 2.0, pen.width / 2.0))
    }

    fn stroke_convex(
        &mut self,
        outline: &Outline,
        pen: &Contour,
        _options: &StrokeOptions,
    ) -> Result<Outline, EngineError> {
        self.calls.push("stroke_convex");
        if self.failing_convex_strokes > 0 {
            self.failing_convex_strokes -= 1;
            return Err(EngineError::Rejected("pen is not convex".to_string()));
        }
        let pen_box = pen.bounding_box().unwrap_or(Rect::ZERO);
        Ok(grown(outline, pen_box.width() / 2.0, pen_box.height() / 2.0))
    }

    fn canonicalize(&mut self, outline: &mut Outline) {
        self.calls.push("canonicalize");
        self.basic.canonicalize(outline);
    }

    fn merge_point(&mut self, contour: &mut Contour, index: usize) {
        self.calls.push("merge_point");
        self.basic.merge_point(contour, index);
    }
}
