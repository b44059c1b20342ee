//! Contours and outlines
//!
//! Contours use the point-list layout of the outline engine: a closed
//! contour never repeats its first point at the end, and the control points
//! of the closing segment trail after the last on-curve point.

use kurbo::{Affine, BezPath, Point, Rect, Shape};
use serde::{Deserialize, Serialize};

/// One point of a contour, either on the curve or a control point
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OutlinePoint {
    pub x: f64,
    pub y: f64,
    pub on_curve: bool,
}

impl OutlinePoint {
    pub fn on(p: Point) -> Self {
        Self {
            x: p.x,
            y: p.y,
            on_curve: true,
        }
    }

    pub fn off(p: Point) -> Self {
        Self {
            x: p.x,
            y: p.y,
            on_curve: false,
        }
    }

    pub fn pos(&self) -> Point {
        Point::new(self.x, self.y)
    }
}

/// An ordered point sequence describing one outline loop or an open path
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Contour {
    pub points: Vec<OutlinePoint>,
    pub closed: bool,
}

impl Contour {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a new open contour at `p`
    pub fn starting_at(p: Point) -> Self {
        Self {
            points: vec![OutlinePoint::on(p)],
            closed: false,
        }
    }

    pub fn from_points(points: Vec<OutlinePoint>, closed: bool) -> Self {
        Self { points, closed }
    }

    /// Closed polygon through the given on-curve points
    pub fn polygon(points: &[Point]) -> Self {
        Self {
            points: points.iter().copied().map(OutlinePoint::on).collect(),
            closed: true,
        }
    }

    pub fn line_to(&mut self, p: Point) {
        self.points.push(OutlinePoint::on(p));
    }

    pub fn curve_to(&mut self, c1: Point, c2: Point, p: Point) {
        self.points.push(OutlinePoint::off(c1));
        self.points.push(OutlinePoint::off(c2));
        self.points.push(OutlinePoint::on(p));
    }

    /// Mark the contour closed, dropping a final on-curve point that repeats
    /// the first one.
    pub fn close(&mut self) {
        if self.points.len() > 1 {
            let first = self.points[0];
            if let Some(last) = self.points.last() {
                if last.on_curve && first.on_curve && last.pos() == first.pos() {
                    self.points.pop();
                }
            }
        }
        self.closed = true;
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn on_curve_indices(&self) -> Vec<usize> {
        self.points
            .iter()
            .enumerate()
            .filter(|(_, p)| p.on_curve)
            .map(|(i, _)| i)
            .collect()
    }

    /// Index of the `n`-th on-curve point
    pub fn on_curve_index(&self, n: usize) -> Option<usize> {
        self.on_curve_indices().get(n).copied()
    }

    pub fn on_curve_count(&self) -> usize {
        self.points.iter().filter(|p| p.on_curve).count()
    }

    pub fn to_bezpath(&self) -> BezPath {
        self.build_bezpath(self.closed)
    }

    fn build_bezpath(&self, closed: bool) -> BezPath {
        let mut path = BezPath::new();
        let Some(start) = self.points.iter().position(|p| p.on_curve) else {
            return path;
        };
        let n = self.points.len();
        let first = self.points[start].pos();
        path.move_to(first);

        let mut pending: Vec<Point> = Vec::new();
        let count = if closed { n } else { n - start };
        for k in 1..count {
            let point = self.points[(start + k) % n];
            if !point.on_curve {
                pending.push(point.pos());
                continue;
            }
            push_segment(&mut path, &pending, point.pos());
            pending.clear();
        }
        if closed {
            if !pending.is_empty() {
                push_segment(&mut path, &pending, first);
            }
            path.close_path();
        }
        path
    }

    /// Signed area, positive for counter-clockwise contours (y up).
    /// Open contours are measured as if closed.
    pub fn signed_area(&self) -> f64 {
        self.build_bezpath(true).area()
    }

    pub fn is_clockwise(&self) -> bool {
        self.signed_area() < 0.0
    }

    /// Reverse the direction. Closed contours keep their first point.
    pub fn reverse(&mut self) {
        if self.closed {
            if self.points.len() > 1 {
                self.points[1..].reverse();
            }
        } else {
            self.points.reverse();
        }
    }

    pub fn reversed(&self) -> Self {
        let mut contour = self.clone();
        contour.reverse();
        contour
    }

    pub fn apply_affine(&mut self, transform: Affine) {
        for point in &mut self.points {
            let p = transform * point.pos();
            point.x = p.x;
            point.y = p.y;
        }
    }

    /// Rotate a closed contour so that `index` becomes its first point
    pub fn make_first(&mut self, index: usize) {
        if self.closed && index < self.points.len() {
            self.points.rotate_left(index);
        }
    }

    /// Points `start..=end`, wrapping past the end of a closed contour
    pub fn wrapped_slice(&self, start: usize, end: usize) -> Vec<OutlinePoint> {
        wrapped_slice(&self.points, start, end)
    }

    /// Remove points `start..=end`
    pub fn remove_range(&mut self, start: usize, end: usize) {
        if start <= end && end < self.points.len() {
            self.points.drain(start..=end);
        }
    }

    /// Append the points of `other`
    pub fn append(&mut self, other: &Contour) {
        self.points.extend_from_slice(&other.points);
    }

    pub fn bounding_box(&self) -> Option<Rect> {
        let mut points = self.points.iter().map(OutlinePoint::pos);
        let first = points.next()?;
        Some(points.fold(Rect::from_points(first, first), |rect, p| {
            rect.union_pt(p)
        }))
    }
}

fn push_segment(path: &mut BezPath, controls: &[Point], end: Point) {
    match controls {
        [] => path.line_to(end),
        [c] => path.quad_to(*c, end),
        [c1, .., c2] => path.curve_to(*c1, *c2, end),
    }
}

pub(crate) fn wrapped_slice(points: &[OutlinePoint], start: usize, end: usize) -> Vec<OutlinePoint> {
    let n = points.len();
    if n == 0 || start >= n {
        return Vec::new();
    }
    let end = end.min(n - 1);
    if start <= end {
        points[start..=end].to_vec()
    } else {
        let mut slice = points[start..].to_vec();
        slice.extend_from_slice(&points[..=end]);
        slice
    }
}

/// An ordered collection of contours
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Outline {
    pub contours: Vec<Contour>,
}

impl Outline {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.contours.len()
    }

    pub fn is_empty(&self) -> bool {
        self.contours.is_empty()
    }

    pub fn push(&mut self, contour: Contour) {
        self.contours.push(contour);
    }

    /// Append copies of all contours of `other`
    pub fn extend_from(&mut self, other: &Outline) {
        self.contours.extend(other.contours.iter().cloned());
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Contour> {
        self.contours.iter()
    }

    pub fn reverse_all(&mut self) {
        for contour in &mut self.contours {
            contour.reverse();
        }
    }

    /// Copy with every contour reversed
    pub fn reversed(&self) -> Self {
        let mut outline = self.clone();
        outline.reverse_all();
        outline
    }

    pub fn apply_affine(&mut self, transform: Affine) {
        for contour in &mut self.contours {
            contour.apply_affine(transform);
        }
    }

    pub fn all_closed(&self) -> bool {
        self.contours.iter().all(|c| c.closed)
    }

    pub fn bounding_box(&self) -> Option<Rect> {
        self.contours
            .iter()
            .filter_map(Contour::bounding_box)
            .reduce(|a, b| a.union(b))
    }
}

impl FromIterator<Contour> for Outline {
    fn from_iter<T: IntoIterator<Item = Contour>>(iter: T) -> Self {
        Self {
            contours: iter.into_iter().collect(),
        }
    }
}

impl<'a> IntoIterator for &'a Outline {
    type Item = &'a Contour;
    type IntoIter = std::slice::Iter<'a, Contour>;

    fn into_iter(self) -> Self::IntoIter {
        self.contours.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square(x0: f64, y0: f64, size: f64) -> Contour {
        Contour::polygon(&[
            Point::new(x0, y0),
            Point::new(x0 + size, y0),
            Point::new(x0 + size, y0 + size),
            Point::new(x0, y0 + size),
        ])
    }

    #[test]
    fn test_counter_clockwise_square_has_positive_area() {
        let contour = square(0.0, 0.0, 10.0);
        assert!((contour.signed_area() - 100.0).abs() < 1e-9);
        assert!(!contour.is_clockwise());
    }

    #[test]
    fn test_reverse_keeps_first_point_of_closed_contour() {
        let mut contour = Contour::starting_at(Point::new(0.0, 0.0));
        contour.curve_to(Point::new(1.0, 0.0), Point::new(2.0, 1.0), Point::new(2.0, 2.0));
        contour.curve_to(Point::new(2.0, 3.0), Point::new(0.0, 3.0), Point::new(0.0, 0.0));
        contour.close();
        assert_eq!(contour.len(), 6);

        let reversed = contour.reversed();
        assert_eq!(reversed.points[0], contour.points[0]);
        assert_eq!(reversed.points[1].pos(), Point::new(0.0, 3.0));
        assert_eq!(reversed.points[3].pos(), Point::new(2.0, 2.0));
        assert!(reversed.points[3].on_curve);
        assert_eq!(reversed.is_clockwise(), !contour.is_clockwise());
    }

    #[test]
    fn test_close_drops_repeated_start() {
        let mut contour = Contour::starting_at(Point::new(0.0, 0.0));
        contour.line_to(Point::new(10.0, 0.0));
        contour.line_to(Point::new(0.0, 10.0));
        contour.line_to(Point::new(0.0, 0.0));
        contour.close();
        assert_eq!(contour.len(), 3);
        assert!(contour.closed);
    }

    #[test]
    fn test_make_first_rotates_points() {
        let mut contour = square(0.0, 0.0, 10.0);
        contour.make_first(2);
        assert_eq!(contour.points[0].pos(), Point::new(10.0, 10.0));
        assert_eq!(contour.len(), 4);
    }

    #[test]
    fn test_wrapped_slice() {
        let contour = square(0.0, 0.0, 10.0);
        let slice = contour.wrapped_slice(3, 1);
        assert_eq!(slice.len(), 3);
        assert_eq!(slice[0].pos(), Point::new(0.0, 10.0));
        assert_eq!(slice[2].pos(), Point::new(10.0, 0.0));
    }

    #[test]
    fn test_outline_bounding_box() {
        let outline: Outline = vec![square(0.0, 0.0, 10.0), square(5.0, 5.0, 10.0)]
            .into_iter()
            .collect();
        let bbox = outline.bounding_box().unwrap();
        assert_eq!(bbox, Rect::new(0.0, 0.0, 15.0, 15.0));
    }
}
