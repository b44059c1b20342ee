//! Path specifications as printed by the compiler
//!
//! A path is a start point followed by cubic joins; the last join of a
//! cyclic path ends in `cycle` instead of a point.

use super::collinear::is_collinear;
use super::outline::{Contour, OutlinePoint};
use kurbo::Point;

/// One `..controls c1 and c2 ..end` join
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PathJoin {
    pub c1: Point,
    pub c2: Point,
    /// `None` when the join closes the path (`..cycle`)
    pub end: Option<Point>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PathSpec {
    pub start: Point,
    pub joins: Vec<PathJoin>,
}

impl PathSpec {
    pub fn is_cyclic(&self) -> bool {
        self.joins.last().is_some_and(|j| j.end.is_none())
    }

    /// Every point mentioned by the path, controls included
    pub fn all_points(&self) -> impl Iterator<Item = Point> + '_ {
        std::iter::once(self.start).chain(
            self.joins
                .iter()
                .flat_map(|j| [Some(j.c1), Some(j.c2), j.end].into_iter().flatten()),
        )
    }

    /// The same path traversed backwards
    pub fn reversed(&self) -> PathSpec {
        let n = self.joins.len();
        if n == 0 {
            return self.clone();
        }
        if self.is_cyclic() {
            // The start point stays put; the joins run backwards and each
            // new join ends where the previous original join ended.
            let joins = (0..n)
                .map(|k| {
                    let join = &self.joins[n - 1 - k];
                    PathJoin {
                        c1: join.c2,
                        c2: join.c1,
                        end: if k + 1 < n {
                            self.joins[n - 2 - k].end
                        } else {
                            None
                        },
                    }
                })
                .collect();
            PathSpec {
                start: self.start,
                joins,
            }
        } else {
            let ends: Vec<Point> = std::iter::once(self.start)
                .chain(self.joins.iter().filter_map(|j| j.end))
                .collect();
            let start = ends[ends.len() - 1];
            let joins = (0..n)
                .map(|k| {
                    let join = &self.joins[n - 1 - k];
                    PathJoin {
                        c1: join.c2,
                        c2: join.c1,
                        end: Some(ends[n - 1 - k]),
                    }
                })
                .collect();
            PathSpec { start, joins }
        }
    }

    /// Build a contour. With `make_lines`, joins whose controls lie on the
    /// chord within the given distance become straight lines.
    pub fn to_contour(&self, make_lines: Option<f64>) -> Contour {
        let mut contour = Contour::starting_at(self.start);
        for join in &self.joins {
            let end = join.end.unwrap_or(self.start);
            let last = contour
                .points
                .last()
                .map(OutlinePoint::pos)
                .unwrap_or(self.start);
            let straight = make_lines.is_some_and(|threshold| {
                let chord = [
                    OutlinePoint::on(last),
                    OutlinePoint::off(join.c1),
                    OutlinePoint::off(join.c2),
                    OutlinePoint::on(end),
                ];
                is_collinear(&chord, threshold)
            });
            if straight {
                contour.line_to(end);
            } else {
                contour.curve_to(join.c1, join.c2, end);
            }
            if join.end.is_none() {
                contour.close();
                break;
            }
        }
        contour
    }
}
