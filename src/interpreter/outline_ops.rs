//! Outline extension: contour order, start points and named points
//!
//! Every record starts with the picture it works on. Named points refer to
//! on-curve points by position and are looked up again on every use, so an
//! edit that moves points can leave a name pointing somewhere else.

use super::{picture_name, Interpreter};
use crate::core::errors::Skip;
use crate::engine::OutlineEngine;
use crate::geometry::Contour;
use crate::trace::{parse_number, parse_pair, unquote, OperandError, OutlineCommand, TraceRecord};
use std::cmp::Ordering;
use tracing::warn;

fn operands<'r, const N: usize>(record: &TraceRecord, args: &[&'r str]) -> Result<[&'r str; N], Skip> {
    <[&str; N]>::try_from(args).map_err(|_| Skip::ArgumentCount {
        op: record.name.clone(),
        expected: N + 1,
        given: args.len() + 1,
    })
}

fn point_name(text: &str) -> String {
    unquote(text).unwrap_or(text.trim()).to_string()
}

fn index(record: &TraceRecord, text: &str) -> Result<usize, Skip> {
    text.trim()
        .parse()
        .map_err(|_| Skip::malformed(&record.name, OperandError::Number(text.to_string())))
}

/// Index and distance of the on-curve point that comes first in direction
/// `(sin, cos)`; ties go to the point nearer the baseline, then to the left
fn first_in_direction(contour: &Contour, sin: f64, cos: f64) -> Option<(usize, f64)> {
    contour
        .points
        .iter()
        .enumerate()
        .filter(|(_, p)| p.on_curve)
        .map(|(i, p)| (i, sin * p.x + cos * p.y, p))
        .min_by(|a, b| {
            a.1.total_cmp(&b.1)
                .then(a.2.y.abs().total_cmp(&b.2.y.abs()))
                .then(a.2.x.total_cmp(&b.2.x))
        })
        .map(|(i, distance, _)| (i, distance))
}

impl<E: OutlineEngine> Interpreter<E> {
    pub(super) fn outline_command(&mut self, command: OutlineCommand, record: &TraceRecord) -> Result<(), Skip> {
        let fields = record.fields();
        let name = picture_name(fields[0]).to_string();
        let args = &fields[1..];

        match command {
            OutlineCommand::SortCanonical => {
                let outline = self.pictures.outline_mut(&name)?;
                self.engine.canonicalize(outline);
            }
            OutlineCommand::SortDir => {
                let [degrees] = operands(record, args)?;
                let degrees = parse_number(degrees).map_err(|e| Skip::malformed(&record.name, e))?;
                let (sin, cos) = degrees.to_radians().sin_cos();
                let outline = self.pictures.outline_mut(&name)?;
                let mut keyed: Vec<(Option<f64>, Contour)> = std::mem::take(&mut outline.contours)
                    .into_iter()
                    .map(|mut contour| {
                        let first = first_in_direction(&contour, sin, cos);
                        if let Some((i, _)) = first {
                            contour.make_first(i);
                        }
                        (first.map(|(_, distance)| distance), contour)
                    })
                    .collect();
                // contours without an on-curve point go last
                keyed.sort_by(|a, b| match (a.0, b.0) {
                    (Some(a), Some(b)) => a.total_cmp(&b),
                    (Some(_), None) => Ordering::Less,
                    (None, Some(_)) => Ordering::Greater,
                    (None, None) => Ordering::Equal,
                });
                outline.contours = keyed.into_iter().map(|(_, contour)| contour).collect();
            }
            OutlineCommand::NameByCoords => {
                let [coords, radius, point] = operands(record, args)?;
                let malformed = |e| Skip::malformed(&record.name, e);
                let target = parse_pair(coords).map_err(malformed)?;
                let radius = parse_number(radius).map_err(malformed)?;
                let point = point_name(point);
                let picture = self.pictures.get_mut(&name)?;

                let mut best: Option<(f64, usize, usize)> = None;
                for (c, contour) in picture.outline.iter().enumerate() {
                    for (k, p) in contour.points.iter().filter(|p| p.on_curve).enumerate() {
                        let distance = p.pos().distance(target);
                        if distance <= radius && best.map_or(true, |(d, _, _)| distance < d) {
                            best = Some((distance, c, k));
                        }
                    }
                }
                match best {
                    Some((_, c, k)) => {
                        picture.named_points.insert(point, (c, k));
                    }
                    None => warn!("no point found at ({}, {}) to name \"{point}\"", target.x, target.y),
                }
            }
            OutlineCommand::NameByIndex => {
                let [c, k, point] = operands(record, args)?;
                let (c, k) = (index(record, c)?, index(record, k)?);
                let point = point_name(point);
                let picture = self.pictures.get_mut(&name)?;
                let exists = picture
                    .outline
                    .contours
                    .get(c)
                    .is_some_and(|contour| k < contour.on_curve_count());
                if exists {
                    picture.named_points.insert(point, (c, k));
                } else {
                    warn!("no point found on contour {c} at index {k} to name \"{point}\"");
                }
            }
            OutlineCommand::MakeFirst | OutlineCommand::Delete => {
                let [point] = operands(record, args)?;
                let point = point_name(point);
                let picture = self.pictures.get_mut(&name)?;
                let Some(&(c, k)) = picture.named_points.get(&point) else {
                    warn!("no point named \"{point}\"");
                    return Ok(());
                };
                let Some((contour, i)) = picture
                    .outline
                    .contours
                    .get_mut(c)
                    .and_then(|contour| contour.on_curve_index(k).map(|i| (contour, i)))
                else {
                    warn!("point \"{point}\" cannot be found");
                    return Ok(());
                };
                if command == OutlineCommand::MakeFirst {
                    contour.make_first(i);
                } else {
                    self.engine.merge_point(contour, i);
                }
            }
            OutlineCommand::MakeFirstContour | OutlineCommand::DeleteContour => {
                let [point] = operands(record, args)?;
                let point = point_name(point);
                let picture = self.pictures.get_mut(&name)?;
                let Some(&(c, _)) = picture.named_points.get(&point) else {
                    warn!("no point named \"{point}\"");
                    return Ok(());
                };
                let contours = &mut picture.outline.contours;
                if c >= contours.len() {
                    warn!("contour of point \"{point}\" cannot be found");
                    return Ok(());
                }
                let contour = contours.remove(c);
                if command == OutlineCommand::MakeFirstContour {
                    contours.insert(0, contour);
                }
            }
        }
        Ok(())
    }
}
