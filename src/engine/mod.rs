//! Outline engine seam
//!
//! The interpreter never does boolean path operations or stroking itself.
//! It asks an [`OutlineEngine`] for them, the same way a font editor hands
//! contours to a geometry backend. [`BasicEngine`] is the engine that ships
//! with the crate.

mod basic;
#[cfg(test)]
pub mod testing;

pub use basic::BasicEngine;

use crate::geometry::{Contour, Outline};
use kurbo::Affine;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum EngineError {
    #[error("the outline engine doesn't support {0}")]
    Unsupported(&'static str),
    #[error("the outline engine rejected the stroke: {0}")]
    Rejected(String),
}

/// An ellipse-shaped pen nib
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EllipticalPen {
    pub width: f64,
    pub minor_width: f64,
    /// Rotation of the major axis in radians
    pub angle: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct StrokeOptions {
    /// Keep only the inner contour of a closed clockwise stroke
    pub remove_internal: bool,
    pub simplify: bool,
    /// Engine default when `None`
    pub accuracy: Option<f64>,
}

/// Geometry primitives provided by an outline backend.
///
/// Orientation follows the font convention: outer boundaries run clockwise.
pub trait OutlineEngine {
    /// Merge overlapping contours into their union
    fn remove_overlap(&mut self, outline: &mut Outline);

    /// Orient every closed contour by its nesting depth. Contour order is
    /// preserved.
    fn correct_direction(&mut self, outline: &mut Outline);

    /// Replace the outline by the intersection of its contours
    fn intersect(&mut self, outline: &mut Outline);

    /// Insert on-curve points at the horizontal and vertical extrema
    fn add_extrema(&mut self, contour: &mut Contour);

    fn stroke_elliptical(
        &mut self,
        outline: &Outline,
        pen: &EllipticalPen,
        options: &StrokeOptions,
    ) -> Result<Outline, EngineError>;

    fn stroke_convex(
        &mut self,
        outline: &Outline,
        pen: &Contour,
        options: &StrokeOptions,
    ) -> Result<Outline, EngineError>;

    /// Canonical start points for every contour, then canonical contour order
    fn canonicalize(&mut self, outline: &mut Outline);

    /// Remove the on-curve point at `index`, joining its two segments
    fn merge_point(&mut self, contour: &mut Contour, index: usize);
}

/// Remove overlap with the outline scaled up by `scale`.
///
/// Small outlines lose points in overlap removal; working at a larger scale
/// avoids that. If the engine turns an all-closed outline into one with open
/// contours and `pairwise` is set, the contours are merged again one at a
/// time, starting from the original outline.
pub fn remove_overlap_scaled<E: OutlineEngine + ?Sized>(
    engine: &mut E,
    outline: &mut Outline,
    scale: f64,
    pairwise: bool,
) {
    let all_closed = outline.all_closed();
    if !all_closed {
        tracing::warn!("one or more contours are open, so removing overlap may not work");
    }
    let original = pairwise.then(|| outline.clone());
    scaled(outline, scale, |o| engine.remove_overlap(o));

    if let Some(original) = original {
        if all_closed && !outline.all_closed() {
            tracing::debug!("overlap removal opened contours, merging pairwise");
            let mut merged = Outline::new();
            for contour in original.contours {
                merged.push(contour);
                scaled(&mut merged, scale, |o| engine.remove_overlap(o));
            }
            *outline = merged;
        }
    }
}

/// Correct contour directions with the outline scaled up by `scale`
pub fn correct_direction_scaled<E: OutlineEngine + ?Sized>(engine: &mut E, outline: &mut Outline, scale: f64) {
    scaled(outline, scale, |o| engine.correct_direction(o));
}

fn scaled(outline: &mut Outline, scale: f64, op: impl FnOnce(&mut Outline)) {
    if scale == 0.0 || scale == 1.0 {
        op(outline);
        return;
    }
    outline.apply_affine(Affine::scale(scale));
    op(outline);
    outline.apply_affine(Affine::scale(1.0 / scale));
}
