//! Geometry utility functions
//!
//! Shared helpers for the transforms and roundings used when trace values
//! are turned into outline coordinates and font units.

use kurbo::{Affine, Point};

/// Round to the nearest integer, the way box dimensions and code values are
/// rounded before they reach the font.
pub fn round_units(value: f64) -> i64 {
    value.round() as i64
}

/// Round to a fixed number of decimal digits
pub fn round_digits(value: f64, digits: i32) -> f64 {
    let factor = 10f64.powi(digits);
    (value * factor).round() / factor
}

/// `slanted s`: x' = x + s·y
pub fn slant(s: f64) -> Affine {
    Affine::skew(s, 0.0)
}

/// Rotation by an angle given in degrees
pub fn rotate_degrees(degrees: f64) -> Affine {
    Affine::rotate(degrees.to_radians())
}

/// Scale about the origin by the same factor on both axes
pub fn uniform_scale(s: f64) -> Affine {
    Affine::scale(s)
}

pub fn distance(a: Point, b: Point) -> f64 {
    (b - a).hypot()
}
