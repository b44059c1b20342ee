//! UFO format conversion
//!
//! Turns the font model into norad's UFO types. Outlines keep their point
//! order; point types are derived from the off-curve points in front of
//! each on-curve point.

use crate::font::{Anchor, FontInfo, FontModel, Glyph, Reference};
use crate::geometry::{Contour, OutlinePoint};
use norad::fontinfo::NonNegativeIntegerOrFloat;
use norad::{AffineTransform, Font, Name, PointType};
use tracing::warn;

/// UFO type of the point at `index`; closed contours wrap around
fn point_type(contour: &Contour, index: usize) -> PointType {
    let point = contour.points[index];
    if !point.on_curve {
        return PointType::OffCurve;
    }
    if index == 0 && !contour.closed {
        return PointType::Move;
    }
    let previous = if index == 0 {
        contour.points.len() - 1
    } else {
        index - 1
    };
    if contour.points[previous].on_curve || contour.points.len() == 1 {
        PointType::Line
    } else {
        PointType::Curve
    }
}

fn to_norad_point(point: &OutlinePoint, typ: PointType) -> norad::ContourPoint {
    norad::ContourPoint::new(point.x, point.y, typ, false, None, None)
}

pub fn to_norad_contour(contour: &Contour) -> norad::Contour {
    let points = contour
        .points
        .iter()
        .enumerate()
        .map(|(i, point)| to_norad_point(point, point_type(contour, i)))
        .collect();
    norad::Contour::new(points, None)
}

fn to_norad_component(reference: &Reference) -> Option<norad::Component> {
    let base = match Name::new(&reference.glyph) {
        Ok(name) => name,
        Err(e) => {
            warn!("reference to invalid glyph name {:?} dropped: {e}", reference.glyph);
            return None;
        }
    };
    let [xx, xy, yx, yy, tx, ty] = reference.transform;
    let transform = AffineTransform {
        x_scale: xx,
        xy_scale: xy,
        yx_scale: yx,
        y_scale: yy,
        x_offset: tx,
        y_offset: ty,
    };
    Some(norad::Component::new(base, transform, None))
}

/// Mark anchors carry the class with a leading underscore
fn to_norad_anchor(anchor: &Anchor) -> Option<norad::Anchor> {
    let name = if anchor.point_type == "mark" {
        format!("_{}", anchor.class)
    } else {
        anchor.class.clone()
    };
    match Name::new(&name) {
        Ok(name) => Some(norad::Anchor::new(anchor.x, anchor.y, Some(name), None, None)),
        Err(e) => {
            warn!("anchor {name:?} dropped: {e}");
            None
        }
    }
}

/// Convert one glyph; `None` when its name isn't a valid UFO glyph name
pub fn to_norad_glyph(glyph: &Glyph) -> Option<norad::Glyph> {
    let name = match Name::new(&glyph.name) {
        Ok(name) => name,
        Err(e) => {
            warn!("glyph {:?} left out of the UFO: {e}", glyph.name);
            return None;
        }
    };
    let mut ufo_glyph = norad::Glyph::new(name.as_str());
    ufo_glyph.width = glyph.width as f64;

    if let Some(unicode) = glyph.unicode.and_then(char::from_u32) {
        ufo_glyph.codepoints.insert(unicode);
    }

    ufo_glyph.contours = glyph
        .outline
        .iter()
        .filter(|contour| !contour.is_empty())
        .map(to_norad_contour)
        .collect();
    ufo_glyph.components = glyph.references.iter().filter_map(to_norad_component).collect();
    ufo_glyph.anchors = glyph.anchors.iter().filter_map(to_norad_anchor).collect();
    ufo_glyph.note = glyph.comment.clone();

    Some(ufo_glyph)
}

/// `"001.002"` as `(1, 2)`
fn version_numbers(version: &str) -> Option<(i32, u32)> {
    let (major, minor) = version.trim().split_once('.')?;
    Some((major.parse().ok()?, minor.parse().ok()?))
}

pub fn to_norad_font_info(info: &FontInfo) -> norad::FontInfo {
    let mut ufo_info = norad::FontInfo::default();

    if !info.family_name.is_empty() {
        ufo_info.family_name = Some(info.family_name.clone());
    }
    if !info.weight.is_empty() {
        ufo_info.style_name = Some(info.weight.clone());
        ufo_info.postscript_weight_name = Some(info.weight.clone());
    }
    ufo_info.postscript_font_name = Some(info.font_name.clone());
    ufo_info.postscript_full_name = Some(info.full_name.clone());
    if let Some((major, minor)) = version_numbers(&info.version) {
        ufo_info.version_major = Some(major);
        ufo_info.version_minor = Some(minor);
    }
    if !info.copyright.is_empty() {
        ufo_info.copyright = Some(info.copyright.clone());
    }
    if !info.comment.is_empty() {
        ufo_info.note = Some(info.comment.clone());
    }

    if let Some(upm) = info.units_per_em.and_then(|upm| NonNegativeIntegerOrFloat::new(f64::from(upm))) {
        ufo_info.units_per_em = Some(upm);
    }
    ufo_info.ascender = Some(info.ascent as f64);
    ufo_info.descender = Some(-(info.descent as f64));
    ufo_info.x_height = info.x_height.map(|v| v as f64);
    ufo_info.cap_height = info.cap_height.map(|v| v as f64);
    ufo_info.italic_angle = Some(info.italic_angle);
    ufo_info.postscript_underline_position = info.underline_position.map(|v| v as f64);
    ufo_info.postscript_underline_thickness = info.underline_width.map(|v| v as f64);
    ufo_info
}

/// The whole font as a UFO with a single default layer
pub fn to_norad_font(model: &FontModel) -> Font {
    let mut font = Font::new();
    font.font_info = to_norad_font_info(&model.info);

    let layer = font.default_layer_mut();
    for glyph in model.glyphs.iter().filter_map(to_norad_glyph) {
        layer.insert_glyph(glyph);
    }
    font
}
