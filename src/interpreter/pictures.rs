//! Picture variables
//!
//! Every picture the trace mentions lives here by name, together with the
//! points the outline extension gave names to. Named points are
//! `(contour, on-curve index)` pairs and are never updated when the
//! outline changes underneath them.

use crate::core::errors::Skip;
use crate::geometry::Outline;
use kurbo::Affine;
use std::collections::{BTreeMap, HashMap};

/// The picture every compiler run starts with
pub const NULL_PICTURE: &str = "nullpicture";

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Picture {
    pub outline: Outline,
    pub named_points: BTreeMap<String, (usize, usize)>,
}

#[derive(Debug, Clone)]
pub struct Pictures {
    pictures: HashMap<String, Picture>,
}

impl Default for Pictures {
    fn default() -> Self {
        Self::new()
    }
}

impl Pictures {
    pub fn new() -> Self {
        let mut pictures = HashMap::new();
        pictures.insert(NULL_PICTURE.to_string(), Picture::default());
        Self { pictures }
    }

    /// Create an empty picture, replacing any picture of the same name
    pub fn declare(&mut self, name: &str) {
        self.pictures.insert(name.to_string(), Picture::default());
    }

    pub fn contains(&self, name: &str) -> bool {
        self.pictures.contains_key(name)
    }

    pub fn get(&self, name: &str) -> Result<&Picture, Skip> {
        self.pictures
            .get(name)
            .ok_or_else(|| Skip::UnknownPicture(name.to_string()))
    }

    pub fn get_mut(&mut self, name: &str) -> Result<&mut Picture, Skip> {
        self.pictures
            .get_mut(name)
            .ok_or_else(|| Skip::UnknownPicture(name.to_string()))
    }

    pub fn outline_mut(&mut self, name: &str) -> Result<&mut Outline, Skip> {
        self.get_mut(name).map(|picture| &mut picture.outline)
    }

    /// `dst := src`
    pub fn assign(&mut self, dst: &str, src: &str) -> Result<(), Skip> {
        let source = self.get(src)?.clone();
        self.pictures.insert(dst.to_string(), source);
        Ok(())
    }

    /// `dst := -src`: every contour of `src` reversed
    pub fn negate_assign(&mut self, dst: &str, src: &str) -> Result<(), Skip> {
        let source = self.get(src)?;
        let negated = Picture {
            outline: source.outline.reversed(),
            named_points: source.named_points.clone(),
        };
        self.pictures.insert(dst.to_string(), negated);
        Ok(())
    }

    /// Append the contours of `src` to `dst`, reversed if asked to
    pub fn accumulate(&mut self, dst: &str, src: &str, reversed: bool) -> Result<(), Skip> {
        self.accumulate_transformed(dst, src, Affine::IDENTITY, reversed)
    }

    /// [`Pictures::accumulate`] with `src` transformed on the way. `src`
    /// itself is left alone, and `dst` may be `src`.
    pub fn accumulate_transformed(
        &mut self,
        dst: &str,
        src: &str,
        transform: Affine,
        reversed: bool,
    ) -> Result<(), Skip> {
        self.get(dst)?;
        let source = &self.get(src)?.outline;
        let mut contours = if reversed {
            source.reversed()
        } else {
            source.clone()
        };
        if transform != Affine::IDENTITY {
            contours.apply_affine(transform);
        }
        self.append(dst, &contours)
    }

    /// Append contours to `dst`
    pub fn append(&mut self, dst: &str, contours: &Outline) -> Result<(), Skip> {
        self.outline_mut(dst)?.extend_from(contours);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::testing::rect_contour;
    use kurbo::Rect;

    fn with_square() -> Pictures {
        let mut pictures = Pictures::new();
        pictures.declare("p");
        pictures
            .outline_mut("p")
            .unwrap()
            .push(rect_contour(Rect::new(0.0, 0.0, 10.0, 10.0)));
        pictures
            .get_mut("p")
            .unwrap()
            .named_points
            .insert("corner".to_string(), (0, 2));
        pictures
    }

    #[test]
    fn test_null_picture_is_predefined() {
        let pictures = Pictures::new();
        assert!(pictures.get(NULL_PICTURE).unwrap().outline.is_empty());
        assert_eq!(
            pictures.get("q").unwrap_err(),
            Skip::UnknownPicture("q".to_string())
        );
    }

    #[test]
    fn test_double_negation_is_identity() {
        let mut pictures = with_square();
        pictures.negate_assign("q", "p").unwrap();
        assert!(!pictures.get("q").unwrap().outline.contours[0].is_clockwise());
        pictures.negate_assign("r", "q").unwrap();
        assert_eq!(pictures.get("r").unwrap(), pictures.get("p").unwrap());
    }

    #[test]
    fn test_assign_copies_named_points() {
        let mut pictures = with_square();
        pictures.assign("q", "p").unwrap();
        pictures.outline_mut("p").unwrap().contours.clear();
        let q = pictures.get("q").unwrap();
        assert_eq!(q.outline.len(), 1);
        assert_eq!(q.named_points.get("corner"), Some(&(0, 2)));
    }

    #[test]
    fn test_accumulate_reversed() {
        let mut pictures = with_square();
        pictures.declare("q");
        pictures.accumulate("q", "p", false).unwrap();
        pictures.accumulate("q", "p", true).unwrap();
        let q = &pictures.get("q").unwrap().outline;
        assert_eq!(q.len(), 2);
        assert!(q.contours[0].is_clockwise());
        assert!(!q.contours[1].is_clockwise());
    }

    #[test]
    fn test_accumulate_into_itself() {
        let mut pictures = with_square();
        pictures
            .accumulate_transformed("p", "p", Affine::translate((20.0, 0.0)), false)
            .unwrap();
        let p = &pictures.get("p").unwrap().outline;
        assert_eq!(p.len(), 2);
        assert_eq!(p.bounding_box().map(|b| b.x1), Some(30.0));
        assert_eq!(
            pictures.accumulate("nope", "p", false),
            Err(Skip::UnknownPicture("nope".to_string()))
        );
    }
}
