//! Geometric Primitives and Operations

pub mod collinear;
pub mod outline;
pub mod path;
pub mod utilities;

// Re-export commonly used items
pub use collinear::{fix_contours, is_collinear, remove_artifacts, remove_collinear};
pub use outline::{Contour, Outline, OutlinePoint};
pub use path::{PathJoin, PathSpec};
