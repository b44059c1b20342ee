//! Font data export
//!
//! Conversion of the interpreted font into norad's UFO structures, and
//! writing those to disk.

pub mod conversions;
pub mod ufo;

pub use conversions::to_norad_font;
pub use ufo::save_ufo;
