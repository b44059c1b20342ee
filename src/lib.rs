//! mfvec
pub mod core;
pub mod data;
pub mod engine;
pub mod font;
pub mod geometry;
pub mod interpreter;
pub mod logging;
#[cfg(test)]
mod tests;
pub mod trace;
