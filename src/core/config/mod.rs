//! Configuration management
//!
//! - Interpreter settings with their defaults
//! - The user configuration file

pub mod settings;
pub mod user_config;

pub use settings::{CodeRange, Extensions, GeometryParams, Settings};
pub use user_config::ConfigFile;
