//! Core application functionality
//!
//! This module contains the application shell around the interpreter:
//! - Settings and the user configuration file
//! - Command line handling
//! - Error types shared by the library

pub mod cli;
pub mod config;
pub mod errors;
pub mod platform;
pub mod runner;

// Re-export commonly used items
pub use cli::CliArgs;
pub use config::{ConfigFile, Settings};
pub use errors::{FatalError, Skip};
pub use runner::run_app;
