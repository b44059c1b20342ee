//! Application runner logic
//!
//! Handles the different things a run of mfvec can do with a log

use crate::core::cli::CliArgs;
use crate::core::config::ConfigFile;
use crate::core::errors::FatalError;
use crate::data;
use crate::engine::BasicEngine;
use crate::interpreter::{interpret, scan_extents, target_ppi};
use crate::logging;
use crate::trace::{clean_log, tokenize};
use anyhow::{Context, Result};
use serde_json::json;
use std::fs;
use tracing::info;

/// Run mfvec with the given CLI arguments.
/// Handles special CLI flags and delegates the log to the interpreter.
pub fn run_app(cli_args: CliArgs) -> Result<()> {
    // Handle --new-config flag specially
    if cli_args.new_config {
        return ConfigFile::initialize_config_directory().context("Failed to initialize config directory");
    }

    let _log_guard = logging::init(cli_args.verbose, cli_args.log_file)?;

    let log_path = cli_args
        .log
        .as_ref()
        .ok_or_else(|| anyhow::anyhow!("no log file given"))?;
    let prologue = cli_args.prologue_text()?;
    let log = fs::read_to_string(log_path).map_err(|source| FatalError::Unreadable {
        path: log_path.clone(),
        source,
    })?;

    if let Some(path) = &cli_args.clean_log {
        fs::write(path, clean_log(&log, &prologue))
            .with_context(|| format!("can't write cleaned log to {}", path.display()))?;
        info!("wrote cleaned log to {}", path.display());
    }

    let records = tokenize(&log, &prologue)?;
    if cli_args.tokens {
        println!("{}", serde_json::to_string_pretty(&records)?);
        return Ok(());
    }

    let settings = cli_args.resolve_settings()?;
    if cli_args.prerun {
        let extents = scan_extents(&records, &settings);
        let plan = target_ppi(&settings, &extents);
        println!("{}", serde_json::to_string_pretty(&json!({ "extents": extents, "plan": plan }))?);
        return Ok(());
    }

    let font = interpret(&records, settings, BasicEngine::new());
    println!("{}", serde_json::to_string_pretty(&font)?);

    if let Some(dir) = &cli_args.ufo {
        data::save_ufo(&font, dir)?;
    }
    Ok(())
}
