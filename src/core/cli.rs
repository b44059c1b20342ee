//! Command line interface for mfvec
//!
//! Handles parsing command line arguments and provides
//! validation for user inputs. Options that change the interpretation
//! override values from the settings files.

use crate::core::config::{ConfigFile, Settings};
use anyhow::Context;
use clap::Parser;
use std::path::{Path, PathBuf};
use tracing::debug;

/// mfvec CLI arguments
///
/// Examples:
///   mfvec font.log --prologue-file prologue.mf          # Print the font model as JSON
///   mfvec font.log --prologue "..." --tokens             # Dump the trace records
///   mfvec font.log --prologue-file p.mf --ufo out.ufo    # Also write a UFO
///   mfvec font.log --prologue-file p.mf --clean-log x.log
///   mfvec font.log --prologue-file p.mf --prerun --upm 1000
///   mfvec --new-config                                   # Write ~/.config/mfvec/settings.json
#[derive(Parser, Debug, Clone, Default)]
#[clap(
    name = "mfvec",
    version,
    about = "Turns an instrumented METAFONT log into a font model",
    long_about = "mfvec reads the log of a METAFONT run that was instrumented with the mf2vec macros and rebuilds the font it describes: outlines, metrics, ligatures, kerning, extensible recipes and math tables."
)]
pub struct CliArgs {
    /// Log written by the instrumented compiler run
    #[clap(
        value_name = "LOG",
        required_unless_present = "new_config",
        help = "Compiler log to interpret"
    )]
    pub log: Option<PathBuf>,

    /// Text of the prologue sent to the compiler
    ///
    /// Everything before its first occurrence in the log is ignored.
    #[clap(
        long = "prologue",
        value_name = "TEXT",
        help = "Prologue text sent to the compiler",
        long_help = "The exact prologue text that was sent to the compiler before the font source. Output before its first occurrence in the log is ignored. Use --prologue-file to read it from a file instead."
    )]
    pub prologue: Option<String>,

    #[clap(
        long = "prologue-file",
        value_name = "FILE",
        help = "File holding the prologue sent to the compiler"
    )]
    pub prologue_file: Option<PathBuf>,

    /// Settings JSON applied on top of the user config file
    #[clap(
        long = "settings",
        short = 's',
        value_name = "FILE",
        help = "Settings JSON for this run",
        long_help = "A settings JSON file for this run. It replaces ~/.config/mfvec/settings.json; fields it leaves out keep their defaults. Command line options override both."
    )]
    pub settings: Option<PathBuf>,

    /// Initialize user configuration directory with default settings
    #[clap(
        long = "new-config",
        help = "Initialize user config directory with default settings",
        long_help = "Create ~/.config/mfvec with a settings.json holding every option at its default value, and a logs/ directory for --log-file."
    )]
    pub new_config: bool,

    #[clap(
        short = 'v',
        long = "verbose",
        action = clap::ArgAction::Count,
        help = "More output; repeat for per-record tracing"
    )]
    pub verbose: u8,

    #[clap(
        long = "log-file",
        help = "Also write diagnostics to the daily log file",
        long_help = "Also write diagnostics to ~/.config/mfvec/logs/mfvec-YYYY-MM-DD.log. RUST_LOG overrides the level chosen with -v."
    )]
    pub log_file: bool,

    #[clap(long = "tokens", help = "Print the trace records as JSON and stop")]
    pub tokens: bool,

    /// Scan the trace for extents and stop
    #[clap(
        long = "prerun",
        help = "Print the extents and the resolution for the real run, then stop",
        long_help = "Scan the trace for the font's ascent and descent without building anything, and print them as JSON together with the resolution the compiler needs to run at for --upm. Use this on the output of a first compiler run."
    )]
    pub prerun: bool,

    #[clap(long = "ufo", value_name = "DIR", help = "Write the font as a UFO")]
    pub ufo: Option<PathBuf>,

    #[clap(
        long = "clean-log",
        value_name = "FILE",
        help = "Write the log without prologue and trace markers",
        long_help = "Write a copy of the log with the echoed prologue and every trace marker span removed, leaving only what the compiler printed on its own."
    )]
    pub clean_log: Option<PathBuf>,

    #[clap(long = "upm", help = "Target units per em")]
    pub upm: Option<u32>,

    #[clap(long = "ppi", help = "Pixels per inch the compiler ran with")]
    pub ppi: Option<f64>,

    #[clap(long = "encoding", help = "Name of the input encoding, e.g. \"TeX math symbols\"")]
    pub encoding: Option<String>,

    #[clap(long = "kerning-classes", help = "Group kerning pairs into classes")]
    pub kerning_classes: bool,

    /// Trace extensions to accept
    #[clap(
        long = "extension",
        short = 'x',
        value_name = "NAME",
        help = "Enable a trace extension (repeatable)",
        long_help = "Enable a trace extension. One of: ascii-hex-code, attachment-points, font, glyph, ligature, ligtable-switch, outline, all. May be given several times."
    )]
    pub extensions: Vec<String>,
}

const EXTENSION_NAMES: [&str; 8] = [
    "ascii-hex-code",
    "attachment-points",
    "font",
    "glyph",
    "ligature",
    "ligtable-switch",
    "outline",
    "all",
];

fn check_exists(path: &Path, what: &str) -> Result<(), String> {
    if path.exists() {
        Ok(())
    } else {
        Err(format!(
            "{what} does not exist: {}\nMake sure the path is correct and the file exists.",
            path.display()
        ))
    }
}

impl CliArgs {
    /// Validate the CLI arguments after parsing
    ///
    /// This ensures that all input paths exist before anything is read,
    /// providing clear error messages for common mistakes.
    pub fn validate(&self) -> Result<(), String> {
        if self.new_config {
            return Ok(());
        }

        match &self.log {
            Some(log) => check_exists(log, "Log file")?,
            None => return Err("No log file given".to_string()),
        }

        match (&self.prologue, &self.prologue_file) {
            (Some(_), Some(_)) => {
                return Err("Give the prologue either with --prologue or with --prologue-file, not both".to_string())
            }
            (None, None) => {
                return Err("The prologue is required: use --prologue or --prologue-file".to_string())
            }
            (None, Some(path)) => check_exists(path, "Prologue file")?,
            (Some(_), None) => {}
        }

        if let Some(path) = &self.settings {
            check_exists(path, "Settings file")?;
        }

        if let Some(unknown) = self
            .extensions
            .iter()
            .find(|name| !EXTENSION_NAMES.contains(&name.as_str()))
        {
            return Err(format!(
                "Unknown extension: '{unknown}'\nAvailable extensions: {}",
                EXTENSION_NAMES.join(", ")
            ));
        }

        Ok(())
    }

    /// The prologue text, from the command line or its file
    pub fn prologue_text(&self) -> anyhow::Result<String> {
        match (&self.prologue, &self.prologue_file) {
            (Some(text), _) => Ok(text.clone()),
            (None, Some(path)) => std::fs::read_to_string(path)
                .with_context(|| format!("can't read prologue file {}", path.display())),
            (None, None) => Err(anyhow::anyhow!("no prologue given")),
        }
    }

    /// Settings for this run
    ///
    /// Priority order:
    /// 1. CLI options
    /// 2. The --settings file, or else ~/.config/mfvec/settings.json
    /// 3. Built-in defaults
    pub fn resolve_settings(&self) -> anyhow::Result<Settings> {
        let mut settings = match &self.settings {
            Some(path) => {
                ConfigFile::load_from(path)
                    .ok_or_else(|| anyhow::anyhow!("can't load settings from {}", path.display()))?
                    .settings
            }
            None => match ConfigFile::load() {
                Some(config) => {
                    debug!("Using settings from {:?}", ConfigFile::config_path());
                    config.settings
                }
                None => Settings::default(),
            },
        };
        self.apply_overrides(&mut settings);
        settings.validate().map_err(|e| anyhow::anyhow!(e))?;
        Ok(settings)
    }

    fn apply_overrides(&self, settings: &mut Settings) {
        if let Some(upm) = self.upm {
            settings.upm = Some(upm);
        }
        if let Some(ppi) = self.ppi {
            settings.ppi = ppi;
        }
        if let Some(encoding) = &self.encoding {
            settings.input_encoding = Some(encoding.clone());
        }
        if self.kerning_classes {
            settings.kerning_classes = true;
        }
        for name in &self.extensions {
            let all = name == "all";
            let switches = &mut settings.extensions;
            if all || name == "ascii-hex-code" {
                settings.charcode_from_last_ascii_hex_arg = true;
            }
            if all || name == "attachment-points" {
                switches.attachment_points = true;
            }
            if all || name == "font" {
                switches.font = true;
            }
            if all || name == "glyph" {
                switches.glyph = true;
            }
            if all || name == "ligature" {
                switches.ligature = true;
            }
            if all || name == "ligtable-switch" {
                switches.ligtable_switch = true;
            }
            if all || name == "outline" {
                switches.outline = true;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_needs_one_prologue() {
        let dir = tempfile::tempdir().unwrap();
        let log = dir.path().join("font.log");
        std::fs::write(&log, "").unwrap();

        let mut args = CliArgs {
            log: Some(log),
            ..Default::default()
        };
        assert!(args.validate().is_err());

        args.prologue = Some("input mf2vec".to_string());
        assert!(args.validate().is_ok());

        args.prologue_file = Some(dir.path().join("prologue.mf"));
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_validate_missing_log() {
        let args = CliArgs::parse_from(["mfvec", "/no/such/font.log", "--prologue", "x"]);
        let error = args.validate().unwrap_err();
        assert!(error.contains("/no/such/font.log"));
        assert!(CliArgs::parse_from(["mfvec", "--new-config"]).validate().is_ok());
    }

    #[test]
    fn test_cli_overrides_settings_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, r#"{"upm": 2048, "ppi": 500.0}"#).unwrap();

        let args = CliArgs::parse_from([
            "mfvec",
            "font.log",
            "--prologue",
            "x",
            "--settings",
            path.to_str().unwrap(),
            "--upm",
            "1000",
            "-x",
            "font",
            "-x",
            "ascii-hex-code",
        ]);
        let settings = args.resolve_settings().unwrap();
        assert_eq!(settings.upm, Some(1000));
        assert_eq!(settings.ppi, 500.0);
        assert!(settings.extensions.font);
        assert!(!settings.extensions.glyph);
        assert!(settings.charcode_from_last_ascii_hex_arg);
    }

    #[test]
    fn test_unknown_extension_rejected() {
        let args = CliArgs {
            new_config: false,
            log: Some(PathBuf::from(".")),
            prologue: Some("x".to_string()),
            extensions: vec!["kerning".to_string()],
            ..Default::default()
        };
        assert!(args.validate().unwrap_err().contains("Unknown extension"));
    }
}
