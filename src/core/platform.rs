//! Process-level glue: argument parsing and fatal error reporting.

use crate::core::cli::CliArgs;

/// Report an error that ends the run and exit with code 1.
pub fn handle_error(error: anyhow::Error) -> ! {
    eprintln!();
    eprintln!("mfvec failed:");
    for (depth, cause) in error.chain().enumerate() {
        if depth == 0 {
            eprintln!("{cause}");
        } else {
            eprintln!("  caused by: {cause}");
        }
    }
    eprintln!();
    eprintln!("Try running with --help for usage information.");
    std::process::exit(1);
}

/// Parse the command line and check it, exiting on invalid input.
pub fn get_cli_args() -> CliArgs {
    use clap::Parser;
    let args = CliArgs::parse();
    if let Err(message) = args.validate() {
        handle_error(anyhow::anyhow!(message));
    }
    args
}
