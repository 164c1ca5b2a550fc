// src/cli.rs
// =============================================================================
// This file defines our command-line interface using the `clap` crate.
//
// Two positional arguments do the real work:
//   avr-core-mirror <VARIANT> <DEST_DIR>
//
// Everything else is an optional flag with a default that points at the
// upstream Arduino repository, so a plain invocation needs no flags at all.
// =============================================================================

use clap::Parser;

use crate::config::{DEFAULT_BROWSE_BASE, DEFAULT_RAW_BASE};
use crate::fetch::DEFAULT_TIMEOUT_SECS;
use crate::listing::DEFAULT_SELECTOR;

// This struct represents our entire CLI application
//
// #[derive(Parser)] tells clap to automatically generate parsing code
#[derive(Parser, Debug)]
#[command(
    name = "avr-core-mirror",
    version,
    about = "Mirror the Arduino AVR core and one board variant into a local directory",
    long_about = "avr-core-mirror reads the GitHub directory listings of cores/arduino/ and \
                  variants/<VARIANT>/ and downloads every listed file into DEST_DIR. \
                  The first failure stops the run; files already downloaded are kept."
)]
pub struct Cli {
    /// Board variant directory name (e.g. standard, mega, leonardo)
    ///
    /// Files are taken from variants/<VARIANT>/
    pub variant: String,

    /// Prefix prepended verbatim to each filename (e.g. ./out/)
    ///
    /// The directory must already exist; no separator is added.
    pub dest_dir: String,

    /// Base URL of the directory listing pages
    #[arg(long, default_value = DEFAULT_BROWSE_BASE)]
    pub browse_base: String,

    /// Base URL of the raw file content host
    #[arg(long, default_value = DEFAULT_RAW_BASE)]
    pub raw_base: String,

    /// CSS selector matching the filename anchors in a listing page
    ///
    /// Override this if the hosting site changes its markup.
    #[arg(long, default_value = DEFAULT_SELECTOR)]
    pub selector: String,

    /// Per-request timeout in seconds
    #[arg(long, default_value_t = DEFAULT_TIMEOUT_SECS)]
    pub timeout: u64,

    /// Output results in JSON format instead of a table
    #[arg(long)]
    pub json: bool,
}
