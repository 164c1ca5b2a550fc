// src/config.rs
// =============================================================================
// The explicit configuration handed to the mirror pipeline.
//
// Command-line strings are validated here, once: base URLs are parsed and
// normalised, the two relative paths are spelled out, and the destination
// prefix is kept as given. After this point nothing reads argv or a constant.
// =============================================================================

use std::ffi::OsString;
use std::time::Duration;
use thiserror::Error;
use url::Url;

use crate::cli::Cli;

pub const DEFAULT_BROWSE_BASE: &str =
    "https://github.com/arduino/Arduino/tree/master/hardware/arduino/avr/";
pub const DEFAULT_RAW_BASE: &str =
    "https://raw.githubusercontent.com/arduino/Arduino/master/hardware/arduino/avr/";

/// Directory holding the Arduino core sources, relative to both bases.
pub const CORE_PATH: &str = "cores/arduino/";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid base URL '{url}': {source}")]
    InvalidBaseUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },
    #[error("base URL '{0}' cannot be used as a directory base")]
    NotABase(String),
    #[error("invalid variant name '{0}': must be a single non-empty path segment")]
    InvalidVariant(String),
}

#[derive(Debug, Clone)]
pub struct MirrorConfig {
    pub browse_base_url: Url,
    pub raw_base_url: Url,
    pub core_path: String,
    pub variant_path: String,
    /// Prefix prepended verbatim to each filename; no separator is added
    pub dest_dir: OsString,
    pub selector: String,
    pub timeout: Duration,
}

impl MirrorConfig {
    pub fn from_cli(cli: &Cli) -> Result<Self, ConfigError> {
        Ok(Self {
            browse_base_url: parse_base_url(&cli.browse_base)?,
            raw_base_url: parse_base_url(&cli.raw_base)?,
            core_path: CORE_PATH.to_string(),
            variant_path: variant_path(&cli.variant)?,
            dest_dir: OsString::from(&cli.dest_dir),
            selector: cli.selector.clone(),
            timeout: Duration::from_secs(cli.timeout),
        })
    }

    /// The directories to mirror, in the order they are processed.
    pub fn relative_paths(&self) -> [&str; 2] {
        [self.core_path.as_str(), self.variant_path.as_str()]
    }
}

// Parses a base URL and makes sure it ends with '/'
//
// Url::join replaces the last path segment unless the base ends in a slash:
//   "https://h/avr".join("cores/")  -> "https://h/cores/"
//   "https://h/avr/".join("cores/") -> "https://h/avr/cores/"
fn parse_base_url(raw: &str) -> Result<Url, ConfigError> {
    let mut url = Url::parse(raw).map_err(|source| ConfigError::InvalidBaseUrl {
        url: raw.to_string(),
        source,
    })?;

    if url.cannot_be_a_base() {
        return Err(ConfigError::NotABase(raw.to_string()));
    }

    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }

    Ok(url)
}

fn variant_path(variant: &str) -> Result<String, ConfigError> {
    let name = variant.trim_matches('/');

    // '%' could smuggle an encoded "..", '?' and '#' would end the URL path
    let unsafe_name = name.is_empty()
        || name == "."
        || name == ".."
        || name.contains(['/', '\\', '%', '?', '#']);

    if unsafe_name {
        return Err(ConfigError::InvalidVariant(variant.to_string()));
    }

    Ok(format!("variants/{}/", name))
}
