//! Import options from a TOML file.
//!
//! ```toml
//! validation_enabled = true
//! update_existing = false
//!
//! [severity.severe]
//! code = "24484000"
//! code_system = "2.16.840.1.113883.6.96"
//! display_name = "Severe"
//! ```

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::debug;

use cda_model::ImportOptions;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("invalid config {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

/// Options from `path`, or the defaults when no file is given.
///
/// # Errors
///
/// [`ConfigError`] when the file cannot be read or parsed.
pub fn load_options(path: Option<&Path>) -> Result<ImportOptions, ConfigError> {
    let Some(path) = path else {
        debug!("no config file, using default import options");
        return Ok(ImportOptions::default());
    };
    let text = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let options = parse_options(&text).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })?;
    debug!(
        path = %path.display(),
        validation = options.validation_enabled,
        update_existing = options.update_existing,
        "loaded import options"
    );
    Ok(options)
}

pub fn parse_options(text: &str) -> Result<ImportOptions, toml::de::Error> {
    toml::from_str(text)
}
