//! INI configuration file handling.
//!
//! ```ini
//! [output]
//! directory = ~/maps
//! quarantine_directory = ~/maps/quarantine
//! format = jpg
//! skip_existing = true
//!
//! [tiles]
//! size = 256
//! header_crop = 30
//! header_padding = 60
//!
//! [network]
//! min_delay_ms = 1000
//! jitter_ms = 1000
//! max_retries = 0
//! retry_base_delay_ms = 2000
//! timeout_secs = 30
//! user_agent = Mozilla/5.0 ...
//!
//! [provider]
//! api_key = ...
//! base_url = https://dev.virtualearth.net/REST/v1/Imagery/Map/Aerial
//! ```

use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use ini::{Ini, Properties};
use thiserror::Error;

use super::MosaicConfig;

/// Configuration file errors.
#[derive(Debug, Error)]
pub enum ConfigFileError {
    /// Failed to read or parse the config file
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] ini::Error),

    /// Invalid configuration value
    #[error("Invalid configuration: {section}.{key} = '{value}' - {reason}")]
    InvalidValue {
        section: String,
        key: String,
        value: String,
        reason: String,
    },
}

/// Path of the default config file (`<config dir>/earthmosaic/config.ini`).
pub fn config_file_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("earthmosaic")
        .join("config.ini")
}

/// Expands a leading `~/` to the home directory.
pub fn expand_tilde(path: &str) -> PathBuf {
    if let Some(stripped) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(stripped);
        }
    }
    PathBuf::from(path)
}

pub(super) fn load_from(path: &Path) -> Result<MosaicConfig, ConfigFileError> {
    if !path.exists() {
        return Ok(MosaicConfig::default());
    }

    let ini = Ini::load_from_file(path)?;
    let config = parse_ini(&ini)?;
    config.validate()?;
    Ok(config)
}

/// Starts from the defaults and overlays every key found in `ini`.
fn parse_ini(ini: &Ini) -> Result<MosaicConfig, ConfigFileError> {
    let mut config = MosaicConfig::default();

    // [output] section
    if let Some(section) = ini.section(Some("output")) {
        if let Some(v) = non_empty(section, "directory") {
            config.output_dir = expand_tilde(v);
        }
        if let Some(v) = non_empty(section, "quarantine_directory") {
            config.quarantine_dir = Some(expand_tilde(v));
        }
        if let Some(v) = non_empty(section, "format") {
            config.output_format = v.parse().map_err(|reason| ConfigFileError::InvalidValue {
                section: "output".to_string(),
                key: "format".to_string(),
                value: v.to_string(),
                reason,
            })?;
        }
        if let Some(v) = non_empty(section, "skip_existing") {
            config.skip_existing = parse_bool("output", "skip_existing", v)?;
        }
    }

    // [tiles] section
    if let Some(section) = ini.section(Some("tiles")) {
        if let Some(v) = non_empty(section, "size") {
            config.tile_size = parse_number("tiles", "size", v)?;
        }
        if let Some(v) = non_empty(section, "header_crop") {
            config.header_crop = parse_number("tiles", "header_crop", v)?;
        }
        if let Some(v) = non_empty(section, "header_padding") {
            config.header_padding = parse_number("tiles", "header_padding", v)?;
        }
    }

    // [network] section
    if let Some(section) = ini.section(Some("network")) {
        if let Some(v) = non_empty(section, "min_delay_ms") {
            config.min_request_delay =
                Duration::from_millis(parse_number("network", "min_delay_ms", v)?);
        }
        if let Some(v) = non_empty(section, "jitter_ms") {
            config.request_jitter = Duration::from_millis(parse_number("network", "jitter_ms", v)?);
        }
        if let Some(v) = non_empty(section, "max_retries") {
            config.max_retries = parse_number("network", "max_retries", v)?;
        }
        if let Some(v) = non_empty(section, "retry_base_delay_ms") {
            config.retry_base_delay =
                Duration::from_millis(parse_number("network", "retry_base_delay_ms", v)?);
        }
        if let Some(v) = non_empty(section, "timeout_secs") {
            config.http_timeout = Duration::from_secs(parse_number("network", "timeout_secs", v)?);
        }
        if let Some(v) = non_empty(section, "user_agent") {
            config.user_agent = v.to_string();
        }
    }

    // [provider] section
    if let Some(section) = ini.section(Some("provider")) {
        if let Some(v) = non_empty(section, "api_key") {
            config.api_key = v.to_string();
        }
        if let Some(v) = non_empty(section, "base_url") {
            config.base_url = v.trim_end_matches('/').to_string();
        }
    }

    Ok(config)
}

fn non_empty<'a>(section: &'a Properties, key: &str) -> Option<&'a str> {
    section.get(key).map(str::trim).filter(|v| !v.is_empty())
}

fn parse_number<T: FromStr>(section: &str, key: &str, value: &str) -> Result<T, ConfigFileError> {
    value.parse().map_err(|_| ConfigFileError::InvalidValue {
        section: section.to_string(),
        key: key.to_string(),
        value: value.to_string(),
        reason: "must be a non-negative integer".to_string(),
    })
}

fn parse_bool(section: &str, key: &str, value: &str) -> Result<bool, ConfigFileError> {
    match value.to_lowercase().as_str() {
        "true" | "yes" | "1" | "on" => Ok(true),
        "false" | "no" | "0" | "off" => Ok(false),
        _ => Err(ConfigFileError::InvalidValue {
            section: section.to_string(),
            key: key.to_string(),
            value: value.to_string(),
            reason: "must be true or false".to_string(),
        }),
    }
}
