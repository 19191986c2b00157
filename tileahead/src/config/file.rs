//! INI file loading for [`PrefetchConfig`].
//!
//! ```ini
//! [prefetch]
//! burst_limit = 200
//! blocking = true
//! duration_ms = 1000
//! fps = 60
//! curve = 1.42
//! strategy = sampled
//! max_in_flight = 64
//! ```
//!
//! Unknown keys are ignored with a warning; missing keys keep their
//! defaults.

use std::path::Path;
use std::str::FromStr;

use ini::{Ini, Properties};
use thiserror::Error;
use tracing::warn;

use super::PrefetchConfig;
use crate::resolver::PathStrategy;

const SECTION: &str = "prefetch";

const KNOWN_KEYS: &[&str] = &[
    "burst_limit",
    "blocking",
    "duration_ms",
    "fps",
    "curve",
    "padding",
    "timeout_multiplier",
    "max_shrink_retries",
    "edge_buffer",
    "max_in_flight",
    "strategy",
    "telemetry",
];

/// Errors from loading a configuration file.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The file exists but could not be read or parsed.
    #[error("Failed to read config file: {0}")]
    Read(#[from] ini::Error),

    /// A key holds a value outside its domain.
    #[error("Invalid configuration: {section}.{key} = '{value}' - {reason}")]
    InvalidValue {
        section: String,
        key: String,
        value: String,
        reason: String,
    },
}

impl PrefetchConfig {
    /// Loads configuration from an INI file.
    ///
    /// A missing file yields the defaults.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let ini = Ini::load_from_file(path)?;
        parse_ini(&ini)
    }

    /// Parses configuration from INI text.
    pub fn from_ini_str(content: &str) -> Result<Self, ConfigError> {
        let ini = Ini::load_from_str(content).map_err(|e| ConfigError::Read(ini::Error::Parse(e)))?;
        parse_ini(&ini)
    }
}

fn parse_ini(ini: &Ini) -> Result<PrefetchConfig, ConfigError> {
    let mut config = PrefetchConfig::default();
    let Some(section) = ini.section(Some(SECTION)) else {
        return Ok(config);
    };

    for (key, _) in section.iter() {
        if !KNOWN_KEYS.contains(&key) {
            warn!(key = %key, "Ignoring unknown [prefetch] key");
        }
    }

    if let Some(v) = parse_number::<usize>(section, "burst_limit")? {
        if v == 0 {
            return Err(invalid("burst_limit", "0", "must be at least 1"));
        }
        config.burst_limit = v;
    }
    if let Some(v) = section.get("blocking") {
        config.blocking = parse_bool("blocking", v)?;
    }
    if let Some(v) = parse_number::<f64>(section, "duration_ms")? {
        config.duration_ms = v;
    }
    if let Some(v) = parse_number::<f64>(section, "fps")? {
        config.fps = v;
    }
    if let Some(v) = parse_number::<f64>(section, "curve")? {
        if v <= 0.0 {
            return Err(invalid("curve", &v.to_string(), "must be positive"));
        }
        config.curve = v;
    }
    if let Some(v) = parse_number::<f64>(section, "padding")? {
        config.padding = v;
    }
    if let Some(v) = parse_number::<f64>(section, "timeout_multiplier")? {
        if v <= 0.0 {
            return Err(invalid(
                "timeout_multiplier",
                &v.to_string(),
                "must be positive",
            ));
        }
        config.timeout_multiplier = v;
    }
    if let Some(v) = parse_number::<u32>(section, "max_shrink_retries")? {
        if v > super::MAX_SHRINK_RETRIES {
            return Err(invalid(
                "max_shrink_retries",
                &v.to_string(),
                "must be at most 9",
            ));
        }
        config.max_shrink_retries = v;
    }
    if let Some(v) = parse_number::<u32>(section, "edge_buffer")? {
        config.edge_buffer = v;
    }
    if let Some(v) = section.get("max_in_flight") {
        let v = v.trim().to_lowercase();
        config.max_in_flight = match v.as_str() {
            "" | "none" | "unlimited" | "0" => None,
            other => Some(other.parse::<usize>().map_err(|_| {
                invalid(
                    "max_in_flight",
                    other,
                    "must be a positive integer or 'none'",
                )
            })?),
        };
    }
    if let Some(v) = section.get("strategy") {
        config.strategy = PathStrategy::from_str(v)
            .map_err(|_| invalid("strategy", v, "must be 'sampled' or 'diagonal'"))?;
    }
    if let Some(v) = section.get("telemetry") {
        config.telemetry = parse_bool("telemetry", v)?;
    }

    Ok(config)
}

fn invalid(key: &str, value: &str, reason: &str) -> ConfigError {
    ConfigError::InvalidValue {
        section: SECTION.to_string(),
        key: key.to_string(),
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

fn parse_number<T: FromStr>(section: &Properties, key: &str) -> Result<Option<T>, ConfigError> {
    let Some(raw) = section.get(key) else {
        return Ok(None);
    };
    raw.trim()
        .parse::<T>()
        .map(Some)
        .map_err(|_| invalid(key, raw, "must be a number"))
}

/// Accepts true/false, yes/no, 1/0, on/off (case-insensitive).
fn parse_bool(key: &str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" => Ok(false),
        _ => Err(invalid(key, value, "must be true or false")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_nonexistent_returns_defaults() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let path = temp_dir.path().join("missing.ini");

        let config = PrefetchConfig::load_from(&path).unwrap();
        assert_eq!(config, PrefetchConfig::default());
    }

    #[test]
    fn test_load_overrides_defaults() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let path = temp_dir.path().join("tileahead.ini");
        std::fs::write(
            &path,
            "[prefetch]\n\
             burst_limit = 120\n\
             blocking = no\n\
             duration_ms = 1500\n\
             fps = 30\n\
             curve = 1.8\n\
             max_in_flight = 16\n\
             strategy = diagonal\n\
             telemetry = on\n",
        )
        .unwrap();

        let config = PrefetchConfig::load_from(&path).unwrap();
        assert_eq!(config.burst_limit, 120);
        assert!(!config.blocking);
        assert_eq!(config.duration_ms, 1500.0);
        assert_eq!(config.fps, 30.0);
        assert_eq!(config.curve, 1.8);
        assert_eq!(config.max_in_flight, Some(16));
        assert_eq!(config.strategy, PathStrategy::Diagonal);
        assert!(config.telemetry);
        // Untouched keys keep defaults
        assert_eq!(config.edge_buffer, 1);
        assert_eq!(config.timeout_multiplier, 5.0);
    }

    #[test]
    fn test_missing_section_yields_defaults() {
        let config = PrefetchConfig::from_ini_str("[other]\nkey = value\n").unwrap();
        assert_eq!(config, PrefetchConfig::default());
    }

    #[test]
    fn test_invalid_number() {
        let err = PrefetchConfig::from_ini_str("[prefetch]\nburst_limit = lots\n").unwrap_err();
        match err {
            ConfigError::InvalidValue { key, value, .. } => {
                assert_eq!(key, "burst_limit");
                assert_eq!(value, "lots");
            }
            other => panic!("unexpected error: {}", other),
        }
    }

    #[test]
    fn test_invalid_strategy() {
        let err = PrefetchConfig::from_ini_str("[prefetch]\nstrategy = spiral\n").unwrap_err();
        assert!(err.to_string().contains("prefetch.strategy"));
    }

    #[test]
    fn test_retry_ceiling_enforced() {
        assert!(PrefetchConfig::from_ini_str("[prefetch]\nmax_shrink_retries = 12\n").is_err());
        let config =
            PrefetchConfig::from_ini_str("[prefetch]\nmax_shrink_retries = 4\n").unwrap();
        assert_eq!(config.max_shrink_retries, 4);
    }

    #[test]
    fn test_unlimited_in_flight() {
        let config = PrefetchConfig::from_ini_str("[prefetch]\nmax_in_flight = none\n").unwrap();
        assert_eq!(config.max_in_flight, None);
    }
}
