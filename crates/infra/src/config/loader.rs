//! Settings loader
//!
//! Loads [`Settings`] from environment variables or files.
//!
//! ## Loading Strategy
//! 1. First, attempts to load from environment variables
//! 2. If `DYNMETRIC_CONFIG_HOST` is unset or a value is invalid, falls back
//!    to loading from file
//! 3. Probes multiple paths for config files
//! 4. Supports JSON and TOML formats
//!
//! ## Environment Variables
//! - `DYNMETRIC_CONFIG_HOST`: Base URL of the configuration service (required)
//! - `DYNMETRIC_TIMEOUT_SECS`: Per-tick collection deadline in seconds
//! - `DYNMETRIC_POLL_INTERVAL_SECS`: Poll interval in seconds
//! - `DYNMETRIC_REQUEST_TIMEOUT_SECS`: HTTP request timeout in seconds
//! - `DYNMETRIC_RESOURCE`: Resource attributes as `key=value,key=value`
//!
//! ## File Locations
//! The loader probes the following paths (in order):
//! 1. `./dynmetric.json` or `./dynmetric.toml` (current working directory)
//! 2. `./config.json` or `./config.toml` (current working directory)
//! 3. The same names in the parent and grandparent directory
//! 4. The same names next to the executable

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use dynmetric_domain::{DynMetricError, Result, Settings};

const FILE_NAMES: [&str; 4] = ["dynmetric.json", "dynmetric.toml", "config.json", "config.toml"];

/// Load settings with automatic fallback strategy
///
/// # Errors
/// Returns `DynMetricError::Config` if:
/// - Settings cannot be loaded from either source
/// - File format is invalid
/// - The loaded settings fail validation
pub fn load() -> Result<Settings> {
    match load_from_env() {
        Ok(settings) => {
            tracing::info!("Settings loaded from environment variables");
            Ok(settings)
        }
        Err(e) => {
            tracing::debug!(error = ?e, "Failed to load from environment, trying file");
            load_from_file(None)
        }
    }
}

/// Load settings from environment variables
///
/// Only `DYNMETRIC_CONFIG_HOST` is required; every other variable falls back
/// to the [`Settings`] default.
///
/// # Errors
/// Returns `DynMetricError::Config` if the host is missing or a value does
/// not parse.
pub fn load_from_env() -> Result<Settings> {
    let mut settings = Settings::new(env_var("DYNMETRIC_CONFIG_HOST")?);

    if let Some(secs) = env_u64("DYNMETRIC_TIMEOUT_SECS")? {
        settings.timeout_secs = Some(secs);
    }
    if let Some(secs) = env_u64("DYNMETRIC_POLL_INTERVAL_SECS")? {
        settings.poll_interval_secs = secs;
    }
    if let Some(secs) = env_u64("DYNMETRIC_REQUEST_TIMEOUT_SECS")? {
        settings.request_timeout_secs = secs;
    }
    if let Ok(raw) = std::env::var("DYNMETRIC_RESOURCE") {
        settings.resource = parse_resource(&raw)?;
    }

    settings.validate()?;
    Ok(settings)
}

/// Load settings from a file
///
/// If `path` is `None`, probes the standard locations.
///
/// # Errors
/// Returns `DynMetricError::Config` if:
/// - File not found (when path is specified)
/// - No config file found (when path is `None`)
/// - File format is invalid
/// - The loaded settings fail validation
pub fn load_from_file(path: Option<PathBuf>) -> Result<Settings> {
    let config_path = match path {
        Some(p) => {
            if !p.exists() {
                return Err(DynMetricError::Config(format!(
                    "Config file not found: {}",
                    p.display()
                )));
            }
            p
        }
        None => probe_config_paths().ok_or_else(|| {
            DynMetricError::Config(
                "No config file found in any of the standard locations".to_string(),
            )
        })?,
    };

    tracing::info!(path = %config_path.display(), "Loading settings from file");

    let contents = std::fs::read_to_string(&config_path)
        .map_err(|e| DynMetricError::Config(format!("Failed to read config file: {e}")))?;

    let settings = parse_settings(&contents, &config_path)?;
    settings.validate()?;
    Ok(settings)
}

/// Parse settings, detecting the format by extension (`.json` or `.toml`).
fn parse_settings(contents: &str, path: &Path) -> Result<Settings> {
    let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("json");

    match extension {
        "toml" => toml::from_str(contents)
            .map_err(|e| DynMetricError::Config(format!("Invalid TOML format: {e}"))),
        "json" => serde_json::from_str(contents)
            .map_err(|e| DynMetricError::Config(format!("Invalid JSON format: {e}"))),
        _ => Err(DynMetricError::Config(format!("Unsupported config format: {extension}"))),
    }
}

/// First existing settings file among the standard locations.
pub fn probe_config_paths() -> Option<PathBuf> {
    let mut dirs = Vec::new();

    if let Ok(cwd) = std::env::current_dir() {
        dirs.push(cwd.clone());
        dirs.push(cwd.join(".."));
        dirs.push(cwd.join("../.."));
    }

    if let Ok(exe_path) = std::env::current_exe() {
        if let Some(exe_dir) = exe_path.parent() {
            dirs.push(exe_dir.to_path_buf());
        }
    }

    probe_in(&dirs)
}

fn probe_in(dirs: &[PathBuf]) -> Option<PathBuf> {
    dirs.iter()
        .flat_map(|dir| FILE_NAMES.iter().map(move |name| dir.join(name)))
        .find(|path| path.is_file())
}

/// Parse `key=value,key=value`. Blank entries are skipped.
fn parse_resource(raw: &str) -> Result<BTreeMap<String, String>> {
    raw.split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(|entry| {
            let (key, value) = entry.split_once('=').ok_or_else(|| {
                DynMetricError::Config(format!("Invalid resource attribute '{entry}': expected key=value"))
            })?;
            let key = key.trim();
            if key.is_empty() {
                return Err(DynMetricError::Config(format!(
                    "Invalid resource attribute '{entry}': empty key"
                )));
            }
            Ok((key.to_string(), value.trim().to_string()))
        })
        .collect()
}

/// Get required environment variable
fn env_var(key: &str) -> Result<String> {
    std::env::var(key).map_err(|_| {
        DynMetricError::Config(format!("Missing required environment variable: {key}"))
    })
}

/// Optional numeric environment variable.
fn env_u64(key: &str) -> Result<Option<u64>> {
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<u64>()
            .map(Some)
            .map_err(|e| DynMetricError::Config(format!("Invalid value for {key}: {e}"))),
        Err(_) => Ok(None),
    }
}
