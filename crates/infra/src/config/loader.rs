//! Configuration loader
//!
//! Loads client configuration from an optional file with environment
//! variables layered on top.
//!
//! ## Loading Strategy
//! 1. Start from the file given explicitly, or the first one found by
//!    [`probe_config_paths`], or built-in defaults when there is none
//! 2. Override individual fields from environment variables
//! 3. Validate the result
//!
//! ## Environment Variables
//! - `JIGSAW_API_BASE_URL`: API base URL
//! - `JIGSAW_REQUEST_TIMEOUT_SECS`: per-request timeout in seconds
//! - `JIGSAW_REFRESH_TIMEOUT_SECS`: credential renewal timeout in seconds
//! - `JIGSAW_STORAGE_PATH`: session file path
//! - `JIGSAW_USER_AGENT`: `User-Agent` header override
//!
//! ## File Locations
//! The loader probes the following paths (in order):
//! 1. `./jigsaw.json` or `./jigsaw.toml` (current working directory)
//! 2. `./config.json` or `./config.toml` (current working directory)
//! 3. `../jigsaw.json` or `../jigsaw.toml` (parent directory)
//! 4. Relative to executable location

use std::path::{Path, PathBuf};

use jigsaw_domain::{ClientConfig, JigsawError, Result};
use url::Url;

pub const ENV_BASE_URL: &str = "JIGSAW_API_BASE_URL";
pub const ENV_REQUEST_TIMEOUT: &str = "JIGSAW_REQUEST_TIMEOUT_SECS";
pub const ENV_REFRESH_TIMEOUT: &str = "JIGSAW_REFRESH_TIMEOUT_SECS";
pub const ENV_STORAGE_PATH: &str = "JIGSAW_STORAGE_PATH";
pub const ENV_USER_AGENT: &str = "JIGSAW_USER_AGENT";

/// Load configuration from the probed file (if any) and the environment
///
/// # Errors
/// Returns `JigsawError::Config` if a file is found but cannot be parsed, an
/// environment override is malformed, or the result fails validation.
pub fn load() -> Result<ClientConfig> {
    load_with(None)
}

/// Load configuration from `path` (or the probed file) and the environment
///
/// An explicit `path` must exist.
///
/// # Errors
/// See [`load`].
pub fn load_with(path: Option<PathBuf>) -> Result<ClientConfig> {
    let config = match path {
        Some(path) => load_from_file(Some(path))?,
        None => match probe_config_paths() {
            Some(found) => load_from_file(Some(found))?,
            None => {
                tracing::debug!("No config file found, using defaults");
                ClientConfig::default()
            }
        },
    };

    let config = apply_env(config)?;
    validate(&config)?;
    Ok(config)
}

/// Defaults overridden by environment variables
///
/// # Errors
/// Returns `JigsawError::Config` if an override is malformed.
pub fn load_from_env() -> Result<ClientConfig> {
    let config = apply_env(ClientConfig::default())?;
    tracing::info!("Configuration loaded from environment variables");
    Ok(config)
}

/// Override fields of `config` from the process environment
///
/// # Errors
/// Returns `JigsawError::Config` if an override is malformed.
pub fn apply_env(config: ClientConfig) -> Result<ClientConfig> {
    apply_env_from(config, |key| std::env::var(key).ok())
}

fn apply_env_from<F>(mut config: ClientConfig, lookup: F) -> Result<ClientConfig>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(base_url) = lookup(ENV_BASE_URL) {
        config.api.base_url = base_url;
    }
    if let Some(raw) = lookup(ENV_REQUEST_TIMEOUT) {
        config.api.request_timeout_secs = parse_secs(ENV_REQUEST_TIMEOUT, &raw)?;
    }
    if let Some(raw) = lookup(ENV_REFRESH_TIMEOUT) {
        config.api.refresh_timeout_secs = parse_secs(ENV_REFRESH_TIMEOUT, &raw)?;
    }
    if let Some(path) = lookup(ENV_STORAGE_PATH) {
        config.storage.path = PathBuf::from(path);
    }
    if let Some(agent) = lookup(ENV_USER_AGENT) {
        config.api.user_agent = Some(agent);
    }
    Ok(config)
}

/// Load configuration from a file
///
/// If `path` is `None`, probes multiple locations for config files.
/// Supports both JSON and TOML formats (detected by file extension). Fields
/// missing from the file take their defaults.
///
/// # Errors
/// Returns `JigsawError::Config` if:
/// - File not found (when path is specified)
/// - No config file found (when path is `None`)
/// - File format is invalid
pub fn load_from_file(path: Option<PathBuf>) -> Result<ClientConfig> {
    let config_path = match path {
        Some(p) => {
            if !p.exists() {
                return Err(JigsawError::Config(format!(
                    "Config file not found: {}",
                    p.display()
                )));
            }
            p
        }
        None => probe_config_paths().ok_or_else(|| {
            JigsawError::Config("No config file found in any of the standard locations".to_string())
        })?,
    };

    tracing::info!(path = %config_path.display(), "Loading configuration from file");

    let contents = std::fs::read_to_string(&config_path)
        .map_err(|e| JigsawError::Config(format!("Failed to read config file: {}", e)))?;

    parse_config(&contents, &config_path)
}

/// Parse configuration from string content
///
/// Format is detected by file extension (`.json` or `.toml`).
fn parse_config(contents: &str, path: &Path) -> Result<ClientConfig> {
    let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("json");

    match extension {
        "toml" => toml::from_str(contents)
            .map_err(|e| JigsawError::Config(format!("Invalid TOML format: {}", e))),
        "json" => serde_json::from_str(contents)
            .map_err(|e| JigsawError::Config(format!("Invalid JSON format: {}", e))),
        _ => Err(JigsawError::Config(format!("Unsupported config format: {}", extension))),
    }
}

/// Probe multiple paths for configuration files
///
/// # Returns
/// The first config file found, or `None` if no file exists.
pub fn probe_config_paths() -> Option<PathBuf> {
    let mut candidates = Vec::new();

    if let Ok(cwd) = std::env::current_dir() {
        candidates.extend(candidates_in(&cwd));
        candidates.push(cwd.join("../jigsaw.json"));
        candidates.push(cwd.join("../jigsaw.toml"));
    }

    if let Ok(exe_path) = std::env::current_exe() {
        if let Some(exe_dir) = exe_path.parent() {
            candidates.extend(candidates_in(exe_dir));
        }
    }

    candidates.into_iter().find(|path| path.exists())
}

fn candidates_in(dir: &Path) -> [PathBuf; 4] {
    [
        dir.join("jigsaw.json"),
        dir.join("jigsaw.toml"),
        dir.join("config.json"),
        dir.join("config.toml"),
    ]
}

fn parse_secs(key: &str, raw: &str) -> Result<u64> {
    raw.trim()
        .parse::<u64>()
        .map_err(|e| JigsawError::Config(format!("Invalid value for {}: {}", key, e)))
}

fn validate(config: &ClientConfig) -> Result<()> {
    Url::parse(&config.api.base_url).map_err(|e| {
        JigsawError::Config(format!("Invalid API base URL {}: {}", config.api.base_url, e))
    })?;

    if config.api.request_timeout_secs == 0 || config.api.refresh_timeout_secs == 0 {
        return Err(JigsawError::Config("Timeouts must be at least one second".to_string()));
    }

    Ok(())
}
