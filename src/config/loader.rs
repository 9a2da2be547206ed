// src/config/loader.rs

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::config::model::{ConfigFile, RawConfigFile};
use crate::errors::{CalcError, Result};

/// Load a configuration file from a given path and return the raw `RawConfigFile`.
///
/// This only performs TOML deserialization; it does **not** apply environment
/// overrides or run validation. Use [`load_and_validate`] for that.
pub fn load_from_path(path: impl AsRef<Path>) -> Result<RawConfigFile> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path)?;

    let config: RawConfigFile = toml::from_str(&contents)?;

    Ok(config)
}

/// Load a configuration file from path, apply `CALCDAG_*` environment
/// overrides and validate the result.
pub fn load_and_validate(path: impl AsRef<Path>) -> Result<ConfigFile> {
    let mut raw_config = load_from_path(&path)?;
    apply_env_overrides(&mut raw_config, |key| std::env::var(key).ok())?;
    let config = ConfigFile::try_from(raw_config)?;
    Ok(config)
}

/// Like [`load_and_validate`], but a missing file yields the defaults
/// (still subject to environment overrides).
pub fn load_or_default(path: impl AsRef<Path>) -> Result<ConfigFile> {
    let path = path.as_ref();
    if path.exists() {
        return load_and_validate(path);
    }

    debug!(path = %path.display(), "config file not found; using defaults");
    let mut raw_config = RawConfigFile::default();
    apply_env_overrides(&mut raw_config, |key| std::env::var(key).ok())?;
    ConfigFile::try_from(raw_config)
}

/// Default config location: `Calcdag.toml` in the current working directory.
pub fn default_config_path() -> PathBuf {
    PathBuf::from("Calcdag.toml")
}

/// Apply environment overrides on top of a parsed config.
///
/// `lookup` maps a variable name to its value; the process environment is
/// used in production, tests pass a closure over a map.
pub fn apply_env_overrides<F>(cfg: &mut RawConfigFile, lookup: F) -> Result<()>
where
    F: Fn(&str) -> Option<String>,
{
    override_u64(&lookup, "CALCDAG_ADDITION_MS", &mut cfg.durations.addition_ms)?;
    override_u64(&lookup, "CALCDAG_SUBTRACTION_MS", &mut cfg.durations.subtraction_ms)?;
    override_u64(
        &lookup,
        "CALCDAG_MULTIPLICATION_MS",
        &mut cfg.durations.multiplication_ms,
    )?;
    override_u64(&lookup, "CALCDAG_DIVISION_MS", &mut cfg.durations.division_ms)?;
    override_u64(&lookup, "CALCDAG_LEASE_TIMEOUT_MS", &mut cfg.engine.lease_timeout_ms)?;
    override_u64(&lookup, "CALCDAG_POLL_INTERVAL_MS", &mut cfg.agent.poll_interval_ms)?;

    if let Some(value) = lookup("CALCDAG_COMPUTING_POWER") {
        cfg.agent.computing_power = parse_env("CALCDAG_COMPUTING_POWER", &value)?;
    }

    Ok(())
}

fn override_u64<F>(lookup: &F, key: &str, slot: &mut u64) -> Result<()>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(value) = lookup(key) {
        *slot = parse_env(key, &value)?;
        debug!(key, value = *slot, "config overridden from environment");
    }
    Ok(())
}

fn parse_env<T: std::str::FromStr>(key: &str, value: &str) -> Result<T> {
    value.trim().parse().map_err(|_| {
        CalcError::ConfigError(format!(
            "environment variable {key} must be a non-negative integer (got {value:?})"
        ))
    })
}
