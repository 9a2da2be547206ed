// src/config/validate.rs

use crate::config::model::{ConfigFile, RawConfigFile};
use crate::errors::{CalcError, Result};

impl TryFrom<RawConfigFile> for ConfigFile {
    type Error = crate::errors::CalcError;

    fn try_from(raw: RawConfigFile) -> std::result::Result<Self, Self::Error> {
        validate_raw_config(&raw)?;
        Ok(ConfigFile::new_unchecked(raw.durations, raw.engine, raw.agent))
    }
}

pub fn validate_raw_config(cfg: &RawConfigFile) -> Result<()> {
    validate_agent(cfg)?;
    Ok(())
}

fn validate_agent(cfg: &RawConfigFile) -> Result<()> {
    if cfg.agent.computing_power == 0 {
        return Err(CalcError::ConfigError(
            "[agent].computing_power must be >= 1 (got 0)".to_string(),
        ));
    }

    if cfg.agent.poll_interval_ms == 0 {
        return Err(CalcError::ConfigError(
            "[agent].poll_interval_ms must be >= 1 (got 0)".to_string(),
        ));
    }

    Ok(())
}
