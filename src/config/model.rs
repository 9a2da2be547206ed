// src/config/model.rs

use std::time::Duration;

use serde::Deserialize;

use crate::types::Operator;

/// Top-level configuration as read from a TOML file.
///
/// ```toml
/// [durations]
/// addition_ms = 1000
/// subtraction_ms = 1000
/// multiplication_ms = 1500
/// division_ms = 2000
///
/// [engine]
/// lease_timeout_ms = 30000
///
/// [agent]
/// computing_power = 3
/// poll_interval_ms = 500
/// ```
///
/// All sections are optional and have the defaults shown above.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawConfigFile {
    #[serde(default)]
    pub durations: OperationDurations,

    #[serde(default)]
    pub engine: EngineSection,

    #[serde(default)]
    pub agent: AgentSection,
}

/// Validated configuration. Obtain one through `ConfigFile::try_from`.
#[derive(Debug, Clone)]
pub struct ConfigFile {
    pub durations: OperationDurations,
    pub engine: EngineSection,
    pub agent: AgentSection,
}

impl ConfigFile {
    pub(crate) fn new_unchecked(
        durations: OperationDurations,
        engine: EngineSection,
        agent: AgentSection,
    ) -> Self {
        Self {
            durations,
            engine,
            agent,
        }
    }
}

impl Default for ConfigFile {
    fn default() -> Self {
        let raw = RawConfigFile::default();
        Self::new_unchecked(raw.durations, raw.engine, raw.agent)
    }
}

/// `[durations]` section: simulated cost of each operator, handed to workers
/// with every dispatched task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct OperationDurations {
    #[serde(default = "default_addition_ms")]
    pub addition_ms: u64,

    #[serde(default = "default_subtraction_ms")]
    pub subtraction_ms: u64,

    #[serde(default = "default_multiplication_ms")]
    pub multiplication_ms: u64,

    #[serde(default = "default_division_ms")]
    pub division_ms: u64,
}

fn default_addition_ms() -> u64 {
    1000
}

fn default_subtraction_ms() -> u64 {
    1000
}

fn default_multiplication_ms() -> u64 {
    1500
}

fn default_division_ms() -> u64 {
    2000
}

impl Default for OperationDurations {
    fn default() -> Self {
        Self {
            addition_ms: default_addition_ms(),
            subtraction_ms: default_subtraction_ms(),
            multiplication_ms: default_multiplication_ms(),
            division_ms: default_division_ms(),
        }
    }
}

impl OperationDurations {
    /// All operators take zero time. Handy for tests.
    pub fn zero() -> Self {
        Self {
            addition_ms: 0,
            subtraction_ms: 0,
            multiplication_ms: 0,
            division_ms: 0,
        }
    }

    pub fn duration_for(&self, operator: Operator) -> u64 {
        match operator {
            Operator::Add => self.addition_ms,
            Operator::Sub => self.subtraction_ms,
            Operator::Mul => self.multiplication_ms,
            Operator::Div => self.division_ms,
        }
    }
}

/// `[engine]` section.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct EngineSection {
    /// How long a dispatched task may stay unreported before it is handed
    /// out again. `0` disables redelivery.
    #[serde(default = "default_lease_timeout_ms")]
    pub lease_timeout_ms: u64,
}

fn default_lease_timeout_ms() -> u64 {
    30_000
}

impl Default for EngineSection {
    fn default() -> Self {
        Self {
            lease_timeout_ms: default_lease_timeout_ms(),
        }
    }
}

impl EngineSection {
    pub fn lease_timeout(&self) -> Option<Duration> {
        if self.lease_timeout_ms == 0 {
            None
        } else {
            Some(Duration::from_millis(self.lease_timeout_ms))
        }
    }
}

/// `[agent]` section: the in-process worker pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct AgentSection {
    /// Number of concurrent workers.
    #[serde(default = "default_computing_power")]
    pub computing_power: usize,

    /// Delay between polls when no task is available (or a call failed).
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
}

fn default_computing_power() -> usize {
    3
}

fn default_poll_interval_ms() -> u64 {
    500
}

impl Default for AgentSection {
    fn default() -> Self {
        Self {
            computing_power: default_computing_power(),
            poll_interval_ms: default_poll_interval_ms(),
        }
    }
}

impl AgentSection {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}
