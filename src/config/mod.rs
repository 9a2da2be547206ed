// src/config/mod.rs

//! Configuration loading and validation for calcdag.
//!
//! Responsibilities:
//! - Define the TOML-backed data model (`model.rs`).
//! - Load a config file from disk and apply environment overrides (`loader.rs`).
//! - Validate basic sanity of the values (`validate.rs`).

pub mod loader;
pub mod model;
pub mod validate;

pub use loader::{apply_env_overrides, default_config_path, load_and_validate, load_from_path, load_or_default};
pub use model::{AgentSection, ConfigFile, EngineSection, OperationDurations, RawConfigFile};
pub use validate::validate_raw_config;
