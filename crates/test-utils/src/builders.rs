use std::sync::Arc;

use calcdag::config::{ConfigFile, OperationDurations, RawConfigFile};
use calcdag::engine::Engine;
use calcdag::storage::{MemoryStorage, Storage};

/// Builder for `ConfigFile` to simplify test setup.
///
/// Starts from zero operation durations so workers never sleep, and from
/// leases disabled so tests opt into redelivery explicitly.
pub struct ConfigFileBuilder {
    config: RawConfigFile,
}

impl ConfigFileBuilder {
    pub fn new() -> Self {
        let mut config = RawConfigFile::default();
        config.durations = OperationDurations::zero();
        config.engine.lease_timeout_ms = 0;
        Self { config }
    }

    pub fn with_durations(mut self, durations: OperationDurations) -> Self {
        self.config.durations = durations;
        self
    }

    pub fn with_lease_timeout_ms(mut self, ms: u64) -> Self {
        self.config.engine.lease_timeout_ms = ms;
        self
    }

    pub fn with_computing_power(mut self, workers: usize) -> Self {
        self.config.agent.computing_power = workers;
        self
    }

    pub fn with_poll_interval_ms(mut self, ms: u64) -> Self {
        self.config.agent.poll_interval_ms = ms;
        self
    }

    pub fn raw(self) -> RawConfigFile {
        self.config
    }

    pub fn build(self) -> ConfigFile {
        ConfigFile::try_from(self.config).expect("Failed to build valid config from builder")
    }

    /// Engine over a fresh `MemoryStorage`.
    pub fn engine(self) -> Engine {
        Engine::in_memory(self.build())
    }

    /// Engine over the given storage; keep a clone of the storage to inspect it.
    pub fn engine_with_storage<S: Storage + 'static>(self, storage: S) -> Engine {
        Engine::new(self.build(), Arc::new(storage))
    }

    /// Engine plus a handle on its `MemoryStorage`.
    pub fn engine_and_storage(self) -> (Engine, MemoryStorage) {
        let storage = MemoryStorage::new();
        let engine = self.engine_with_storage(storage.clone());
        (engine, storage)
    }
}

impl Default for ConfigFileBuilder {
    fn default() -> Self {
        Self::new()
    }
}
