//! Configuration for atlasfn
//!
//! Two layers of configuration:
//! - [`Config`]: where and how the TCP transport connects
//! - [`FunctionsConfig`]: the collaborators injected into the function façade

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use crate::codec::Codec;
use crate::network::Transport;

/// Connection configuration for the TCP transport
#[derive(Debug, Clone)]
pub struct Config {
    // -------------------------------------------------------------------------
    // Endpoints
    // -------------------------------------------------------------------------
    /// Primary (authoritative) node address, e.g. "127.0.0.1:6379".
    /// Every mutating command goes here.
    pub addr: String,

    /// Read replicas. Read-only commands are spread over these when present.
    pub replica_addrs: Vec<String>,

    // -------------------------------------------------------------------------
    // Pool Configuration
    // -------------------------------------------------------------------------
    /// Max idle connections kept per node
    pub max_idle: usize,

    /// Max total connections (idle + in use) per node
    pub max_total: usize,

    // -------------------------------------------------------------------------
    // Timeouts (milliseconds, 0 disables)
    // -------------------------------------------------------------------------
    pub connect_timeout_ms: u64,

    pub read_timeout_ms: u64,

    pub write_timeout_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            addr: "127.0.0.1:6379".to_string(),
            replica_addrs: Vec::new(),
            max_idle: 8,
            max_total: 16,
            connect_timeout_ms: 5000,
            read_timeout_ms: 5000,
            write_timeout_ms: 5000,
        }
    }
}

impl Config {
    /// Create a new config builder
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    pub fn connect_timeout(&self) -> Option<Duration> {
        millis(self.connect_timeout_ms)
    }

    pub fn read_timeout(&self) -> Option<Duration> {
        millis(self.read_timeout_ms)
    }

    pub fn write_timeout(&self) -> Option<Duration> {
        millis(self.write_timeout_ms)
    }
}

fn millis(ms: u64) -> Option<Duration> {
    (ms > 0).then(|| Duration::from_millis(ms))
}

/// Builder for Config
#[derive(Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Set the primary node address
    pub fn addr(mut self, addr: impl Into<String>) -> Self {
        self.config.addr = addr.into();
        self
    }

    /// Add a read replica address
    pub fn replica(mut self, addr: impl Into<String>) -> Self {
        self.config.replica_addrs.push(addr.into());
        self
    }

    /// Set the maximum number of idle connections per node
    pub fn max_idle(mut self, count: usize) -> Self {
        self.config.max_idle = count;
        self
    }

    /// Set the maximum number of connections per node
    pub fn max_total(mut self, count: usize) -> Self {
        self.config.max_total = count;
        self
    }

    /// Set the connect timeout (in milliseconds)
    pub fn connect_timeout_ms(mut self, ms: u64) -> Self {
        self.config.connect_timeout_ms = ms;
        self
    }

    /// Set the read timeout (in milliseconds)
    pub fn read_timeout_ms(mut self, ms: u64) -> Self {
        self.config.read_timeout_ms = ms;
        self
    }

    /// Set the write timeout (in milliseconds)
    pub fn write_timeout_ms(mut self, ms: u64) -> Self {
        self.config.write_timeout_ms = ms;
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}

/// Collaborators required by [`crate::function::Functions`].
///
/// All three are mandatory. `codec` handles VALUE/LIST payloads and
/// `map_value_codec` handles MAPVALUE/MAPVALUELIST payloads; which one is
/// used is decided by the declared return type only.
#[derive(Clone)]
pub struct FunctionsConfig {
    pub transport: Arc<dyn Transport>,
    pub codec: Arc<dyn Codec>,
    pub map_value_codec: Arc<dyn Codec>,
}

impl FunctionsConfig {
    pub fn new(
        transport: Arc<dyn Transport>,
        codec: Arc<dyn Codec>,
        map_value_codec: Arc<dyn Codec>,
    ) -> Self {
        Self {
            transport,
            codec,
            map_value_codec,
        }
    }
}

impl fmt::Debug for FunctionsConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FunctionsConfig")
            .field("codec", &self.codec.name())
            .field("map_value_codec", &self.map_value_codec.name())
            .finish_non_exhaustive()
    }
}
