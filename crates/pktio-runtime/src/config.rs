//! Runtime configuration.
//!
//! Loads and validates the runtime configuration from TOML files.
//! Default location: /etc/pktio/pktio.toml

use crate::error::{Result, RuntimeError};
use crate::{info_log, warn_log};
use pktio_hal::{PoolSpec, SocketId, MEMPOOL_CACHE_MAX_SIZE};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Default configuration file location.
pub const DEFAULT_CONFIG_PATH: &str = "/etc/pktio/pktio.toml";

/// Per-port ring depths.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortRingConfig {
    /// Receive descriptors per queue
    #[serde(default = "default_rx_ring_size")]
    pub rx_ring_size: u16,

    /// Transmit descriptors per queue
    #[serde(default = "default_tx_ring_size")]
    pub tx_ring_size: u16,
}

/// Packet buffer pool parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolConfig {
    #[serde(default = "default_pool_name")]
    pub name: String,

    /// Number of buffers, independent of the port count
    #[serde(default = "default_pool_capacity")]
    pub capacity: u32,

    /// Per-core buffer cache
    #[serde(default = "default_cache_size")]
    pub cache_size: u32,

    /// Extra metadata bytes per buffer
    #[serde(default)]
    pub priv_size: u16,

    /// Payload capacity per buffer, headroom included
    #[serde(default = "default_data_room_size")]
    pub data_room_size: u16,
}

/// Layer bring-up arguments.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnvironmentConfig {
    /// Arguments passed to the layer; `args[0]` is the program name
    #[serde(default)]
    pub args: Vec<String>,

    /// Used when `args` is empty
    #[serde(default = "default_fallback_args")]
    pub fallback_args: Vec<String>,
}

/// Complete runtime configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuntimeConfig {
    #[serde(default)]
    pub ports: PortRingConfig,

    #[serde(default)]
    pub pool: PoolConfig,

    #[serde(default)]
    pub environment: EnvironmentConfig,
}

fn default_rx_ring_size() -> u16 {
    1024
}

fn default_tx_ring_size() -> u16 {
    1024
}

fn default_pool_name() -> String {
    "MBUF_POOL".to_string()
}

fn default_pool_capacity() -> u32 {
    8192
}

fn default_cache_size() -> u32 {
    256
}

// 2048 bytes of data plus 128 bytes of headroom
fn default_data_room_size() -> u16 {
    2176
}

fn default_fallback_args() -> Vec<String> {
    ["pktio", "-l", "0-3", "-n", "4"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

impl Default for PortRingConfig {
    fn default() -> Self {
        Self {
            rx_ring_size: default_rx_ring_size(),
            tx_ring_size: default_tx_ring_size(),
        }
    }
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            name: default_pool_name(),
            capacity: default_pool_capacity(),
            cache_size: default_cache_size(),
            priv_size: 0,
            data_room_size: default_data_room_size(),
        }
    }
}

impl Default for EnvironmentConfig {
    fn default() -> Self {
        Self {
            args: Vec::new(),
            fallback_args: default_fallback_args(),
        }
    }
}

impl PoolConfig {
    /// Pool parameters pinned to `socket`.
    pub fn to_spec(&self, socket: SocketId) -> PoolSpec {
        PoolSpec {
            name: self.name.clone(),
            capacity: self.capacity,
            cache_size: self.cache_size,
            priv_size: self.priv_size,
            data_room_size: self.data_room_size,
            socket,
        }
    }
}

impl EnvironmentConfig {
    /// Arguments actually handed to the layer.
    pub fn effective_args(&self) -> &[String] {
        if self.args.is_empty() {
            &self.fallback_args
        } else {
            &self.args
        }
    }
}

impl RuntimeConfig {
    /// Load configuration from file, falling back to defaults if file not found
    pub fn load_or_default(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        match fs::read_to_string(path) {
            Ok(content) => {
                let config = Self::from_toml_str(&content).map_err(|e| {
                    RuntimeError::Configuration(format!(
                        "Failed to parse config file {}: {}",
                        path.display(),
                        e
                    ))
                })?;
                info_log!("Config", path = %path.display(), "Loaded configuration");
                Ok(config)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                warn_log!(
                    "Config",
                    path = %path.display(),
                    "Config file not found, using defaults"
                );
                Ok(Self::default())
            }
            Err(e) => Err(RuntimeError::Io(e)),
        }
    }

    /// Load from default location or defaults
    pub fn load() -> Result<Self> {
        Self::load_or_default(DEFAULT_CONFIG_PATH)
    }

    /// Parse a TOML document; omitted fields take their defaults.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| RuntimeError::Configuration(e.to_string()))
    }

    /// Save configuration to file
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let content = toml::to_string_pretty(self).map_err(|e| {
            RuntimeError::Configuration(format!("Failed to serialize config: {}", e))
        })?;

        fs::write(path.as_ref(), content)?;

        Ok(())
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.ports.rx_ring_size == 0 {
            return Err(RuntimeError::Configuration(
                "ports.rx_ring_size must be > 0".to_string(),
            ));
        }

        if self.ports.tx_ring_size == 0 {
            return Err(RuntimeError::Configuration(
                "ports.tx_ring_size must be > 0".to_string(),
            ));
        }

        if self.pool.name.is_empty() {
            return Err(RuntimeError::Configuration(
                "pool.name must not be empty".to_string(),
            ));
        }

        if self.pool.capacity == 0 {
            return Err(RuntimeError::Configuration(
                "pool.capacity must be > 0".to_string(),
            ));
        }

        if self.pool.cache_size > MEMPOOL_CACHE_MAX_SIZE {
            return Err(RuntimeError::Configuration(format!(
                "pool.cache_size must be <= {}",
                MEMPOOL_CACHE_MAX_SIZE
            )));
        }

        if self.pool.cache_size > self.pool.capacity {
            return Err(RuntimeError::Configuration(
                "pool.cache_size must not exceed pool.capacity".to_string(),
            ));
        }

        if self.environment.effective_args().is_empty() {
            return Err(RuntimeError::Configuration(
                "environment.args and environment.fallback_args are both empty".to_string(),
            ));
        }

        Ok(())
    }
}
