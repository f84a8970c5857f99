//! Bootstrap and lifecycle controller for the packet I/O runtime.
//!
//! [`ResourceManager`] brings the hardware abstraction layer up in three
//! gated stages (environment, buffer pool, port discovery), then configures,
//! starts and stops every discovered port. Per-port failures never abort a
//! pass; they are logged and reported through [`PortReport`].
//!
//! ```
//! use std::sync::Arc;
//! use pktio_hal::{SimHal, SimPort};
//! use pktio_runtime::{ResourceManager, RuntimeConfig};
//!
//! let hal = Arc::new(SimHal::builder().ports(2, SimPort::new("net_sim")).build());
//! let mut manager = ResourceManager::new(hal);
//! manager.initialize(RuntimeConfig::default()).unwrap();
//!
//! let report = manager.configure_ports().unwrap();
//! assert!(report.all_succeeded());
//! assert!(manager.start_ports().unwrap().all_succeeded());
//! manager.stop_ports();
//! manager.cleanup();
//! ```

pub mod audit;
pub mod config;
pub mod error;
pub mod manager;

pub use config::{EnvironmentConfig, PoolConfig, PortRingConfig, RuntimeConfig};
pub use error::{Result, RuntimeError};
pub use manager::{
    LifecycleStats, PortFailure, PortOutcome, PortReport, PortStage, ResourceManager,
};
