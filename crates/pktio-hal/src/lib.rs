//! Typed boundary to the kernel-bypass hardware abstraction layer.
//!
//! The layer itself (environment bring-up, packet buffer pools and ethernet
//! devices) is a black box. This crate describes it as a set of traits so the
//! runtime can drive any implementation, and converts the layer's raw
//! errno-style return codes into Rust `Result`s.
//!
//! # Architecture
//!
//! - [`types`]: port and pool identifiers, offload bitmasks, device info,
//!   port configuration and counters
//! - [`error`]: status translation and error types
//! - [`api`]: the [`Hal`] trait family ([`EnvApi`], [`MempoolApi`], [`EthDevApi`])
//! - [`sim`]: [`SimHal`], an in-process device model with fault injection
//!
//! # Example
//!
//! ```
//! use pktio_hal::{EnvApi, EthDevApi, SimHal, SimPort};
//!
//! let hal = SimHal::builder().port(SimPort::new("net_ring")).build();
//! hal.env_init(&["app".to_string()]).unwrap();
//! assert_eq!(hal.port_count_avail(), 1);
//! ```

pub mod api;
pub mod error;
pub mod sim;
pub mod types;

pub use api::{EnvApi, EthDevApi, Hal, MempoolApi, PoolSpec, MEMPOOL_CACHE_MAX_SIZE};
pub use error::{HalError, HalResult, HalStatus};
pub use sim::{Fault, HalCall, SimHal, SimHalBuilder, SimPort, SimPortState};
pub use types::{
    DeviceInfo, PoolHandle, PortConf, PortId, PortStats, RssHashFunctions, RxMqMode, RxOffloads,
    SocketId, TxMqMode, TxOffloads,
};
