//! Trait surface of the hardware abstraction layer.
//!
//! The layer is split the same way its native API is:
//!
//! - [`env`]: environment bring-up and teardown
//! - [`mempool`]: packet buffer pools
//! - [`ethdev`]: ethernet device discovery, configuration and control
//!
//! [`Hal`] bundles all three so callers can take one generic parameter.

pub mod env;
pub mod ethdev;
pub mod mempool;

pub use env::EnvApi;
pub use ethdev::EthDevApi;
pub use mempool::{MempoolApi, PoolSpec, MEMPOOL_CACHE_MAX_SIZE};

/// Full layer surface used by the runtime.
pub trait Hal: EnvApi + MempoolApi + EthDevApi + Send + Sync {}

impl<T> Hal for T where T: EnvApi + MempoolApi + EthDevApi + Send + Sync {}
