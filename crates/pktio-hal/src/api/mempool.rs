//! Packet buffer pools.

use crate::error::{HalError, HalResult};
use crate::types::{PoolHandle, SocketId};

/// Largest per-core cache a pool may be created with.
pub const MEMPOOL_CACHE_MAX_SIZE: u32 = 512;

/// Parameters of a packet buffer pool.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoolSpec {
    /// Unique pool name.
    pub name: String,
    /// Number of buffers.
    pub capacity: u32,
    /// Per-core cache size.
    pub cache_size: u32,
    /// Private area reserved after each buffer header.
    pub priv_size: u16,
    /// Data room of each buffer, headroom included.
    pub data_room_size: u16,
    /// Socket the pool memory is allocated on.
    pub socket: SocketId,
}

impl PoolSpec {
    /// Checks the parameters the layer would reject.
    pub fn validate(&self) -> HalResult<()> {
        if self.name.is_empty() {
            return Err(HalError::invalid_parameter("pool name is empty"));
        }
        if self.capacity == 0 {
            return Err(HalError::invalid_parameter("pool capacity is zero"));
        }
        if self.cache_size > MEMPOOL_CACHE_MAX_SIZE {
            return Err(HalError::invalid_parameter(format!(
                "cache size {} exceeds {}",
                self.cache_size, MEMPOOL_CACHE_MAX_SIZE
            )));
        }
        if self.cache_size > self.capacity {
            return Err(HalError::invalid_parameter(format!(
                "cache size {} exceeds capacity {}",
                self.cache_size, self.capacity
            )));
        }
        Ok(())
    }
}

/// Packet buffer pool management.
pub trait MempoolApi {
    /// Creates a pool. Fails if the name is taken or memory is exhausted.
    fn pool_create(&self, spec: &PoolSpec) -> HalResult<PoolHandle>;

    /// Frees a pool previously returned by [`MempoolApi::pool_create`].
    fn pool_free(&self, pool: PoolHandle);
}
