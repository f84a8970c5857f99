//! Packet buffer pool allocation.

use crate::audit::{AuditCategory, AuditOutcome, AuditRecord};
use crate::config::PoolConfig;
use crate::error::{Result, RuntimeError};
use crate::{audit_log, error_log, info_log};
use pktio_hal::{EnvApi, MempoolApi, PoolHandle};

/// Creates the runtime's single pool on the calling thread's socket.
pub fn create_pool<H: EnvApi + MempoolApi + ?Sized>(hal: &H, config: &PoolConfig) -> Result<PoolHandle> {
    let spec = config.to_spec(hal.socket_id());

    match hal.pool_create(&spec) {
        Ok(pool) => {
            info_log!(
                "PoolAllocator",
                name = %spec.name,
                capacity = spec.capacity,
                cache_size = spec.cache_size,
                data_room_size = spec.data_room_size,
                socket = %spec.socket,
                "Buffer pool created"
            );
            audit_log!(
                AuditRecord::new(AuditCategory::ResourceCreate, "PoolAllocator", "pool_create")
                    .with_outcome(AuditOutcome::Success)
                    .with_object_id(spec.name.clone())
                    .with_object_type("mempool")
                    .with_details(serde_json::json!({
                        "handle": pool.to_string(),
                        "capacity": spec.capacity,
                        "cache_size": spec.cache_size,
                        "priv_size": spec.priv_size,
                        "data_room_size": spec.data_room_size,
                        "socket": spec.socket.as_raw(),
                    }))
            );
            Ok(pool)
        }
        Err(e) => {
            error_log!("PoolAllocator", name = %spec.name, error = %e, "Failed to create buffer pool");
            audit_log!(
                AuditRecord::new(AuditCategory::ResourceCreate, "PoolAllocator", "pool_create")
                    .with_object_id(spec.name.clone())
                    .with_object_type("mempool")
                    .with_error(e.to_string())
            );
            Err(RuntimeError::PoolCreate(e))
        }
    }
}

pub fn release_pool<H: MempoolApi + ?Sized>(hal: &H, pool: PoolHandle) {
    hal.pool_free(pool);
    info_log!("PoolAllocator", handle = %pool, "Buffer pool released");
    audit_log!(
        AuditRecord::new(AuditCategory::ResourceDelete, "PoolAllocator", "pool_free")
            .with_outcome(AuditOutcome::Success)
            .with_object_id(pool.to_string())
            .with_object_type("mempool")
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use pktio_hal::{Fault, SimHal, SocketId};

    fn hal_on(socket: SocketId) -> SimHal {
        let hal = SimHal::builder().socket(socket).build();
        hal.env_init(&["app".to_string()]).unwrap();
        hal
    }

    #[test]
    fn test_pool_pinned_to_caller_socket() {
        let hal = hal_on(SocketId::new(1));
        let pool = create_pool(&hal, &PoolConfig::default()).unwrap();

        let spec = hal.pool_spec(pool).unwrap();
        assert_eq!(spec.socket, SocketId::new(1));
        assert_eq!(spec.name, "MBUF_POOL");
        assert_eq!(spec.capacity, 8192);
    }

    #[test]
    fn test_pool_failure() {
        let hal = hal_on(SocketId::new(0));
        hal.inject(Fault::PoolCreate);

        let err = create_pool(&hal, &PoolConfig::default()).unwrap_err();
        assert!(matches!(err, RuntimeError::PoolCreate(_)));
        assert!(hal.pool_names().is_empty());
    }

    #[test]
    fn test_release() {
        let hal = hal_on(SocketId::new(0));
        let pool = create_pool(&hal, &PoolConfig::default()).unwrap();
        release_pool(&hal, pool);
        assert!(hal.pool_spec(pool).is_none());
    }
}
