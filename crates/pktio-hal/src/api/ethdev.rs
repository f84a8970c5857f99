//! Ethernet device API.
//!
//! A port moves through configure, queue setup, start, stop and close in
//! that order. Implementations reject calls made out of order.

use crate::error::HalResult;
use crate::types::{DeviceInfo, PoolHandle, PortConf, PortId, PortStats, SocketId};

/// Ethernet device discovery, configuration and control.
pub trait EthDevApi {
    /// Number of ports the layer can drive.
    fn port_count_avail(&self) -> u16;

    /// Identifiers of every available port, in enumeration order.
    fn port_ids(&self) -> HalResult<Vec<PortId>>;

    /// Driver-reported capabilities of a port.
    fn dev_info(&self, port: PortId) -> HalResult<DeviceInfo>;

    /// Socket the port is attached to, or [`SocketId::ANY`] if unknown.
    fn port_socket_id(&self, port: PortId) -> SocketId;

    /// Applies port-level configuration and sets the queue counts.
    fn dev_configure(&self, port: PortId, nb_rx: u16, nb_tx: u16, conf: &PortConf)
        -> HalResult<()>;

    /// Provisions one receive queue backed by `pool`.
    fn rx_queue_setup(
        &self,
        port: PortId,
        queue: u16,
        nb_desc: u16,
        socket: SocketId,
        pool: PoolHandle,
    ) -> HalResult<()>;

    /// Provisions one transmit queue.
    fn tx_queue_setup(&self, port: PortId, queue: u16, nb_desc: u16, socket: SocketId)
        -> HalResult<()>;

    fn dev_start(&self, port: PortId) -> HalResult<()>;

    fn dev_stop(&self, port: PortId) -> HalResult<()>;

    /// Releases the port. It cannot be used again until the environment is
    /// re-initialized.
    fn dev_close(&self, port: PortId) -> HalResult<()>;

    fn promiscuous_enable(&self, port: PortId) -> HalResult<()>;

    /// Reads the basic hardware counters.
    fn stats_get(&self, port: PortId) -> HalResult<PortStats>;
}
