//! Per-port traffic counters.

use crate::{info_log, warn_log};
use pktio_hal::{EthDevApi, PortId, PortStats};

/// Reads and logs a port's counters. Returns `None` if the query failed.
pub fn port_stats<H: EthDevApi + ?Sized>(hal: &H, port: PortId) -> Option<PortStats> {
    match hal.stats_get(port) {
        Ok(stats) => {
            info_log!(
                "StatsReporter",
                port = %port,
                ipackets = stats.ipackets,
                opackets = stats.opackets,
                ibytes = stats.ibytes,
                obytes = stats.obytes,
                ierrors = stats.ierrors,
                oerrors = stats.oerrors,
                imissed = stats.imissed,
                rx_nombuf = stats.rx_nombuf,
                "Port statistics"
            );
            Some(stats)
        }
        Err(e) => {
            warn_log!("StatsReporter", port = %port, error = %e, "Failed to read port statistics");
            None
        }
    }
}

/// Reports every port in `ports`, in order, skipping ports whose query failed.
pub fn report_all<H: EthDevApi + ?Sized>(hal: &H, ports: &[PortId]) -> Vec<(PortId, PortStats)> {
    ports
        .iter()
        .filter_map(|&port| port_stats(hal, port).map(|stats| (port, stats)))
        .collect()
}
