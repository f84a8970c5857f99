//! Port discovery.

use crate::audit::{AuditCategory, AuditOutcome, AuditRecord};
use crate::error::{Result, RuntimeError};
use crate::{audit_log, error_log, info_log, warn_log};
use pktio_hal::{EthDevApi, PortId};

/// Enumerates the ports the layer exposes.
///
/// No ports is a valid result. A port whose device info cannot be read is
/// still recorded.
pub fn discover_ports<H: EthDevApi + ?Sized>(hal: &H) -> Result<Vec<PortId>> {
    let count = hal.port_count_avail();
    if count == 0 {
        info_log!("PortDiscovery", "No ports available");
        return Ok(Vec::new());
    }

    let ports = hal.port_ids().map_err(|e| {
        error_log!("PortDiscovery", error = %e, "Failed to enumerate ports");
        audit_log!(
            AuditRecord::new(AuditCategory::HalOperation, "PortDiscovery", "port_ids")
                .with_error(e.to_string())
        );
        RuntimeError::Discovery(e)
    })?;

    if ports.len() != usize::from(count) {
        warn_log!(
            "PortDiscovery",
            advertised = count,
            enumerated = ports.len(),
            "Advertised port count differs from enumeration"
        );
    }

    for &port in &ports {
        match hal.dev_info(port) {
            Ok(info) => info_log!(
                "PortDiscovery",
                port = %port,
                driver = %info.driver_name,
                socket = %hal.port_socket_id(port),
                "Found port"
            ),
            Err(e) => warn_log!(
                "PortDiscovery",
                port = %port,
                error = %e,
                "Failed to read device info"
            ),
        }
    }

    audit_log!(
        AuditRecord::new(AuditCategory::ResourceCreate, "PortDiscovery", "discover_ports")
            .with_outcome(AuditOutcome::Success)
            .with_object_type("port")
            .with_details(serde_json::json!({
                "ports": ports.iter().map(|p| p.as_raw()).collect::<Vec<_>>(),
            }))
    );
    Ok(ports)
}
