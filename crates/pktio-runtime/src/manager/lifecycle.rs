//! Starting and stopping packet flow on a port.

use super::types::{PortFailure, PortOutcome, PortStage};
use crate::{info_log, warn_log};
use pktio_hal::{EthDevApi, PortId};

/// Starts a port, then enables promiscuous mode best-effort.
///
/// A port that fails to start is skipped. A port that starts but rejects
/// promiscuous mode is reported as completed with a failure.
pub fn start_port<H: EthDevApi + ?Sized>(hal: &H, port: PortId) -> PortOutcome {
    if let Err(e) = hal.dev_start(port) {
        warn_log!("PortLifecycle", port = %port, error = %e, "Failed to start port");
        return PortOutcome::skipped(port, PortFailure::new(PortStage::Start, e));
    }

    let outcome = PortOutcome::completed(port);
    match hal.promiscuous_enable(port) {
        Ok(()) => {
            info_log!("PortLifecycle", port = %port, "Port started");
            outcome
        }
        Err(e) => {
            warn_log!(
                "PortLifecycle",
                port = %port,
                error = %e,
                "Port started but promiscuous mode could not be enabled"
            );
            outcome.with_failure(PortFailure::new(PortStage::Promiscuous, e))
        }
    }
}

/// Stops a port and closes it whether or not the stop succeeded.
pub fn stop_port<H: EthDevApi + ?Sized>(hal: &H, port: PortId) -> PortOutcome {
    let stop = hal.dev_stop(port).err();
    if let Some(e) = &stop {
        warn_log!("PortLifecycle", port = %port, error = %e, "Failed to stop port");
    }

    let outcome = match hal.dev_close(port) {
        Ok(()) => {
            info_log!("PortLifecycle", port = %port, "Port closed");
            PortOutcome::completed(port)
        }
        Err(e) => {
            warn_log!("PortLifecycle", port = %port, error = %e, "Failed to close port");
            PortOutcome::skipped(port, PortFailure::new(PortStage::Close, e))
        }
    };

    match stop {
        Some(e) => outcome.with_failure(PortFailure::new(PortStage::Stop, e)),
        None => outcome,
    }
}
