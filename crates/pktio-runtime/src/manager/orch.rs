//! Resource manager: owns the environment, pool and port list.

use super::bootstrap::{bootstrap_environment, teardown_environment};
use super::configurator::configure_port;
use super::discovery::discover_ports;
use super::lifecycle::{start_port, stop_port};
use super::pool::{create_pool, release_pool};
use super::stats;
use super::types::{LifecycleStats, PortReport};
use crate::audit::{AuditCategory, AuditOutcome, AuditRecord};
use crate::config::RuntimeConfig;
use crate::error::{Result, RuntimeError};
use crate::{audit_log, debug_log, error_log, info_log};
use pktio_hal::{Hal, PoolHandle, PortId, PortStats};
use std::sync::Arc;

/// Sequences bring-up and teardown and owns every resource acquired.
///
/// One manager drives one layer instance. Lifecycle operations take
/// `&mut self`; dropping the manager runs [`ResourceManager::cleanup`].
pub struct ResourceManager<H: Hal> {
    hal: Arc<H>,
    config: Option<RuntimeConfig>,
    initialized: bool,
    pool: Option<PoolHandle>,
    port_ids: Vec<PortId>,
    /// Set once a stop pass has closed the ports; cleared by initialize.
    ports_closed: bool,
    stats: LifecycleStats,
}

impl<H: Hal> ResourceManager<H> {
    pub fn new(hal: Arc<H>) -> Self {
        Self {
            hal,
            config: None,
            initialized: false,
            pool: None,
            port_ids: Vec::new(),
            ports_closed: false,
            stats: LifecycleStats::default(),
        }
    }

    /// Brings the environment up, creates the pool and discovers ports.
    ///
    /// Returns immediately if already initialized; `config` is ignored in
    /// that case. On failure every resource acquired so far is released in
    /// reverse order and the manager stays uninitialized.
    pub fn initialize(&mut self, config: RuntimeConfig) -> Result<()> {
        if self.initialized {
            debug_log!("ResourceManager", "Already initialized");
            return Ok(());
        }

        info_log!("ResourceManager", "Initializing");
        match self.bring_up(&config) {
            Ok((pool, port_ids)) => {
                info_log!(
                    "ResourceManager",
                    pool = %pool,
                    ports = port_ids.len(),
                    "Initialization complete"
                );
                audit_log!(
                    AuditRecord::new(AuditCategory::SystemLifecycle, "ResourceManager", "initialize")
                        .with_outcome(AuditOutcome::Success)
                        .with_details(serde_json::json!({
                            "pool": config.pool.name,
                            "ports": port_ids.iter().map(|p| p.as_raw()).collect::<Vec<_>>(),
                            "rx_ring_size": config.ports.rx_ring_size,
                            "tx_ring_size": config.ports.tx_ring_size,
                        }))
                );

                self.pool = Some(pool);
                self.port_ids = port_ids;
                self.ports_closed = false;
                self.config = Some(config);
                self.initialized = true;
                self.stats.initializations += 1;
                Ok(())
            }
            Err(e) => {
                error_log!("ResourceManager", error = %e, "Initialization failed");
                audit_log!(
                    AuditRecord::new(AuditCategory::SystemLifecycle, "ResourceManager", "initialize")
                        .with_error(e.to_string())
                );
                self.stats.failed_initializations += 1;
                Err(e)
            }
        }
    }

    fn bring_up(&self, config: &RuntimeConfig) -> Result<(PoolHandle, Vec<PortId>)> {
        config.validate()?;

        let hal = self.hal.as_ref();
        bootstrap_environment(hal, &config.environment)?;

        let pool = match create_pool(hal, &config.pool) {
            Ok(pool) => pool,
            Err(e) => {
                teardown_environment(hal);
                return Err(e);
            }
        };

        match discover_ports(hal) {
            Ok(port_ids) => Ok((pool, port_ids)),
            Err(e) => {
                release_pool(hal, pool);
                teardown_environment(hal);
                Err(e)
            }
        }
    }

    /// Stops all ports, releases the pool and tears the environment down.
    ///
    /// No-op when not initialized.
    pub fn cleanup(&mut self) {
        if !self.initialized {
            return;
        }

        info_log!("ResourceManager", "Cleaning up");
        self.stop_ports();

        if let Some(pool) = self.pool.take() {
            release_pool(self.hal.as_ref(), pool);
        }
        teardown_environment(self.hal.as_ref());

        self.port_ids.clear();
        self.ports_closed = false;
        self.config = None;
        self.initialized = false;
        self.stats.cleanups += 1;

        audit_log!(
            AuditRecord::new(AuditCategory::SystemLifecycle, "ResourceManager", "cleanup")
                .with_outcome(AuditOutcome::Success)
        );
    }

    /// Negotiates offloads and provisions one queue pair on every port.
    ///
    /// Ports that fail are skipped; the call still succeeds. Inspect the
    /// returned report to tell a clean pass from a partial one.
    pub fn configure_ports(&mut self) -> Result<PortReport> {
        let (pool, config) = match (self.pool, self.config.as_ref()) {
            (Some(pool), Some(config)) if self.initialized => (pool, config),
            _ => {
                error_log!("ResourceManager", "Cannot configure ports: not initialized");
                return Err(RuntimeError::NotInitialized);
            }
        };

        let hal = self.hal.as_ref();
        let report: PortReport = self
            .port_ids
            .iter()
            .map(|&port| configure_port(hal, port, &config.ports, pool))
            .collect();

        self.stats.ports_configured += report.succeeded().len() as u64;
        audit_pass(AuditCategory::ConfigurationChange, "configure_ports", &report);
        Ok(report)
    }

    /// Starts every port and enables promiscuous mode on it.
    pub fn start_ports(&mut self) -> Result<PortReport> {
        if !self.initialized {
            error_log!("ResourceManager", "Cannot start ports: not initialized");
            return Err(RuntimeError::NotInitialized);
        }

        let hal = self.hal.as_ref();
        let report: PortReport = self
            .port_ids
            .iter()
            .map(|&port| start_port(hal, port))
            .collect();

        self.stats.ports_started += report.succeeded().len() as u64;
        audit_pass(AuditCategory::PortLifecycle, "start_ports", &report);
        Ok(report)
    }

    /// Stops and closes every port. Never fails; safe to call at any time.
    ///
    /// Closed ports stay closed until the next initialize, so later calls
    /// return an empty report without touching the layer.
    pub fn stop_ports(&mut self) -> PortReport {
        if self.ports_closed {
            debug_log!("ResourceManager", "Ports already closed");
            return PortReport::default();
        }

        let hal = self.hal.as_ref();
        let report: PortReport = self
            .port_ids
            .iter()
            .map(|&port| stop_port(hal, port))
            .collect();

        if !report.is_empty() {
            self.ports_closed = true;
            self.stats.ports_stopped += report.succeeded().len() as u64;
            audit_pass(AuditCategory::PortLifecycle, "stop_ports", &report);
        }
        report
    }

    /// Reads and logs one port's counters.
    pub fn port_stats(&self, port: PortId) -> Option<PortStats> {
        stats::port_stats(self.hal.as_ref(), port)
    }

    /// Reads and logs counters for every discovered port.
    pub fn report_all_stats(&self) -> Vec<(PortId, PortStats)> {
        stats::report_all(self.hal.as_ref(), &self.port_ids)
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    pub fn pool(&self) -> Option<PoolHandle> {
        self.pool
    }

    pub fn port_count(&self) -> usize {
        self.port_ids.len()
    }

    /// Port at ordinal `index` in discovery order.
    pub fn port_id(&self, index: usize) -> Result<PortId> {
        self.port_ids
            .get(index)
            .copied()
            .ok_or(RuntimeError::IndexOutOfRange {
                index,
                count: self.port_ids.len(),
            })
    }

    pub fn port_ids(&self) -> &[PortId] {
        &self.port_ids
    }

    /// Configuration applied by the last successful initialize.
    pub fn config(&self) -> Option<&RuntimeConfig> {
        self.config.as_ref()
    }

    pub fn hal(&self) -> &Arc<H> {
        &self.hal
    }

    pub fn stats(&self) -> &LifecycleStats {
        &self.stats
    }
}

impl<H: Hal> Drop for ResourceManager<H> {
    fn drop(&mut self) {
        self.cleanup();
    }
}

fn audit_pass(category: AuditCategory, action: &str, report: &PortReport) {
    let skipped = report.skipped();
    let outcome = if report.all_succeeded() {
        AuditOutcome::Success
    } else if !report.is_empty() && skipped.len() == report.len() {
        AuditOutcome::Failure
    } else {
        AuditOutcome::Partial
    };

    audit_log!(
        AuditRecord::new(category, "ResourceManager", action)
            .with_outcome(outcome)
            .with_object_type("port")
            .with_details(serde_json::json!({
                "ports": report.len(),
                "succeeded": report.succeeded().len(),
                "skipped": skipped.iter().map(|p| p.as_raw()).collect::<Vec<_>>(),
                "degraded": report.degraded().iter().map(|p| p.as_raw()).collect::<Vec<_>>(),
                "failures": report
                    .failures()
                    .map(|(port, f)| format!("port {}: {}", port, f))
                    .collect::<Vec<_>>(),
            }))
    );
}
