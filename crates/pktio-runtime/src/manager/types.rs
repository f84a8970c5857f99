//! Per-port outcome reporting and lifecycle counters.

use pktio_hal::{HalError, PortId};
use std::fmt;

/// Step of a per-port pass at which a failure occurred.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PortStage {
    DevInfo,
    Configure,
    RxQueueSetup,
    TxQueueSetup,
    Start,
    Promiscuous,
    Stop,
    Close,
}

impl PortStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            PortStage::DevInfo => "dev_info",
            PortStage::Configure => "configure",
            PortStage::RxQueueSetup => "rx_queue_setup",
            PortStage::TxQueueSetup => "tx_queue_setup",
            PortStage::Start => "start",
            PortStage::Promiscuous => "promiscuous",
            PortStage::Stop => "stop",
            PortStage::Close => "close",
        }
    }
}

impl fmt::Display for PortStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A failed step on one port.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortFailure {
    pub stage: PortStage,
    pub error: HalError,
}

impl PortFailure {
    pub fn new(stage: PortStage, error: HalError) -> Self {
        Self { stage, error }
    }
}

impl fmt::Display for PortFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.stage, self.error)
    }
}

/// Result of one pass over a single port.
///
/// `completed` is true when the pass's primary action took effect (queues
/// provisioned, port started, port closed). A completed port may still carry
/// failures from best-effort steps.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortOutcome {
    pub port: PortId,
    pub completed: bool,
    pub failures: Vec<PortFailure>,
}

impl PortOutcome {
    pub fn completed(port: PortId) -> Self {
        Self {
            port,
            completed: true,
            failures: Vec::new(),
        }
    }

    pub fn skipped(port: PortId, failure: PortFailure) -> Self {
        Self {
            port,
            completed: false,
            failures: vec![failure],
        }
    }

    pub fn with_failure(mut self, failure: PortFailure) -> Self {
        self.failures.push(failure);
        self
    }

    pub fn is_clean(&self) -> bool {
        self.completed && self.failures.is_empty()
    }

    /// Completed, but a best-effort step failed.
    pub fn is_degraded(&self) -> bool {
        self.completed && !self.failures.is_empty()
    }
}

/// Outcomes of a pass over every discovered port, in discovery order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PortReport {
    outcomes: Vec<PortOutcome>,
}

impl PortReport {
    pub fn outcomes(&self) -> &[PortOutcome] {
        &self.outcomes
    }

    pub fn outcome(&self, port: PortId) -> Option<&PortOutcome> {
        self.outcomes.iter().find(|o| o.port == port)
    }

    pub fn len(&self) -> usize {
        self.outcomes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }

    /// True if every port completed without any failure. Vacuously true for
    /// an empty report.
    pub fn all_succeeded(&self) -> bool {
        self.outcomes.iter().all(PortOutcome::is_clean)
    }

    /// Ports whose primary action took effect.
    pub fn succeeded(&self) -> Vec<PortId> {
        self.outcomes
            .iter()
            .filter(|o| o.completed)
            .map(|o| o.port)
            .collect()
    }

    /// Ports left out of the pass.
    pub fn skipped(&self) -> Vec<PortId> {
        self.outcomes
            .iter()
            .filter(|o| !o.completed)
            .map(|o| o.port)
            .collect()
    }

    pub fn degraded(&self) -> Vec<PortId> {
        self.outcomes
            .iter()
            .filter(|o| o.is_degraded())
            .map(|o| o.port)
            .collect()
    }

    /// Every failure with the port it occurred on.
    pub fn failures(&self) -> impl Iterator<Item = (PortId, &PortFailure)> {
        self.outcomes
            .iter()
            .flat_map(|o| o.failures.iter().map(move |f| (o.port, f)))
    }
}

impl FromIterator<PortOutcome> for PortReport {
    fn from_iter<I: IntoIterator<Item = PortOutcome>>(iter: I) -> Self {
        Self {
            outcomes: iter.into_iter().collect(),
        }
    }
}

/// Counters kept by the resource manager across its lifetime.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LifecycleStats {
    pub initializations: u64,
    pub failed_initializations: u64,
    pub cleanups: u64,
    pub ports_configured: u64,
    pub ports_started: u64,
    pub ports_stopped: u64,
}
