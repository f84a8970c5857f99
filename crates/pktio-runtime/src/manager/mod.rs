//! Resource manager and the stages it sequences.
//!
//! Bring-up runs bootstrap, pool allocation and discovery in that order;
//! each stage lives in its own module and talks to the layer only through
//! the narrow trait it needs.

pub mod bootstrap;
pub mod configurator;
pub mod discovery;
pub mod lifecycle;
pub mod orch;
pub mod pool;
pub mod stats;
pub mod types;

pub use orch::ResourceManager;
pub use types::{LifecycleStats, PortFailure, PortOutcome, PortReport, PortStage};
