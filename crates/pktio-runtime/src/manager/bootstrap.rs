//! Environment bring-up and teardown.

use crate::audit::{AuditCategory, AuditOutcome, AuditRecord};
use crate::config::EnvironmentConfig;
use crate::error::{Result, RuntimeError};
use crate::{audit_log, debug_log, error_log, info_log, warn_log};
use pktio_hal::EnvApi;

/// Initializes the layer's environment.
///
/// An empty argument list is replaced by the configured fallback set. A
/// failure here is fatal to initialization.
pub fn bootstrap_environment<H: EnvApi + ?Sized>(hal: &H, env: &EnvironmentConfig) -> Result<()> {
    if env.args.is_empty() {
        info_log!("Bootstrap", "No environment arguments supplied, using fallback set");
    }
    let args = env.effective_args();
    debug_log!("Bootstrap", args = ?args, "Initializing environment");

    match hal.env_init(args) {
        Ok(consumed) => {
            info_log!(
                "Bootstrap",
                consumed = consumed,
                socket = %hal.socket_id(),
                "Environment initialized"
            );
            audit_log!(
                AuditRecord::new(AuditCategory::SystemLifecycle, "Bootstrap", "env_init")
                    .with_outcome(AuditOutcome::Success)
                    .with_object_type("environment")
                    .with_details(serde_json::json!({ "args": args }))
            );
            Ok(())
        }
        Err(e) => {
            error_log!("Bootstrap", error = %e, "Failed to initialize environment");
            audit_log!(
                AuditRecord::new(AuditCategory::SystemLifecycle, "Bootstrap", "env_init")
                    .with_object_type("environment")
                    .with_error(e.to_string())
            );
            Err(RuntimeError::Bootstrap(e))
        }
    }
}

/// Releases the environment. Failures are logged, never returned.
pub fn teardown_environment<H: EnvApi + ?Sized>(hal: &H) {
    match hal.env_cleanup() {
        Ok(()) => {
            info_log!("Bootstrap", "Environment released");
            audit_log!(
                AuditRecord::new(AuditCategory::SystemLifecycle, "Bootstrap", "env_cleanup")
                    .with_outcome(AuditOutcome::Success)
                    .with_object_type("environment")
            );
        }
        Err(e) => {
            warn_log!("Bootstrap", error = %e, "Environment teardown failed");
        }
    }
}
