//! Status translation and error types for layer calls.
//!
//! The layer reports failures as negated errno values (`-EINVAL`, `-ENOMEM`,
//! ...). This module turns those raw codes into [`HalStatus`] and
//! [`HalError`] so callers can use `?` instead of checking integers.

use std::fmt;
use thiserror::Error;

use crate::types::PortId;

/// Status codes returned by the layer, as negated errno values.
#[repr(i32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HalStatus {
    Success = 0,
    NotPermitted = -1,
    NoEntry = -2,
    Io = -5,
    TryAgain = -11,
    NoMemory = -12,
    Fault = -14,
    Busy = -16,
    Exists = -17,
    NoDevice = -19,
    InvalidArgument = -22,
    NoSpace = -28,
    NotSupported = -95,
    Already = -114,
    /// Any code not listed above.
    Unknown = i32::MIN,
}

impl HalStatus {
    /// Creates a HalStatus from a raw return code.
    ///
    /// Non-negative values are success, matching the layer's convention of
    /// returning a count or zero on success.
    pub fn from_raw(code: i32) -> Self {
        match code {
            c if c >= 0 => HalStatus::Success,
            -1 => HalStatus::NotPermitted,
            -2 => HalStatus::NoEntry,
            -5 => HalStatus::Io,
            -11 => HalStatus::TryAgain,
            -12 => HalStatus::NoMemory,
            -14 => HalStatus::Fault,
            -16 => HalStatus::Busy,
            -17 => HalStatus::Exists,
            -19 => HalStatus::NoDevice,
            -22 => HalStatus::InvalidArgument,
            -28 => HalStatus::NoSpace,
            -95 => HalStatus::NotSupported,
            -114 => HalStatus::Already,
            _ => HalStatus::Unknown,
        }
    }

    /// Returns true if the status indicates success.
    pub fn is_success(&self) -> bool {
        *self == HalStatus::Success
    }

    /// Converts to a Result, attributing a failure to `op`.
    pub fn into_result(self, op: &'static str) -> HalResult<()> {
        if self.is_success() {
            Ok(())
        } else {
            Err(HalError::Status { op, status: self })
        }
    }
}

impl fmt::Display for HalStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            HalStatus::Success => "Success",
            HalStatus::NotPermitted => "Operation not permitted",
            HalStatus::NoEntry => "No such file or directory",
            HalStatus::Io => "Input/output error",
            HalStatus::TryAgain => "Resource temporarily unavailable",
            HalStatus::NoMemory => "Cannot allocate memory",
            HalStatus::Fault => "Bad address",
            HalStatus::Busy => "Device or resource busy",
            HalStatus::Exists => "File exists",
            HalStatus::NoDevice => "No such device",
            HalStatus::InvalidArgument => "Invalid argument",
            HalStatus::NoSpace => "No space left on device",
            HalStatus::NotSupported => "Operation not supported",
            HalStatus::Already => "Operation already in progress",
            HalStatus::Unknown => "Unknown error",
        };
        write!(f, "{}", s)
    }
}

/// Error type for layer operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HalError {
    /// A layer call returned an error status.
    #[error("{op} failed: {status}")]
    Status {
        /// The layer operation that failed.
        op: &'static str,
        status: HalStatus,
    },

    /// A parameter was rejected before reaching the layer.
    #[error("Invalid parameter: {message}")]
    InvalidParameter { message: String },

    /// The port identifier does not name a usable device.
    #[error("No such port: {port}")]
    NoSuchPort { port: PortId },

    /// Internal error.
    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl HalError {
    /// Creates an error for `op` from a status.
    pub fn status(op: &'static str, status: HalStatus) -> Self {
        HalError::Status { op, status }
    }

    /// Creates an invalid parameter error with a message.
    pub fn invalid_parameter(message: impl Into<String>) -> Self {
        HalError::InvalidParameter {
            message: message.into(),
        }
    }

    /// Creates a no such port error.
    pub fn no_such_port(port: PortId) -> Self {
        HalError::NoSuchPort { port }
    }

    /// Creates an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        HalError::Internal {
            message: message.into(),
        }
    }

    /// Returns the underlying status if this is a Status error.
    pub fn hal_status(&self) -> Option<HalStatus> {
        match self {
            HalError::Status { status, .. } => Some(*status),
            HalError::NoSuchPort { .. } => Some(HalStatus::NoDevice),
            HalError::InvalidParameter { .. } => Some(HalStatus::InvalidArgument),
            HalError::Internal { .. } => None,
        }
    }

    /// Returns true if this error is retryable.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            HalError::Status {
                status: HalStatus::TryAgain | HalStatus::Busy | HalStatus::NoMemory,
                ..
            }
        )
    }
}

/// Result type for layer operations.
pub type HalResult<T> = Result<T, HalError>;
