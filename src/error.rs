//! Error types for the controller and the hardware boundary.
//!
//! Follows the same shape the firmware this crate grew out of used: one
//! enum per fallible boundary, manual `Display`, no `anyhow`/`thiserror` —
//! this crate's errors are all small closed sets callers are expected to
//! match on.

use std::fmt;

/// Misuse errors surfaced synchronously to the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ControllerError {
    /// `make_button` called with a `pin_id` already owned by this controller.
    PinAlreadyRegistered(u32),
    /// `delete_button` called with a button this controller does not own.
    ButtonNotOwned,
    /// `bounce_ms` supplied to `make_button` was negative.
    InvalidBounce,
    /// `run`/`start_in_thread` called while `status != Ready`.
    NotReady,
    /// The supplied hardware driver failed during setup.
    Driver(DriverError),
}

impl fmt::Display for ControllerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PinAlreadyRegistered(pin) => {
                write!(f, "pin {pin} is already registered to a button")
            }
            Self::ButtonNotOwned => write!(f, "button is not owned by this controller"),
            Self::InvalidBounce => write!(f, "bounce_ms must not be negative"),
            Self::NotReady => write!(f, "controller is not in the Ready state"),
            Self::Driver(e) => write!(f, "driver error: {e}"),
        }
    }
}

impl std::error::Error for ControllerError {}

impl From<DriverError> for ControllerError {
    fn from(e: DriverError) -> Self {
        Self::Driver(e)
    }
}

/// Hardware-boundary errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DriverError {
    /// `configure_button` called for a pin that is already configured.
    AlreadyConfigured(u32),
    /// `unconfigure_button` called for a pin that was never configured.
    NotConfigured(u32),
    /// Backend-specific I/O failure, carrying a driver-supplied message.
    Io(String),
}

impl fmt::Display for DriverError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AlreadyConfigured(pin) => write!(f, "pin {pin} is already configured"),
            Self::NotConfigured(pin) => write!(f, "pin {pin} was never configured"),
            Self::Io(msg) => write!(f, "I/O error: {msg}"),
        }
    }
}

impl std::error::Error for DriverError {}
