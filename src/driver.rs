//! Hardware abstraction boundary — the port between the recognition
//! engine and a concrete GPIO backend.
//!
//! ```text
//!   Concrete driver (Raspberry Pi, mock, ...) ──▶ GpioDriver ──▶ Controller
//! ```
//!
//! Implementations are driven adapters in the same sense as this crate's
//! ancestor's `SensorPort`/`ActuatorPort`: the domain (the gesture engine
//! in [`crate::gesture`]) never touches a backend directly, only this
//! trait.

use crate::error::DriverError;

/// Mapping from physical pin level to logical "pressed".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputPolarity {
    /// A high level means the button is pressed.
    PressedWhenHigh,
    /// A low level means the button is pressed.
    PressedWhenLow,
}

/// Internal pull resistor selection for a configured input pin.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pull {
    None,
    Up,
    Down,
}

/// A debounced pin transition, as reported by a driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Edge {
    Rising,
    Falling,
}

/// Capability set a hardware backend must provide.
///
/// A single process-wide edge callback is registered via
/// [`set_edge_callback`](GpioDriver::set_edge_callback); the driver is
/// responsible for debouncing (per `bounce_ms`) before invoking it. The
/// callback may be invoked from any thread the driver chooses — the
/// controller takes its own mutex before touching button state.
pub trait GpioDriver: Send {
    /// Current level of `pin_id`. `true` = high.
    fn input(&self, pin_id: u32) -> bool;

    /// Configure `pin_id` as a debounced digital input.
    ///
    /// # Errors
    /// Returns [`DriverError::AlreadyConfigured`] if the pin is already
    /// configured as an input by this driver.
    fn configure_button(&mut self, pin_id: u32, pull: Pull, bounce_ms: u32) -> Result<(), DriverError>;

    /// Undo a previous `configure_button`.
    ///
    /// # Errors
    /// Returns [`DriverError::NotConfigured`] if `pin_id` was never
    /// configured.
    fn unconfigure_button(&mut self, pin_id: u32) -> Result<(), DriverError>;

    /// Register the single process-wide callback invoked on every
    /// debounced edge of every configured pin. A later call replaces an
    /// earlier registration.
    fn set_edge_callback(&mut self, callback: Box<dyn FnMut(u32, Edge) + Send>);
}
