//! Button gesture recognition engine.
//!
//! Monitors a set of GPIO-connected push-buttons and turns raw edge
//! transitions into a small vocabulary of gestures — press, release,
//! long-press, click, double-click — dispatched to user-registered
//! handlers. The hardware itself is accessed only through the
//! [`driver::GpioDriver`] trait; callers supply a concrete driver to
//! [`Controller::new`].
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                     GpioDriver (caller-supplied)              │
//! └───────────────────────────┬────────────────────────────────────┘
//!                             │ edge callback
//!                             ▼
//! ┌──────────────────────────────────────────────────────────────┐
//! │                         Controller                            │
//! │   controller mutex guards Registry (per-button GestureMachine) │
//! │                             │                                  │
//! │         ┌───────────────────┼────────────────────┐             │
//! │         ▼                   ▼                    ▼             │
//! │   edge ingress      scheduled-update        callback           │
//! │   (caller thread)   worker (deadlines)      executor (events)  │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! This crate targets a full `std` environment and runs every worker —
//! edge ingress, scheduled updates, callback dispatch — on real OS
//! threads.

#![deny(unused_must_use)]

pub mod button;
pub mod controller;
mod driver;
mod error;
mod executor;
mod gesture;
mod registry;
mod scheduler;

pub use button::{Button, ButtonTimeouts, GestureKind, Handler, HandlerId};
pub use controller::Controller;
pub use driver::{Edge, GpioDriver, InputPolarity, Pull};
pub use error::{ControllerError, DriverError};

/// Controller lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    /// Constructed, no buttons recognizing edges yet.
    Ready,
    /// `run`/`start_in_thread` has been called; actively dispatching.
    Running,
    /// `stop` has been called; draining in-flight handlers.
    Stopping,
    /// Fully shut down. Terminal — the controller cannot be restarted.
    Stopped,
}
