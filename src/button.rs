//! Public button handle and per-button timeout configuration.

use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Weak};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::controller::ControllerInner;
use crate::driver::InputPolarity;

/// Tunable timing thresholds for one button's gesture recognition.
///
/// Not persisted anywhere — the engine itself keeps no state across
/// process restarts; `Serialize`/`Deserialize` are provided so an
/// embedding application can fold these into its own configuration file
/// if it wants to.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ButtonTimeouts {
    /// Maximum gap between a press and the following release for that
    /// release to still count toward a double-click. Default 0.4s.
    pub double_click_timeout: Duration,
    /// Minimum hold duration before a press is considered "long". Default
    /// 0.5s.
    pub long_press_timeout: Duration,
}

impl Default for ButtonTimeouts {
    fn default() -> Self {
        Self {
            double_click_timeout: Duration::from_millis(400),
            long_press_timeout: Duration::from_millis(500),
        }
    }
}

/// A gesture handler: either run to completion synchronously, or return
/// a future the callback executor drives to completion off the
/// recognition critical path.
pub enum Handler {
    Immediate(Box<dyn Fn(Button) + Send + Sync>),
    Deferred(Box<dyn Fn(Button) -> Pin<Box<dyn Future<Output = ()> + Send>> + Send + Sync>),
}

impl Handler {
    /// Wrap a plain synchronous closure.
    pub fn immediate<F>(f: F) -> Self
    where
        F: Fn(Button) + Send + Sync + 'static,
    {
        Self::Immediate(Box::new(f))
    }

    /// Wrap a closure returning a future; the future is driven to
    /// completion on a callback executor worker thread.
    pub fn deferred<F, Fut>(f: F) -> Self
    where
        F: Fn(Button) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        Self::Deferred(Box::new(move |button| Box::pin(f(button))))
    }
}

/// Stable, cheaply-cloned handle to a registered button.
///
/// Cloning a `Button` is an `Arc` clone — every clone refers to the same
/// underlying registration. `pressed`/`long_pressed` and the
/// `add_on_*`/`remove_on_*` family briefly take the owning controller's
/// mutex to read or mutate shared state.
#[derive(Clone)]
pub struct Button {
    pub(crate) inner: Arc<ButtonShared>,
}

pub(crate) struct ButtonShared {
    pub(crate) pin_id: u32,
    pub(crate) name: String,
    pub(crate) input_polarity: InputPolarity,
    pub(crate) controller: Weak<ControllerInner>,
}

impl Button {
    pub fn pin_id(&self) -> u32 {
        self.inner.pin_id
    }

    pub fn name(&self) -> &str {
        &self.inner.name
    }

    pub fn input_polarity(&self) -> InputPolarity {
        self.inner.input_polarity
    }

    /// Current pressed state, read live from the controller's registry.
    pub fn pressed(&self) -> bool {
        self.with_controller(|c| c.registry.lock().unwrap().pressed(self.inner.pin_id))
            .unwrap_or(false)
    }

    /// Whether the current press (if any) has crossed `long_press_timeout`.
    pub fn long_pressed(&self) -> bool {
        self.with_controller(|c| c.registry.lock().unwrap().long_pressed(self.inner.pin_id))
            .unwrap_or(false)
    }

    pub fn double_click_timeout(&self) -> Duration {
        self.with_controller(|c| c.registry.lock().unwrap().timeouts(self.inner.pin_id).double_click_timeout)
            .unwrap_or_default()
    }

    pub fn long_press_timeout(&self) -> Duration {
        self.with_controller(|c| c.registry.lock().unwrap().timeouts(self.inner.pin_id).long_press_timeout)
            .unwrap_or_default()
    }

    /// Override the double-click window (default 400ms). Takes effect on
    /// the next recognizer update; mirrors the Python original, where
    /// these are plain mutable instance attributes.
    pub fn set_double_click_timeout(&self, timeout: Duration) {
        self.update_timeouts(|t| t.double_click_timeout = timeout);
    }

    /// Override the long-press arming threshold (default 500ms).
    pub fn set_long_press_timeout(&self, timeout: Duration) {
        self.update_timeouts(|t| t.long_press_timeout = timeout);
    }

    fn update_timeouts(&self, f: impl FnOnce(&mut ButtonTimeouts)) {
        if let Some(controller) = self.inner.controller.upgrade() {
            let mut registry = controller.registry.lock().unwrap();
            let mut timeouts = registry.timeouts(self.inner.pin_id);
            f(&mut timeouts);
            registry.set_timeouts(self.inner.pin_id, timeouts);
        }
    }

    pub fn add_on_press(&self, handler: Handler) -> HandlerId {
        self.push_handler(GestureKind::Press, handler)
    }

    pub fn add_on_release(&self, handler: Handler) -> HandlerId {
        self.push_handler(GestureKind::Release, handler)
    }

    pub fn add_on_long_press(&self, handler: Handler) -> HandlerId {
        self.push_handler(GestureKind::LongPress, handler)
    }

    pub fn add_on_click(&self, handler: Handler) -> HandlerId {
        self.push_handler(GestureKind::Click, handler)
    }

    pub fn add_on_double_click(&self, handler: Handler) -> HandlerId {
        self.push_handler(GestureKind::DoubleClick, handler)
    }

    /// Remove the handler previously registered under `id` (the token
    /// returned by the matching `add_on_press`) from this button's press
    /// handlers. Returns `false` if `id` was never registered or was
    /// already removed.
    pub fn remove_on_press(&self, id: HandlerId) -> bool {
        self.remove_handler(GestureKind::Press, id)
    }

    pub fn remove_on_release(&self, id: HandlerId) -> bool {
        self.remove_handler(GestureKind::Release, id)
    }

    pub fn remove_on_long_press(&self, id: HandlerId) -> bool {
        self.remove_handler(GestureKind::LongPress, id)
    }

    pub fn remove_on_click(&self, id: HandlerId) -> bool {
        self.remove_handler(GestureKind::Click, id)
    }

    pub fn remove_on_double_click(&self, id: HandlerId) -> bool {
        self.remove_handler(GestureKind::DoubleClick, id)
    }

    /// Remove every handler currently registered for `kind` on this
    /// button, regardless of id.
    pub fn clear_handlers(&self, kind: GestureKind) {
        if let Some(controller) = self.inner.controller.upgrade() {
            controller
                .registry
                .lock()
                .unwrap()
                .clear_handlers(self.inner.pin_id, kind);
        }
    }

    fn push_handler(&self, kind: GestureKind, handler: Handler) -> HandlerId {
        self.inner
            .controller
            .upgrade()
            .and_then(|controller| controller.registry.lock().unwrap().push_handler(self.inner.pin_id, kind, handler))
            .unwrap_or(HandlerId(u64::MAX))
    }

    fn remove_handler(&self, kind: GestureKind, id: HandlerId) -> bool {
        self.inner
            .controller
            .upgrade()
            .map(|controller| controller.registry.lock().unwrap().remove_handler(self.inner.pin_id, kind, id))
            .unwrap_or(false)
    }

    fn with_controller<T>(&self, f: impl FnOnce(&ControllerInner) -> T) -> Option<T> {
        self.inner.controller.upgrade().map(|c| f(&c))
    }
}

/// Which handler list an `add_on_*`/`clear_handlers` call targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GestureKind {
    Press,
    Release,
    LongPress,
    Click,
    DoubleClick,
}

/// Token identifying one registered handler, scoped to the button and
/// gesture kind it was registered under. Returned by `add_on_*`, consumed
/// by the matching `remove_on_*`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HandlerId(pub(crate) u64);
