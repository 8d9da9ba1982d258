//! Shared mock [`GpioDriver`] for integration tests.
//!
//! Mirrors the role `tests/test_controller.py`'s `FakeGpioDriver` plays in
//! the Python original: a driver with no real hardware behind it, whose
//! pin levels and edge callback a test can drive directly. Edges are
//! synthesized on `set_level` exactly where the real driver would have
//! already debounced them — this crate's tests never exercise debounce
//! itself, only the recognizer's reaction to edges.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use button_gestures::{DriverError, Edge, GpioDriver, Pull};

struct MockState {
    levels: HashMap<u32, bool>,
    configured: HashSet<u32>,
    callback: Option<Box<dyn FnMut(u32, Edge) + Send>>,
}

/// The `GpioDriver` half, handed to `Controller::new`.
pub struct MockDriver {
    state: Arc<Mutex<MockState>>,
}

impl GpioDriver for MockDriver {
    fn input(&self, pin_id: u32) -> bool {
        self.state.lock().unwrap().levels.get(&pin_id).copied().unwrap_or(false)
    }

    fn configure_button(&mut self, pin_id: u32, _pull: Pull, _bounce_ms: u32) -> Result<(), DriverError> {
        let mut state = self.state.lock().unwrap();
        if !state.configured.insert(pin_id) {
            return Err(DriverError::AlreadyConfigured(pin_id));
        }
        state.levels.entry(pin_id).or_insert(false);
        Ok(())
    }

    fn unconfigure_button(&mut self, pin_id: u32) -> Result<(), DriverError> {
        let mut state = self.state.lock().unwrap();
        if !state.configured.remove(&pin_id) {
            return Err(DriverError::NotConfigured(pin_id));
        }
        Ok(())
    }

    fn set_edge_callback(&mut self, callback: Box<dyn FnMut(u32, Edge) + Send>) {
        self.state.lock().unwrap().callback = Some(callback);
    }
}

/// The test-facing half: drives pin levels and starting conditions.
#[derive(Clone)]
pub struct MockHandle {
    state: Arc<Mutex<MockState>>,
}

impl MockHandle {
    /// Build a fresh driver/handle pair. All pins default to a low level.
    pub fn new() -> (MockDriver, MockHandle) {
        let state = Arc::new(Mutex::new(MockState {
            levels: HashMap::new(),
            configured: HashSet::new(),
            callback: None,
        }));
        (MockDriver { state: Arc::clone(&state) }, MockHandle { state })
    }

    /// Set `pin_id`'s starting level before the button is registered,
    /// e.g. to exercise a pin that is already active at startup.
    pub fn preset_level(&self, pin_id: u32, level: bool) {
        self.state.lock().unwrap().levels.insert(pin_id, level);
    }

    /// Change `pin_id`'s level and, if it actually changed, synthesize
    /// the matching debounced edge the way a real driver would after its
    /// own debounce window closed.
    pub fn set_level(&self, pin_id: u32, level: bool) {
        let mut state = self.state.lock().unwrap();
        let previous = state.levels.insert(pin_id, level);
        if previous == Some(level) {
            return;
        }
        let edge = if level { Edge::Rising } else { Edge::Falling };
        if let Some(callback) = state.callback.as_mut() {
            callback(pin_id, edge);
        }
    }
}
