//! The shared, mutex-guarded table of live buttons.
//!
//! Everything in this module is reached only while the controller mutex
//! (`ControllerInner::registry`'s `Mutex`) is held: handler lists and
//! recognizer state are guarded by that one lock. The registry itself
//! does no locking of its own; it is the payload the controller locks.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use crate::button::{ButtonTimeouts, GestureKind, Handler, HandlerId};
use crate::driver::InputPolarity;
use crate::gesture::{GestureEvent, GestureMachine, Timeouts};

pub(crate) struct ButtonEntry {
    pub(crate) name: String,
    pub(crate) input_polarity: InputPolarity,
    pub(crate) machine: GestureMachine,
    pub(crate) timeouts: ButtonTimeouts,
    pub(crate) handlers: Handlers,
    next_handler_id: u64,
}

#[derive(Default)]
pub(crate) struct Handlers {
    pub(crate) press: Vec<(HandlerId, Arc<Handler>)>,
    pub(crate) release: Vec<(HandlerId, Arc<Handler>)>,
    pub(crate) long_press: Vec<(HandlerId, Arc<Handler>)>,
    pub(crate) click: Vec<(HandlerId, Arc<Handler>)>,
    pub(crate) double_click: Vec<(HandlerId, Arc<Handler>)>,
}

impl Handlers {
    fn list_mut(&mut self, kind: GestureKind) -> &mut Vec<(HandlerId, Arc<Handler>)> {
        match kind {
            GestureKind::Press => &mut self.press,
            GestureKind::Release => &mut self.release,
            GestureKind::LongPress => &mut self.long_press,
            GestureKind::Click => &mut self.click,
            GestureKind::DoubleClick => &mut self.double_click,
        }
    }

    /// Handlers registered for `event`, in registration order.
    pub(crate) fn for_event(&self, event: GestureEvent) -> impl Iterator<Item = &Arc<Handler>> {
        let list = match event {
            GestureEvent::Press => &self.press,
            GestureEvent::Release => &self.release,
            GestureEvent::LongPress => &self.long_press,
            GestureEvent::Click => &self.click,
            GestureEvent::DoubleClick => &self.double_click,
        };
        list.iter().map(|(_, h)| h)
    }
}

#[derive(Default)]
pub(crate) struct Registry {
    buttons: HashMap<u32, ButtonEntry>,
}

impl Registry {
    pub(crate) fn contains(&self, pin_id: u32) -> bool {
        self.buttons.contains_key(&pin_id)
    }

    pub(crate) fn insert(&mut self, pin_id: u32, name: String, input_polarity: InputPolarity, timeouts: ButtonTimeouts) {
        self.buttons.insert(
            pin_id,
            ButtonEntry {
                name,
                input_polarity,
                machine: GestureMachine::new(),
                timeouts,
                handlers: Handlers::default(),
                next_handler_id: 0,
            },
        );
    }

    pub(crate) fn name(&self, pin_id: u32) -> Option<String> {
        self.buttons.get(&pin_id).map(|b| b.name.clone())
    }

    pub(crate) fn input_polarity(&self, pin_id: u32) -> Option<InputPolarity> {
        self.buttons.get(&pin_id).map(|b| b.input_polarity)
    }

    pub(crate) fn deadline(&self, pin_id: u32) -> Option<Instant> {
        self.buttons.get(&pin_id).and_then(|b| b.machine.next_deadline())
    }

    pub(crate) fn remove(&mut self, pin_id: u32) -> bool {
        self.buttons.remove(&pin_id).is_some()
    }

    pub(crate) fn pressed(&self, pin_id: u32) -> bool {
        self.buttons.get(&pin_id).map(|b| b.machine.pressed()).unwrap_or(false)
    }

    pub(crate) fn long_pressed(&self, pin_id: u32) -> bool {
        self.buttons.get(&pin_id).map(|b| b.machine.long_pressed()).unwrap_or(false)
    }

    pub(crate) fn timeouts(&self, pin_id: u32) -> ButtonTimeouts {
        self.buttons.get(&pin_id).map(|b| b.timeouts).unwrap_or_default()
    }

    /// Overwrite `pin_id`'s timeouts. Takes effect on the next recognizer
    /// update; matches the Python original's plain mutable
    /// `double_click_timeout`/`long_press_timeout` attributes.
    pub(crate) fn set_timeouts(&mut self, pin_id: u32, timeouts: ButtonTimeouts) {
        if let Some(entry) = self.buttons.get_mut(&pin_id) {
            entry.timeouts = timeouts;
        }
    }

    /// Register `handler` for `kind` on `pin_id`, returning a token that
    /// later identifies it to [`Registry::remove_handler`]. Returns
    /// `None` if the button no longer exists (its controller handle
    /// outlived a `delete_button`).
    pub(crate) fn push_handler(&mut self, pin_id: u32, kind: GestureKind, handler: Handler) -> Option<HandlerId> {
        let entry = self.buttons.get_mut(&pin_id)?;
        let id = HandlerId(entry.next_handler_id);
        entry.next_handler_id += 1;
        entry.handlers.list_mut(kind).push((id, Arc::new(handler)));
        Some(id)
    }

    /// Remove a single previously registered handler. Returns whether a
    /// handler with that id and kind was found and removed.
    pub(crate) fn remove_handler(&mut self, pin_id: u32, kind: GestureKind, id: HandlerId) -> bool {
        let Some(entry) = self.buttons.get_mut(&pin_id) else {
            return false;
        };
        let list = entry.handlers.list_mut(kind);
        let before = list.len();
        list.retain(|(existing, _)| *existing != id);
        list.len() != before
    }

    pub(crate) fn clear_handlers(&mut self, pin_id: u32, kind: GestureKind) {
        if let Some(entry) = self.buttons.get_mut(&pin_id) {
            entry.handlers.list_mut(kind).clear();
        }
    }

    /// Re-enter the gesture machine for `pin_id`. Returns `None` if the
    /// pin is not registered; the controller logs and ignores this at
    /// the call site.
    pub(crate) fn update(
        &mut self,
        pin_id: u32,
        level_high: bool,
        now: Instant,
        suppress_events: bool,
    ) -> Option<(Vec<GestureEvent>, Option<Instant>)> {
        let entry = self.buttons.get_mut(&pin_id)?;
        let level_pressed = match entry.input_polarity {
            InputPolarity::PressedWhenHigh => level_high,
            InputPolarity::PressedWhenLow => !level_high,
        };
        let timeouts = Timeouts {
            double_click_timeout: entry.timeouts.double_click_timeout,
            long_press_timeout: entry.timeouts.long_press_timeout,
        };
        let update = entry.machine.update(level_pressed, now, timeouts, suppress_events);
        Some((update.events, update.next_deadline))
    }

    pub(crate) fn handlers(&self, pin_id: u32) -> Option<&Handlers> {
        self.buttons.get(&pin_id).map(|b| &b.handlers)
    }

    pub(crate) fn pin_ids(&self) -> Vec<u32> {
        self.buttons.keys().copied().collect()
    }
}
