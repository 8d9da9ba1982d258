//! The button gesture recognizer — pure logic, no I/O.
//!
//! [`GestureMachine::update`] is re-entered either from an edge callback
//! (a real level change was observed) or from the scheduled-update
//! worker (a previously requested deadline has arrived). Both paths
//! funnel through the same function; the only difference is whether the
//! pin level actually changed.
//!
//! History is kept to the minimum the algorithm actually reads: the two
//! most recent press timestamps and the single most recent release
//! timestamp.

use std::time::{Duration, Instant};

/// A recognized gesture, tagged with the button-local moment it fired.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GestureEvent {
    Press,
    Release,
    LongPress,
    Click,
    DoubleClick,
}

/// Per-button timeout configuration consumed by the recognizer.
#[derive(Debug, Clone, Copy)]
pub struct Timeouts {
    pub double_click_timeout: Duration,
    pub long_press_timeout: Duration,
}

/// Result of a single [`GestureMachine::update`] call.
#[derive(Debug, Default)]
pub struct GestureUpdate {
    pub events: Vec<GestureEvent>,
    /// When the recognizer wants to be re-entered even without a new
    /// edge, e.g. to arm a long-press or to resolve a pending click.
    pub next_deadline: Option<Instant>,
}

/// The per-button state machine itself.
#[derive(Debug)]
pub struct GestureMachine {
    pressed: bool,
    long_pressed: bool,
    press_last: Option<Instant>,
    press_prev: Option<Instant>,
    release_last: Option<Instant>,
    scheduled_update_time: Option<Instant>,
}

impl GestureMachine {
    pub fn new() -> Self {
        Self {
            pressed: false,
            long_pressed: false,
            press_last: None,
            press_prev: None,
            release_last: None,
            scheduled_update_time: None,
        }
    }

    pub fn pressed(&self) -> bool {
        self.pressed
    }

    pub fn long_pressed(&self) -> bool {
        self.long_pressed
    }

    /// The deadline this machine last requested to be re-entered at, if any.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.scheduled_update_time
    }

    /// Re-enter the recognizer.
    ///
    /// `level_pressed` is the button's current logical pressed state
    /// (already translated through [`crate::driver::InputPolarity`]).
    /// `now` is a monotonic timestamp. `suppress_events` is true only
    /// for the one-time baseline call made when a button is first
    /// registered: the baseline call establishes `pressed`/`long_pressed`
    /// without treating the initial level as an edge, so a button created
    /// while already held down does not synthesize a spurious press (and,
    /// transitively, cannot produce a click off a release that was never
    /// paired with a recorded press).
    pub fn update(&mut self, level_pressed: bool, now: Instant, timeouts: Timeouts, suppress_events: bool) -> GestureUpdate {
        if let Some(deadline) = self.scheduled_update_time {
            if deadline <= now {
                self.scheduled_update_time = None;
            }
        }

        let was_pressed = self.pressed;
        self.pressed = level_pressed;
        if !self.pressed {
            self.long_pressed = false;
        }

        let mut events = Vec::new();
        let mut history_cleared = false;

        if !suppress_events {
            if self.pressed && !was_pressed {
                self.press_prev = self.press_last;
                self.press_last = Some(now);
                events.push(GestureEvent::Press);
            } else if !self.pressed && was_pressed {
                self.release_last = Some(now);
                events.push(GestureEvent::Release);

                if let Some(p_prev) = self.press_prev {
                    if now.saturating_duration_since(p_prev) < timeouts.double_click_timeout {
                        events.push(GestureEvent::DoubleClick);
                        self.press_last = None;
                        self.press_prev = None;
                        self.release_last = None;
                        history_cleared = true;
                    }
                }
            }
        }

        let mut next_deadline: Option<Instant> = None;

        if self.pressed && !self.long_pressed {
            if let Some(t_p) = self.press_last {
                if now.saturating_duration_since(t_p) > timeouts.long_press_timeout {
                    self.long_pressed = true;
                    if !suppress_events {
                        events.push(GestureEvent::LongPress);
                    }
                } else {
                    next_deadline = Some(tighten(next_deadline, t_p + timeouts.long_press_timeout));
                }
            }
        }

        if !history_cleared {
            if let (Some(p), Some(r)) = (self.press_last, self.release_last) {
                if r > p {
                    if now.saturating_duration_since(p) >= timeouts.double_click_timeout {
                        if !suppress_events {
                            events.push(GestureEvent::Click);
                        }
                        self.press_last = None;
                        self.press_prev = None;
                        self.release_last = None;
                    } else {
                        next_deadline =
                            Some(tighten(next_deadline, p + timeouts.double_click_timeout));
                    }
                }
            }
        }

        self.scheduled_update_time = next_deadline;
        GestureUpdate { events, next_deadline }
    }
}

impl Default for GestureMachine {
    fn default() -> Self {
        Self::new()
    }
}

/// Take the earlier of an optional existing deadline and a freshly
/// requested one — a requested deadline only ever tightens, never
/// replaces an earlier one with something later.
fn tighten(existing: Option<Instant>, candidate: Instant) -> Instant {
    match existing {
        Some(e) => e.min(candidate),
        None => candidate,
    }
}
