//! The scheduled-update service (C3).
//!
//! A single dedicated worker thread that guarantees a button's requested
//! `next_deadline` (armed long-press, pending click resolution) is
//! honored even if no further GPIO edge ever arrives. Mirrors the
//! source's `_scheduled_updates_thread_main`: wake on the earliest
//! pending deadline, or block indefinitely on the condition variable
//! when nothing is pending, until notified of a new deadline or of
//! shutdown.

use std::sync::Arc;
use std::time::Instant;

use crate::controller::{process_button_update, ControllerInner};
use crate::Status;

pub(crate) fn run(inner: Arc<ControllerInner>) {
    loop {
        let mut registry = inner.registry.lock().unwrap();

        if !matches!(*inner.status.lock().unwrap(), Status::Ready | Status::Running) {
            return;
        }

        let now = Instant::now();
        let due: Vec<u32> = registry
            .pin_ids()
            .into_iter()
            .filter(|pin| registry.deadline(*pin).is_some_and(|d| d <= now))
            .collect();
        drop(registry);

        for pin in due {
            process_button_update(&inner, pin, false);
        }

        registry = inner.registry.lock().unwrap();
        if !matches!(*inner.status.lock().unwrap(), Status::Ready | Status::Running) {
            return;
        }

        let next_deadline = registry
            .pin_ids()
            .into_iter()
            .filter_map(|pin| registry.deadline(pin))
            .min();

        match next_deadline {
            Some(deadline) => {
                let now = Instant::now();
                if deadline > now {
                    let (guard, _timeout) = inner
                        .deadline_cvar
                        .wait_timeout(registry, deadline - now)
                        .unwrap();
                    drop(guard);
                }
            }
            None => {
                let _guard = inner.deadline_cvar.wait(registry).unwrap();
            }
        }
    }
}
