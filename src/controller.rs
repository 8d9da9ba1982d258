//! The controller (C5) — lifecycle, registration, and edge/deadline
//! routing. Owns the hardware driver, the button registry, the
//! scheduled-update worker, and the callback executor.

use std::sync::{Arc, Condvar, Mutex, Weak};
use std::thread::{self, JoinHandle};
use std::time::Instant;

use log::{debug, info, warn};

use crate::button::{Button, ButtonShared, ButtonTimeouts};
use crate::driver::{Edge, GpioDriver, InputPolarity, Pull};
use crate::error::ControllerError;
use crate::executor::{Executor, DEFAULT_WORKERS};
use crate::gesture::GestureEvent;
use crate::registry::Registry;
use crate::Status;

pub(crate) struct ControllerInner {
    pub(crate) driver: Mutex<Box<dyn GpioDriver>>,
    pub(crate) registry: Mutex<Registry>,
    pub(crate) deadline_cvar: Condvar,
    pub(crate) status: Mutex<Status>,
    status_cvar: Condvar,
    executor: Mutex<Option<Executor>>,
    scheduled_thread: Mutex<Option<JoinHandle<()>>>,
    stop_once: std::sync::Once,
}

/// Owns a GPIO-backed collection of buttons and dispatches their
/// gestures. See the crate-level docs for the overall architecture.
pub struct Controller {
    inner: Arc<ControllerInner>,
}

impl Controller {
    /// Build a controller around `driver`. The controller starts in
    /// [`Status::Ready`]; call [`Controller::run`] or
    /// [`Controller::start_in_thread`] to begin dispatching edges.
    pub fn new(driver: Box<dyn GpioDriver>) -> Self {
        let inner = Arc::new(ControllerInner {
            driver: Mutex::new(driver),
            registry: Mutex::new(Registry::default()),
            deadline_cvar: Condvar::new(),
            status: Mutex::new(Status::Ready),
            status_cvar: Condvar::new(),
            executor: Mutex::new(Some(Executor::new(DEFAULT_WORKERS))),
            scheduled_thread: Mutex::new(None),
            stop_once: std::sync::Once::new(),
        });
        Self { inner }
    }

    pub fn status(&self) -> Status {
        *self.inner.status.lock().unwrap()
    }

    /// Register a new button on `pin_id`.
    ///
    /// Configures the pin on the driver, performs a baseline recognizer
    /// update with events suppressed, and returns a handle usable to
    /// register gesture handlers.
    ///
    /// # Errors
    /// [`ControllerError::PinAlreadyRegistered`] if `pin_id` is already
    /// owned by this controller; [`ControllerError::InvalidBounce`] if
    /// `bounce_ms` is negative; [`ControllerError::Driver`] if the
    /// hardware backend rejects the configuration.
    pub fn make_button(
        &self,
        pin_id: u32,
        input_polarity: InputPolarity,
        pull: Pull,
        name: Option<String>,
        bounce_ms: i64,
    ) -> Result<Button, ControllerError> {
        if bounce_ms < 0 {
            return Err(ControllerError::InvalidBounce);
        }
        let name = name.unwrap_or_else(|| format!("button for pin {pin_id}"));

        {
            let registry = self.inner.registry.lock().unwrap();
            if registry.contains(pin_id) {
                return Err(ControllerError::PinAlreadyRegistered(pin_id));
            }
        }

        self.inner
            .driver
            .lock()
            .unwrap()
            .configure_button(pin_id, pull, bounce_ms as u32)?;
        debug!("button configured for pin {pin_id}");

        {
            let mut registry = self.inner.registry.lock().unwrap();
            registry.insert(pin_id, name, input_polarity, ButtonTimeouts::default());
        }

        // Baseline update: establish pressed/long_pressed without
        // treating the initial level as a synthesized edge.
        process_button_update(&self.inner, pin_id, true);

        info!("registered button for pin {pin_id}");
        Ok(Button {
            inner: Arc::new(ButtonShared {
                pin_id,
                name: self.inner.registry.lock().unwrap().name(pin_id).unwrap_or_default(),
                input_polarity,
                controller: Arc::downgrade(&self.inner),
            }),
        })
    }

    /// Unregister `button` and unconfigure its pin on the driver.
    ///
    /// # Errors
    /// [`ControllerError::ButtonNotOwned`] if `button` was not created by
    /// this controller (or was already deleted).
    pub fn delete_button(&self, button: &Button) -> Result<(), ControllerError> {
        let pin_id = button.pin_id();
        {
            let mut registry = self.inner.registry.lock().unwrap();
            if !registry.remove(pin_id) {
                return Err(ControllerError::ButtonNotOwned);
            }
        }
        self.inner.driver.lock().unwrap().unconfigure_button(pin_id)?;
        info!("removed button for pin {pin_id}");
        Ok(())
    }

    /// Start dispatching edges and block until [`Status::Stopped`].
    ///
    /// # Errors
    /// [`ControllerError::NotReady`] if the controller is not currently
    /// [`Status::Ready`] (already running, or already stopped — the
    /// lifecycle never restarts).
    pub fn run(&self) -> Result<(), ControllerError> {
        run_inner(Arc::clone(&self.inner))
    }

    /// Spawn [`Controller::run`] on a background thread and return once
    /// the controller has reached [`Status::Running`].
    pub fn start_in_thread(&self) -> Result<(), ControllerError> {
        {
            let status = *self.inner.status.lock().unwrap();
            if status != Status::Ready {
                return Err(ControllerError::NotReady);
            }
        }
        let inner = Arc::clone(&self.inner);
        thread::Builder::new()
            .name("button-gestures-run".into())
            .spawn(move || {
                if let Err(e) = run_inner(inner) {
                    warn!("controller run() exited with error: {e}");
                }
            })
            .expect("failed to spawn controller run() thread");

        let status = self.inner.status.lock().unwrap();
        let _status = self
            .inner
            .status_cvar
            .wait_while(status, |s| *s == Status::Ready)
            .unwrap();
        Ok(())
    }

    /// Request shutdown. Always drains in-flight handlers before
    /// declaring [`Status::Stopped`]; if `wait` is true, blocks the
    /// caller until that happens. Idempotent once [`Status::Stopped`].
    pub fn stop(&self, wait: bool) {
        {
            let status = *self.inner.status.lock().unwrap();
            if status == Status::Stopped {
                return;
            }
        }
        let inner = &self.inner;
        inner.stop_once.call_once(|| do_stop(inner));

        if wait {
            let status = inner.status.lock().unwrap();
            let _status = inner.status_cvar.wait_while(status, |s| *s != Status::Stopped).unwrap();
        }
    }

    /// Install handlers for the given signals (default `{SIGINT,
    /// SIGTERM}`, matching the source's default argument) that call
    /// `stop(wait = false)`.
    ///
    /// The signals are collected by `signal_hook::iterator::Signals` and
    /// dispatched from a dedicated worker thread rather than from the
    /// real signal handler context: `Controller::stop` takes std
    /// `Mutex`es, which is not something a genuine signal handler may do
    /// safely (it could self-deadlock if the signal lands while that
    /// thread already holds one of those locks). `Signals`'s own
    /// registration uses only async-signal-safe primitives internally
    /// (a self-pipe write) and hands the actual signal numbers to this
    /// thread through an ordinary blocking iterator.
    pub fn stop_on_signals(&self, signals: Option<&[i32]>) -> Result<(), std::io::Error> {
        let signals: Vec<i32> = signals
            .map(<[i32]>::to_vec)
            .unwrap_or_else(|| vec![signal_hook::consts::SIGINT, signal_hook::consts::SIGTERM]);

        let mut handle = signal_hook::iterator::Signals::new(signals)?;
        let inner = Arc::clone(&self.inner);
        thread::Builder::new()
            .name("button-gestures-signals".into())
            .spawn(move || {
                for _sig in handle.forever() {
                    Controller { inner: Arc::clone(&inner) }.stop(false);
                }
            })
            .expect("failed to spawn signal-handling thread");
        Ok(())
    }
}

fn run_inner(inner: Arc<ControllerInner>) -> Result<(), ControllerError> {
    {
        let mut status = inner.status.lock().unwrap();
        if *status != Status::Ready {
            return Err(ControllerError::NotReady);
        }
        *status = Status::Running;
    }
    inner.status_cvar.notify_all();
    info!("controller is now running");

    let weak: Weak<ControllerInner> = Arc::downgrade(&inner);
    inner.driver.lock().unwrap().set_edge_callback(Box::new(move |pin_id, edge| {
        if let Some(inner) = weak.upgrade() {
            on_gpio_edge(&inner, pin_id, edge);
        }
    }));

    let sched_inner = Arc::clone(&inner);
    let handle = thread::Builder::new()
        .name("button-gestures-scheduled-updates".into())
        .spawn(move || crate::scheduler::run(sched_inner))
        .expect("failed to spawn scheduled-update worker thread");
    *inner.scheduled_thread.lock().unwrap() = Some(handle);

    let status = inner.status.lock().unwrap();
    let _status = inner.status_cvar.wait_while(status, |s| *s != Status::Stopped).unwrap();
    Ok(())
}

fn do_stop(inner: &ControllerInner) {
    info!("stopping controller");
    {
        let mut status = inner.status.lock().unwrap();
        if *status == Status::Ready {
            *status = Status::Stopping;
        } else if *status == Status::Running {
            *status = Status::Stopping;
        }
    }
    inner.status_cvar.notify_all();

    // Wake the scheduled-update worker so it notices Stopping and exits
    // its wait promptly. The worker always re-checks `status` while
    // holding `registry` immediately before it blocks on `deadline_cvar`
    // (see scheduler.rs), so taking `registry` here before notifying
    // closes the gap between that check and the wait call: either the
    // worker hasn't reached the check yet and will see Stopping once it
    // does, or it is already parked inside `wait`/`wait_timeout` (which
    // releases `registry` while blocked) and receives the notification
    // directly. Without this lock the notification could land in that
    // gap and be lost, hanging `stop(wait = true)` forever.
    {
        let _registry = inner.registry.lock().unwrap();
        inner.deadline_cvar.notify_all();
    }

    if let Some(handle) = inner.scheduled_thread.lock().unwrap().take() {
        let _ = handle.join();
    }

    if let Some(executor) = inner.executor.lock().unwrap().take() {
        executor.wait_idle();
        executor.shutdown();
    }
    debug!("all event handlers are now complete");

    {
        let mut status = inner.status.lock().unwrap();
        *status = Status::Stopped;
    }
    inner.status_cvar.notify_all();
    info!("controller is now stopped");
}

fn on_gpio_edge(inner: &Arc<ControllerInner>, pin_id: u32, _edge: Edge) {
    let running = matches!(*inner.status.lock().unwrap(), Status::Running);
    if !running {
        return;
    }
    process_button_update(inner, pin_id, false);
}

/// Re-enter the recognizer for `pin_id` with a fresh hardware read, then
/// dispatch any emitted gestures to the callback executor. Shared by the
/// edge-ingress path and the scheduled-update worker.
pub(crate) fn process_button_update(inner: &Arc<ControllerInner>, pin_id: u32, suppress_events: bool) {
    let level_high = inner.driver.lock().unwrap().input(pin_id);
    let now = Instant::now();

    let dispatch = {
        let mut registry = inner.registry.lock().unwrap();
        let Some((events, next_deadline)) = registry.update(pin_id, level_high, now, suppress_events) else {
            info!("ignoring update for unregistered pin {pin_id}");
            return;
        };

        if next_deadline.is_some() {
            inner.deadline_cvar.notify_all();
        }

        if events.is_empty() {
            Vec::new()
        } else {
            let handlers = registry.handlers(pin_id).expect("button exists while holding the registry lock");
            events
                .iter()
                .copied()
                .flat_map(|event: GestureEvent| handlers.for_event(event).cloned())
                .collect::<Vec<_>>()
        }
    };

    if dispatch.is_empty() {
        return;
    }

    let Some(button) = build_button_handle(inner, pin_id) else {
        return;
    };
    if let Some(executor) = inner.executor.lock().unwrap().as_ref() {
        for handler in dispatch {
            executor.submit(handler, button.clone());
        }
    }
}

fn build_button_handle(inner: &Arc<ControllerInner>, pin_id: u32) -> Option<Button> {
    let registry = inner.registry.lock().unwrap();
    let name = registry.name(pin_id)?;
    let input_polarity = registry.input_polarity(pin_id)?;
    drop(registry);
    Some(Button {
        inner: Arc::new(ButtonShared {
            pin_id,
            name,
            input_polarity,
            controller: Arc::downgrade(inner),
        }),
    })
}
