//! The callback executor (C4) — runs user handlers off the recognition
//! critical path.
//!
//! A fixed pool of worker threads drains a `crossbeam-channel` queue of
//! submitted invocations. Each invocation is either run synchronously
//! (`Handler::Immediate`) or driven to completion with
//! `futures_lite::future::block_on` (`Handler::Deferred`) — this crate's
//! stand-in for the source's dedicated asyncio event loop thread. Panics
//! are caught with `catch_unwind` exactly where the source wraps every
//! handler call in `except BaseException: log`.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Condvar, Mutex};
use std::thread::{self, JoinHandle};

use crossbeam_channel::{Receiver, Sender};
use log::error;

use crate::button::{Button, Handler};

type Task = Box<dyn FnOnce() + Send>;

/// Default size of the worker pool. At least one worker is required
/// alongside the edge-ingress and scheduled-update workers.
pub const DEFAULT_WORKERS: usize = 2;

pub(crate) struct Executor {
    sender: Sender<Task>,
    workers: Vec<JoinHandle<()>>,
    in_flight: Arc<(Mutex<usize>, Condvar)>,
}

impl Executor {
    pub(crate) fn new(worker_count: usize) -> Self {
        let worker_count = worker_count.max(1);
        let (sender, receiver) = crossbeam_channel::unbounded::<Task>();
        let in_flight = Arc::new((Mutex::new(0usize), Condvar::new()));

        let workers = (0..worker_count).map(|i| spawn_worker(i, receiver.clone())).collect();

        Self { sender, workers, in_flight }
    }

    /// Submit a handler invocation. Never blocks on handler execution —
    /// it only enqueues.
    pub(crate) fn submit(&self, handler: Arc<Handler>, button: Button) {
        {
            let (count, _) = &*self.in_flight;
            *count.lock().unwrap() += 1;
        }
        let in_flight = Arc::clone(&self.in_flight);
        let task: Task = Box::new(move || {
            run_handler(&handler, button);
            let (count, cvar) = &*in_flight;
            let mut count = count.lock().unwrap();
            *count -= 1;
            if *count == 0 {
                cvar.notify_all();
            }
        });
        // The receiver side only ever disconnects once every worker has
        // exited, which only happens after `shutdown`; submitting after
        // shutdown is a caller bug, not something to panic over.
        let _ = self.sender.send(task);
    }

    /// Block until every submitted handler has completed. Used by
    /// `stop(wait = true)`.
    pub(crate) fn wait_idle(&self) {
        let (count, cvar) = &*self.in_flight;
        let guard = count.lock().unwrap();
        let _guard = cvar.wait_while(guard, |c| *c > 0).unwrap();
    }

    /// Close the task queue and join every worker thread.
    pub(crate) fn shutdown(self) {
        drop(self.sender);
        for worker in self.workers {
            let _ = worker.join();
        }
    }
}

fn spawn_worker(index: usize, receiver: Receiver<Task>) -> JoinHandle<()> {
    thread::Builder::new()
        .name(format!("button-gestures-callback-{index}"))
        .spawn(move || {
            while let Ok(task) = receiver.recv() {
                task();
            }
        })
        .expect("failed to spawn callback executor worker thread")
}

fn run_handler(handler: &Handler, button: Button) {
    let result = panic::catch_unwind(AssertUnwindSafe(|| match handler {
        Handler::Immediate(f) => f(button.clone()),
        Handler::Deferred(f) => futures_lite::future::block_on(f(button.clone())),
    }));
    if let Err(payload) = result {
        error!(
            "handler for button '{}' panicked: {}",
            button.name(),
            panic_message(&payload)
        );
    }
}

fn panic_message(payload: &Box<dyn Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
