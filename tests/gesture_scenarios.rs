//! End-to-end gesture scenarios driven through a real `Controller`
//! against the shared mock driver in `tests/common`.
//!
//! Timeouts are shortened (60ms double-click / 150ms long-press) so the
//! suite runs in well under a second per test while preserving the
//! ordering these scenarios depend on (long > double, click fires at or
//! after `double_click_timeout` past the last press).

mod common;

use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

use button_gestures::{Button, Controller, Handler, InputPolarity, Pull};
use common::MockHandle;

const DOUBLE: Duration = Duration::from_millis(60);
const LONG: Duration = Duration::from_millis(150);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Tag {
    Press,
    Release,
    LongPress,
    Click,
    DoubleClick,
}

type Log = Arc<Mutex<Vec<(Tag, Instant)>>>;

fn wire_logging(button: &Button, log: &Log) {
    let l = Arc::clone(log);
    button.add_on_press(Handler::immediate(move |_| l.lock().unwrap().push((Tag::Press, Instant::now()))));
    let l = Arc::clone(log);
    button.add_on_release(Handler::immediate(move |_| l.lock().unwrap().push((Tag::Release, Instant::now()))));
    let l = Arc::clone(log);
    button.add_on_long_press(Handler::immediate(move |_| l.lock().unwrap().push((Tag::LongPress, Instant::now()))));
    let l = Arc::clone(log);
    button.add_on_click(Handler::immediate(move |_| l.lock().unwrap().push((Tag::Click, Instant::now()))));
    let l = Arc::clone(log);
    button.add_on_double_click(Handler::immediate(move |_| l.lock().unwrap().push((Tag::DoubleClick, Instant::now()))));
}

fn tags(log: &Log) -> Vec<Tag> {
    log.lock().unwrap().iter().map(|(t, _)| *t).collect()
}

struct Harness {
    controller: Controller,
    driver: MockHandle,
    button: Button,
    log: Log,
}

fn setup() -> Harness {
    let (driver, handle) = MockHandle::new();
    let controller = Controller::new(Box::new(driver));
    let button = controller
        .make_button(1, InputPolarity::PressedWhenHigh, Pull::None, Some("test".into()), 0)
        .expect("make_button");
    button.set_double_click_timeout(DOUBLE);
    button.set_long_press_timeout(LONG);
    let log: Log = Arc::new(Mutex::new(Vec::new()));
    wire_logging(&button, &log);
    controller.start_in_thread().expect("start_in_thread");
    Harness { controller, driver: handle, button, log }
}

impl Drop for Harness {
    fn drop(&mut self) {
        self.controller.stop(true);
    }
}

/// Simple click: press, quick release, click fires once the
/// double-click window closes.
#[test]
fn simple_click() {
    let h = setup();
    h.driver.set_level(1, true);
    thread::sleep(Duration::from_millis(5));
    h.driver.set_level(1, false);

    thread::sleep(DOUBLE + Duration::from_millis(100));
    assert_eq!(tags(&h.log), vec![Tag::Press, Tag::Release, Tag::Click]);
}

/// Long press then a lone release still clicks, since no
/// second press intervened before the release.
#[test]
fn long_press_then_release_still_clicks() {
    let h = setup();
    h.driver.set_level(1, true);
    thread::sleep(LONG + Duration::from_millis(60));
    assert!(h.button.long_pressed());
    h.driver.set_level(1, false);

    thread::sleep(Duration::from_millis(100));
    let seen = tags(&h.log);
    assert_eq!(seen, vec![Tag::Press, Tag::LongPress, Tag::Release, Tag::Click]);
}

/// A second press within the double-click window suppresses
/// the click and produces exactly one double-click.
#[test]
fn double_click_suppresses_click() {
    let h = setup();
    h.driver.set_level(1, true);
    thread::sleep(Duration::from_millis(5));
    h.driver.set_level(1, false);
    thread::sleep(Duration::from_millis(10));
    h.driver.set_level(1, true);
    thread::sleep(Duration::from_millis(5));
    h.driver.set_level(1, false);

    thread::sleep(DOUBLE + Duration::from_millis(100));
    let seen = tags(&h.log);
    assert_eq!(seen, vec![Tag::Press, Tag::Release, Tag::Press, Tag::Release, Tag::DoubleClick]);
    assert!(!seen.contains(&Tag::Click));
}

/// A hold shorter than `long_press_timeout` clicks but never
/// arms a long-press.
#[test]
fn short_press_clicks_without_long_press() {
    let h = setup();
    h.driver.set_level(1, true);
    thread::sleep(LONG / 2);
    h.driver.set_level(1, false);

    thread::sleep(DOUBLE + Duration::from_millis(100));
    let seen = tags(&h.log);
    assert_eq!(seen, vec![Tag::Press, Tag::Release, Tag::Click]);
}

/// A button created while its pin already reads "pressed"
/// must not synthesize a press; the first real edge (a release) produces
/// only `release`, with no click, since there was never a recorded press.
#[test]
fn startup_already_pressed_then_lone_release() {
    let (driver, handle) = MockHandle::new();
    handle.preset_level(1, true);
    let controller = Controller::new(Box::new(driver));
    let button = controller
        .make_button(1, InputPolarity::PressedWhenHigh, Pull::None, None, 0)
        .expect("make_button");
    button.set_double_click_timeout(DOUBLE);
    button.set_long_press_timeout(LONG);
    assert!(button.pressed(), "baseline update must observe the preset level");

    let log: Log = Arc::new(Mutex::new(Vec::new()));
    wire_logging(&button, &log);
    controller.start_in_thread().expect("start_in_thread");

    handle.set_level(1, false);
    thread::sleep(DOUBLE + Duration::from_millis(100));

    assert_eq!(tags(&log), vec![Tag::Release]);
    controller.stop(true);
}

/// `stop(wait = true)` blocks until a slow handler
/// completes, and no further events are produced once stopped.
#[test]
fn stop_waits_for_in_flight_handler() {
    let (driver, handle) = MockHandle::new();
    let controller = Controller::new(Box::new(driver));
    let button = controller
        .make_button(1, InputPolarity::PressedWhenHigh, Pull::None, None, 0)
        .expect("make_button");
    button.set_double_click_timeout(DOUBLE);
    button.set_long_press_timeout(LONG);

    let entered = Arc::new(Mutex::new(false));
    let entered_writer = Arc::clone(&entered);
    button.add_on_release(Handler::immediate(move |_| {
        *entered_writer.lock().unwrap() = true;
        thread::sleep(Duration::from_millis(150));
    }));

    controller.start_in_thread().expect("start_in_thread");
    handle.set_level(1, true);
    thread::sleep(Duration::from_millis(5));
    handle.set_level(1, false);

    // Give the handler a moment to actually start before we call stop,
    // so the wait genuinely exercises the drain path.
    thread::sleep(Duration::from_millis(20));
    assert!(*entered.lock().unwrap());

    let stop_started = Instant::now();
    controller.stop(true);
    assert!(stop_started.elapsed() >= Duration::from_millis(100));
    assert_eq!(controller.status(), button_gestures::Status::Stopped);

    // A post-stop edge must not produce further events or panics.
    handle.set_level(1, true);
    handle.set_level(1, false);
}
