use std::cell::RefCell;
use std::rc::Rc;

use serde::Serialize;

use flowsim_core::{cast, Event, EventHandler, Instant, Simulation, SimulationContext};

#[derive(Clone, Serialize, Debug)]
struct Fire {
    label: u32,
}

struct Recorder {
    ctx: SimulationContext,
    log: Rc<RefCell<Vec<(u32, u64)>>>,
    respawn_label: Option<u32>,
}

impl Recorder {
    fn new(ctx: SimulationContext, log: Rc<RefCell<Vec<(u32, u64)>>>) -> Self {
        Self {
            ctx,
            log,
            respawn_label: None,
        }
    }
}

impl EventHandler for Recorder {
    fn on(&mut self, event: Event) {
        cast!(match event.data {
            Fire { label } => {
                self.log.borrow_mut().push((label, self.ctx.time().nanos()));
                if let Some(respawn) = self.respawn_label.take() {
                    self.ctx.emit_self_now(Fire { label: respawn });
                }
            }
        });
    }
}

fn recorder_sim() -> (Simulation, Rc<RefCell<Recorder>>, Rc<RefCell<Vec<(u32, u64)>>>) {
    let mut sim = Simulation::new();
    let log = Rc::new(RefCell::new(Vec::new()));
    let recorder = Rc::new(RefCell::new(Recorder::new(
        sim.create_context("recorder"),
        log.clone(),
    )));
    sim.add_handler("recorder", recorder.clone());
    (sim, recorder, log)
}

#[test]
fn same_deadline_events_fire_in_insertion_order() {
    let (mut sim, recorder, log) = recorder_sim();
    let dst = recorder.borrow().ctx.id();

    let ctx = sim.create_context("driver");
    ctx.emit_at(Fire { label: 1 }, dst, Instant::from_nanos(10)).unwrap();
    ctx.emit_at(Fire { label: 2 }, dst, Instant::from_nanos(10)).unwrap();

    sim.step_until_no_events();

    assert_eq!(*log.borrow(), vec![(1, 10), (2, 10)]);
    assert_eq!(sim.time(), Instant::from_nanos(10));
}

#[test]
fn callback_scheduled_events_run_after_queued_same_deadline_events() {
    let (mut sim, recorder, log) = recorder_sim();
    let dst = recorder.borrow().ctx.id();
    recorder.borrow_mut().respawn_label = Some(99);

    let ctx = sim.create_context("driver");
    ctx.emit(Fire { label: 1 }, dst, 10);
    ctx.emit(Fire { label: 2 }, dst, 10);

    sim.step_until_no_events();

    // label 99 was emitted while handling label 1, at the same instant,
    // and must still run after the already-queued label 2
    assert_eq!(*log.borrow(), vec![(1, 10), (2, 10), (99, 10)]);
}

#[test]
fn cancellation_is_idempotent_and_terminal() {
    let (mut sim, recorder, log) = recorder_sim();
    let dst = recorder.borrow().ctx.id();

    let ctx = sim.create_context("driver");
    let doomed = ctx.schedule(Fire { label: 1 }, dst, 5);
    let kept = ctx.schedule(Fire { label: 2 }, dst, 7);

    assert!(doomed.cancel());
    assert!(!doomed.cancel());
    assert!(doomed.cancelled());
    assert!(!doomed.delivered());

    sim.step_until_no_events();

    assert_eq!(*log.borrow(), vec![(2, 7)]);
    assert!(kept.delivered());
    assert!(!kept.cancel());
    assert!(!kept.cancelled());
}

#[test]
fn cancelled_event_does_not_advance_clock() {
    let (mut sim, recorder, _log) = recorder_sim();
    let dst = recorder.borrow().ctx.id();

    let ctx = sim.create_context("driver");
    let receipt = ctx.schedule(Fire { label: 1 }, dst, 1_000);
    receipt.cancel();

    sim.step_until_no_events();
    assert_eq!(sim.time(), Instant::ZERO);
    assert_eq!(sim.event_count(), 0);
}

#[test]
fn scheduling_in_the_past_is_rejected() {
    let (mut sim, recorder, _log) = recorder_sim();
    let dst = recorder.borrow().ctx.id();

    sim.step_until_time(Instant::from_nanos(100));
    let ctx = sim.create_context("driver");

    let err = ctx
        .emit_at(Fire { label: 1 }, dst, Instant::from_nanos(50))
        .unwrap_err();
    assert_eq!(err.deadline, Instant::from_nanos(50));
    assert_eq!(err.now, Instant::from_nanos(100));

    // a deadline equal to now is fine
    assert!(ctx.emit_at(Fire { label: 2 }, dst, Instant::from_nanos(100)).is_ok());
}

#[test]
fn step_until_time_advances_clock_without_events() {
    let mut sim = Simulation::new();
    sim.step_until_time(Instant::from_millis(3));
    assert_eq!(sim.time(), Instant::from_millis(3));

    // moving the limit backwards never rewinds the clock
    sim.step_until_time(Instant::from_millis(1));
    assert_eq!(sim.time(), Instant::from_millis(3));
}

#[test]
fn step_until_time_leaves_later_events_queued() {
    let (mut sim, recorder, log) = recorder_sim();
    let dst = recorder.borrow().ctx.id();

    let ctx = sim.create_context("driver");
    ctx.emit(Fire { label: 1 }, dst, 10);
    ctx.emit(Fire { label: 2 }, dst, 500);

    sim.step_until_time(Instant::from_nanos(100));
    assert_eq!(*log.borrow(), vec![(1, 10)]);
    assert_eq!(sim.time(), Instant::from_nanos(100));
    assert_eq!(sim.event_count(), 1);

    sim.step_until_no_events();
    assert_eq!(*log.borrow(), vec![(1, 10), (2, 500)]);
    assert_eq!(sim.time(), Instant::from_nanos(500));
}
