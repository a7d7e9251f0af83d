use std::cell::{Cell, RefCell};
use std::rc::Rc;

use serde::Serialize;
use sugars::{rc, refcell};

use flowsim::actor::{ActorContext, ActorId, ActorRuntime, Behavior, MailboxItem, Transition};
use flowsim_core::Simulation;

#[derive(Debug, Clone, Serialize)]
struct Note {
    value: u64,
}

#[derive(Debug, Clone, Serialize)]
struct SpawnChild {}

#[derive(Debug, Clone, Serialize)]
struct Shutdown {}

#[derive(Debug, Clone, Serialize)]
struct Arm {}

struct Collector {
    log: Rc<RefCell<Vec<u64>>>,
}

impl Behavior for Collector {
    fn receive(&mut self, item: MailboxItem, _ctx: &mut ActorContext) -> Transition {
        match item {
            MailboxItem::Message(payload) => match payload.downcast::<Note>() {
                Ok(note) => {
                    self.log.borrow_mut().push(note.value);
                    Transition::Same
                }
                Err(_) => Transition::Unhandled,
            },
            MailboxItem::Signal { token } => {
                self.log.borrow_mut().push(1_000 + token);
                Transition::Same
            }
        }
    }
}

fn actor_sim() -> (Simulation, Rc<RefCell<ActorRuntime>>) {
    let mut sim = Simulation::new();
    let ctx = sim.create_context("actors");
    let runtime = rc!(refcell!(ActorRuntime::new(ctx)));
    sim.add_handler("actors", runtime.clone());
    (sim, runtime)
}

#[test]
fn mailbox_preserves_send_order() {
    let (mut sim, runtime) = actor_sim();
    let log = rc!(refcell!(Vec::new()));
    let actor = runtime
        .borrow_mut()
        .spawn(Box::new(Collector { log: log.clone() }));

    for value in [1, 2, 3] {
        runtime.borrow().send(actor, Note { value });
    }
    sim.step_until_no_events();

    assert_eq!(*log.borrow(), vec![1, 2, 3]);
}

struct Doubler {
    log: Rc<RefCell<Vec<u64>>>,
}

impl Behavior for Doubler {
    fn receive(&mut self, item: MailboxItem, _ctx: &mut ActorContext) -> Transition {
        if let MailboxItem::Message(payload) = item {
            if let Ok(note) = payload.downcast::<Note>() {
                self.log.borrow_mut().push(note.value * 2);
                return Transition::Same;
            }
        }
        Transition::Unhandled
    }
}

struct Switcher {
    log: Rc<RefCell<Vec<u64>>>,
}

impl Behavior for Switcher {
    fn receive(&mut self, item: MailboxItem, _ctx: &mut ActorContext) -> Transition {
        if let MailboxItem::Message(payload) = item {
            if let Ok(note) = payload.downcast::<Note>() {
                self.log.borrow_mut().push(note.value);
                return Transition::Become(Box::new(Doubler {
                    log: self.log.clone(),
                }));
            }
        }
        Transition::Unhandled
    }
}

#[test]
fn become_swaps_behavior_for_subsequent_messages() {
    let (mut sim, runtime) = actor_sim();
    let log = rc!(refcell!(Vec::new()));
    let actor = runtime
        .borrow_mut()
        .spawn(Box::new(Switcher { log: log.clone() }));

    runtime.borrow().send(actor, Note { value: 5 });
    runtime.borrow().send(actor, Note { value: 7 });
    sim.step_until_no_events();

    assert_eq!(*log.borrow(), vec![5, 14]);
}

#[test]
fn unhandled_messages_are_dropped_without_changing_behavior() {
    let (mut sim, runtime) = actor_sim();
    let log = rc!(refcell!(Vec::new()));
    let actor = runtime
        .borrow_mut()
        .spawn(Box::new(Collector { log: log.clone() }));

    runtime.borrow().send(actor, Shutdown {});
    runtime.borrow().send(actor, Note { value: 4 });
    sim.step_until_no_events();

    assert_eq!(*log.borrow(), vec![4]);
    assert!(runtime.borrow().is_alive(actor));
}

struct Parent {
    log: Rc<RefCell<Vec<u64>>>,
    child: Rc<Cell<Option<ActorId>>>,
}

impl Behavior for Parent {
    fn receive(&mut self, item: MailboxItem, ctx: &mut ActorContext) -> Transition {
        if let MailboxItem::Message(payload) = item {
            let payload = match payload.downcast::<SpawnChild>() {
                Ok(_) => {
                    let child = ctx.spawn(Box::new(Collector {
                        log: self.log.clone(),
                    }));
                    self.child.set(Some(child));
                    return Transition::Same;
                }
                Err(payload) => payload,
            };
            if payload.downcast::<Shutdown>().is_ok() {
                return Transition::Stop;
            }
        }
        Transition::Unhandled
    }
}

#[test]
fn stopping_a_parent_stops_its_children() {
    let (mut sim, runtime) = actor_sim();
    let log = rc!(refcell!(Vec::new()));
    let child = Rc::new(Cell::new(None));
    let parent = runtime.borrow_mut().spawn(Box::new(Parent {
        log: log.clone(),
        child: child.clone(),
    }));

    runtime.borrow().send(parent, SpawnChild {});
    sim.step_until_no_events();

    let child = child.get().unwrap();
    assert!(runtime.borrow().is_alive(child));
    runtime.borrow().send(child, Note { value: 11 });
    sim.step_until_no_events();
    assert_eq!(*log.borrow(), vec![11]);

    runtime.borrow().send(parent, Shutdown {});
    sim.step_until_no_events();
    assert!(!runtime.borrow().is_alive(parent));
    assert!(!runtime.borrow().is_alive(child));
    assert_eq!(runtime.borrow().actor_count(), 0);

    // messages to stopped actors are dropped, not fatal
    runtime.borrow().send(child, Note { value: 12 });
    sim.step_until_no_events();
    assert_eq!(*log.borrow(), vec![11]);
}

struct Waiter {
    log: Rc<RefCell<Vec<u64>>>,
    cancel_stale: bool,
}

impl Behavior for Waiter {
    fn receive(&mut self, item: MailboxItem, ctx: &mut ActorContext) -> Transition {
        match item {
            MailboxItem::Message(payload) => {
                if payload.downcast::<Arm>().is_ok() {
                    let stale = ctx.schedule_signal(5, 99);
                    if self.cancel_stale {
                        stale.cancel();
                    }
                    ctx.schedule_signal(10, 7);
                    ctx.await_signal(7);
                    return Transition::Same;
                }
                Transition::Unhandled
            }
            MailboxItem::Signal { token } => {
                self.log.borrow_mut().push(token);
                Transition::Same
            }
        }
    }
}

#[test]
fn stale_timeout_signals_are_discarded() {
    for cancel_stale in [false, true] {
        let (mut sim, runtime) = actor_sim();
        let log = rc!(refcell!(Vec::new()));
        let actor = runtime.borrow_mut().spawn(Box::new(Waiter {
            log: log.clone(),
            cancel_stale,
        }));

        runtime.borrow().send(actor, Arm {});
        sim.step_until_no_events();

        // whether cancelled outright or filtered by token, only the
        // awaited signal reaches the behavior
        assert_eq!(*log.borrow(), vec![7]);
    }
}
