use std::cell::RefCell;
use std::rc::Rc;

use serde::Serialize;

use dcsim_core::{route, Event, EventHandler, Simulation};

#[derive(Serialize)]
struct Ping {
    seq: u32,
}

struct Receiver {
    received: Vec<(f64, u32)>,
}

impl EventHandler for Receiver {
    fn on(&mut self, event: Event) {
        let time = event.time;
        route!(match event {
            Ping { seq } => {
                self.received.push((time, seq));
            }
        })
    }
}

#[test]
fn events_are_delivered_in_time_order() {
    let mut sim = Simulation::new(123);
    let receiver = Rc::new(RefCell::new(Receiver { received: Vec::new() }));
    let receiver_id = sim.add_handler("receiver", receiver.clone());
    let sender_ctx = sim.create_context("sender");

    sender_ctx.emit(Ping { seq: 2 }, receiver_id, 5.0);
    sender_ctx.emit(Ping { seq: 0 }, receiver_id, 1.0);
    sender_ctx.emit(Ping { seq: 1 }, receiver_id, 3.0);

    sim.step_until_no_events();

    assert_eq!(sim.time(), 5.0);
    assert_eq!(receiver.borrow().received, vec![(1.0, 0), (3.0, 1), (5.0, 2)]);
}

#[test]
fn simultaneous_events_are_delivered_in_emission_order() {
    let mut sim = Simulation::new(123);
    let receiver = Rc::new(RefCell::new(Receiver { received: Vec::new() }));
    let receiver_id = sim.add_handler("receiver", receiver.clone());
    let sender_ctx = sim.create_context("sender");

    for seq in 0..4 {
        sender_ctx.emit(Ping { seq }, receiver_id, 2.0);
    }
    sim.step_until_no_events();

    let seqs: Vec<u32> = receiver.borrow().received.iter().map(|(_, s)| *s).collect();
    assert_eq!(seqs, vec![0, 1, 2, 3]);
}

#[test]
fn cancelled_events_are_not_delivered() {
    let mut sim = Simulation::new(123);
    let receiver = Rc::new(RefCell::new(Receiver { received: Vec::new() }));
    let receiver_id = sim.add_handler("receiver", receiver.clone());
    let sender_ctx = sim.create_context("sender");

    sender_ctx.emit(Ping { seq: 0 }, receiver_id, 1.0);
    let cancelled = sender_ctx.emit(Ping { seq: 1 }, receiver_id, 2.0);
    sender_ctx.emit(Ping { seq: 2 }, receiver_id, 3.0);
    sender_ctx.cancel_event(cancelled);

    sim.step_until_no_events();

    assert_eq!(sim.time(), 3.0);
    assert_eq!(receiver.borrow().received, vec![(1.0, 0), (3.0, 2)]);
}

#[test]
fn step_for_duration_does_not_cross_the_horizon() {
    let mut sim = Simulation::new(123);
    let receiver = Rc::new(RefCell::new(Receiver { received: Vec::new() }));
    let receiver_id = sim.add_handler("receiver", receiver.clone());
    let sender_ctx = sim.create_context("sender");

    sender_ctx.emit(Ping { seq: 0 }, receiver_id, 1.0);
    sender_ctx.emit(Ping { seq: 1 }, receiver_id, 10.0);

    let more = sim.step_for_duration(5.0);
    assert!(more);
    assert_eq!(sim.time(), 1.0);
    assert_eq!(receiver.borrow().received.len(), 1);

    let more = sim.step_for_duration(100.0);
    assert!(!more);
    assert_eq!(sim.time(), 10.0);
    assert_eq!(receiver.borrow().received.len(), 2);
}

#[test]
// A cancelled event at the head of the queue must not make step_for_duration
// think work is pending before the horizon.
fn cancelled_head_does_not_stall_step_for_duration() {
    let mut sim = Simulation::new(123);
    let receiver = Rc::new(RefCell::new(Receiver { received: Vec::new() }));
    let receiver_id = sim.add_handler("receiver", receiver.clone());
    let sender_ctx = sim.create_context("sender");

    let cancelled = sender_ctx.emit(Ping { seq: 0 }, receiver_id, 1.0);
    sender_ctx.emit(Ping { seq: 1 }, receiver_id, 10.0);
    sender_ctx.cancel_event(cancelled);

    let more = sim.step_for_duration(5.0);
    assert!(more);
    assert_eq!(sim.time(), 0.0);
    assert!(receiver.borrow().received.is_empty());

    sim.step_until_no_events();
    assert_eq!(receiver.borrow().received, vec![(10.0, 1)]);
}

#[test]
fn seeded_runs_are_deterministic() {
    let mut first = Vec::new();
    let mut second = Vec::new();
    for values in [&mut first, &mut second] {
        let mut sim = Simulation::new(42);
        for _ in 0..16 {
            values.push(sim.gen_range(0..1_000_000u64));
        }
    }
    assert_eq!(first, second);
}
