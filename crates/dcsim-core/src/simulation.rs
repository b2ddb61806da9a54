//! Simulation configuration and execution.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use log::Level::Trace;
use log::{log_enabled, trace};
use rand::distributions::uniform::{SampleRange, SampleUniform};
use serde_json::json;
use serde_type_name::type_name;

use crate::context::SimulationContext;
use crate::engine::Engine;
use crate::handler::EventHandler;
use crate::log::{log_dropped_event, paint};
use crate::Id;

// One registered component: its name plus the handler, if one was installed.
struct Slot {
    name: String,
    handler: Option<Rc<RefCell<dyn EventHandler>>>,
}

/// Represents a simulation, provides methods for its configuration and
/// execution.
///
/// Components are registered by name and identified by the sequential id the
/// registration produced. Driving the simulation means pumping events out of
/// the internal queue with [`step`](Self::step) and friends.
pub struct Simulation {
    engine: Rc<RefCell<Engine>>,
    slots: Vec<Slot>,
    index: HashMap<String, Id>,
}

impl Simulation {
    /// Creates a new simulation with the specified random seed.
    pub fn new(seed: u64) -> Self {
        Self {
            engine: Rc::new(RefCell::new(Engine::new(seed))),
            slots: Vec::new(),
            index: HashMap::new(),
        }
    }

    fn slot_id(&mut self, name: &str) -> Id {
        if let Some(&id) = self.index.get(name) {
            return id;
        }
        let id = self.slots.len() as Id;
        self.slots.push(Slot {
            name: name.to_owned(),
            handler: None,
        });
        self.index.insert(name.to_owned(), id);
        id
    }

    /// Returns the identifier of the component with the given name.
    ///
    /// Panics if no component with such name exists.
    pub fn lookup_id(&self, name: &str) -> Id {
        self.index[name]
    }

    /// Returns the name of the component with the given identifier.
    ///
    /// Panics if no component with such id exists.
    pub fn lookup_name(&self, id: Id) -> String {
        self.slots[id as usize].name.clone()
    }

    /// Creates a new simulation context for the component with the given
    /// name, registering the component if it is new.
    pub fn create_context<S>(&mut self, name: S) -> SimulationContext
    where
        S: AsRef<str>,
    {
        let id = self.slot_id(name.as_ref());
        SimulationContext::new(id, name.as_ref(), self.engine.clone())
    }

    /// Installs the event handler for the component with the given name and
    /// returns the component id. An id assigned earlier by
    /// [`create_context`](Self::create_context) is reused.
    pub fn add_handler<S>(&mut self, name: S, handler: Rc<RefCell<dyn EventHandler>>) -> Id
    where
        S: AsRef<str>,
    {
        let id = self.slot_id(name.as_ref());
        self.slots[id as usize].handler = Some(handler);
        id
    }

    /// Uninstalls the event handler of the component with the given name.
    /// Subsequent events for this component are dropped (and reported) until
    /// a handler is installed again.
    pub fn remove_handler<S>(&mut self, name: S)
    where
        S: AsRef<str>,
    {
        let id = self.lookup_id(name.as_ref());
        self.slots[id as usize].handler = None;
    }

    /// Returns the current simulation time.
    pub fn time(&self) -> f64 {
        self.engine.borrow().now()
    }

    /// Delivers the next pending event, advancing the clock to its time.
    ///
    /// Returns `false` when the queue is exhausted and no progress can be
    /// made; `true` otherwise, whether or not the event found a handler.
    pub fn step(&mut self) -> bool {
        let event = match self.engine.borrow_mut().pop() {
            Some(event) => event,
            None => return false,
        };
        let handler = self
            .slots
            .get(event.target as usize)
            .and_then(|slot| slot.handler.clone());
        match handler {
            Some(handler) => {
                if log_enabled!(Trace) {
                    let target_name = self.lookup_name(event.target);
                    trace!(
                        target: &target_name,
                        "{:.3} {} {}  {}",
                        event.time,
                        paint("EVENT"),
                        target_name,
                        json!({
                            "type": type_name(&&*event.payload).unwrap_or("?"),
                            "payload": &*event.payload,
                            "source": self.lookup_name(event.source),
                        })
                    );
                }
                handler.borrow_mut().on(event);
            }
            None => log_dropped_event("undelivered", event.time, event.source, event.target, &*event.payload),
        }
        true
    }

    /// Delivers up to `step_count` events, stopping early when the queue is
    /// exhausted. Returns `true` if there could be more pending events.
    pub fn steps(&mut self, step_count: u64) -> bool {
        for _ in 0..step_count {
            if !self.step() {
                return false;
            }
        }
        true
    }

    /// Delivers events until there are none left.
    pub fn step_until_no_events(&mut self) {
        while self.step() {}
    }

    /// Delivers all events up to `current_time + duration`; the clock never
    /// advances past the first event beyond that horizon.
    ///
    /// Returns `true` if there could be more pending events.
    pub fn step_for_duration(&mut self, duration: f64) -> bool {
        let horizon = self.time() + duration;
        loop {
            match self.engine.borrow_mut().next_time() {
                Some(time) if time <= horizon => {}
                Some(_) => return true,
                None => return false,
            }
            self.step();
        }
    }

    /// Returns a random float in the range `[0, 1)` using the
    /// simulation-wide random number generator.
    pub fn rand(&mut self) -> f64 {
        self.engine.borrow_mut().random()
    }

    /// Returns a random number in the specified range using the
    /// simulation-wide random number generator.
    pub fn gen_range<T, R>(&mut self, range: R) -> T
    where
        T: SampleUniform,
        R: SampleRange<T>,
    {
        self.engine.borrow_mut().random_range(range)
    }

    /// Returns the total number of created events, cancelled ones included.
    pub fn event_count(&self) -> u64 {
        self.engine.borrow().issued()
    }
}
