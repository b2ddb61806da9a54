//! Accessing the simulation from components.

use std::cell::RefCell;
use std::rc::Rc;

use crate::engine::Engine;
use crate::event::{EventId, Payload};
use crate::Id;

/// Hands a single component access to the simulated clock and the event
/// queue. Cheap to clone; every component owns one.
#[derive(Clone)]
pub struct SimulationContext {
    id: Id,
    name: String,
    engine: Rc<RefCell<Engine>>,
}

impl SimulationContext {
    pub(crate) fn new(id: Id, name: &str, engine: Rc<RefCell<Engine>>) -> Self {
        Self {
            id,
            name: name.to_owned(),
            engine,
        }
    }

    /// Identifier of the component this context belongs to.
    pub fn id(&self) -> Id {
        self.id
    }

    /// Name of the component this context belongs to.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Current simulated time.
    pub fn time(&self) -> f64 {
        self.engine.borrow().now()
    }

    /// Schedules `payload` for delivery to `target` after `delay`.
    ///
    /// Panics on negative delays: the past cannot be scheduled.
    pub fn emit<T>(&self, payload: T, target: Id, delay: f64) -> EventId
    where
        T: Payload,
    {
        self.engine.borrow_mut().schedule(payload, self.id, target, delay)
    }

    /// Schedules `payload` for delivery to `target` at the current time.
    pub fn emit_now<T>(&self, payload: T, target: Id) -> EventId
    where
        T: Payload,
    {
        self.emit(payload, target, 0.)
    }

    /// Schedules `payload` for delivery back to this component after `delay`.
    pub fn emit_self<T>(&self, payload: T, delay: f64) -> EventId
    where
        T: Payload,
    {
        self.engine.borrow_mut().schedule(payload, self.id, self.id, delay)
    }

    /// Cancels a pending event. Events already delivered are unaffected.
    pub fn cancel_event(&self, id: EventId) {
        self.engine.borrow_mut().cancel(id);
    }
}
