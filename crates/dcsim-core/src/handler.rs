//! Event handling.

use crate::event::Event;

/// Trait for consuming events in simulation components.
pub trait EventHandler {
    /// Processes a single event delivered to this component.
    fn on(&mut self, event: Event);
}

/// Dispatches an event to one of the listed payload types.
///
/// The event's payload box is threaded through the candidate types: each
/// failed downcast hands the box back and the next type is tried. The first
/// match destructures the payload into the given fields and runs the arm
/// body. If no arm matches, the event is reported as unrouted at `ERROR`
/// level, so arms need not be exhaustive.
///
/// # Examples
///
/// ```rust
/// use std::cell::RefCell;
/// use std::rc::Rc;
/// use serde::Serialize;
/// use dcsim_core::{route, Event, EventHandler, Simulation};
///
/// #[derive(Serialize)]
/// pub struct SliceCompleted {
///     elapsed: f64,
/// }
///
/// pub struct Worker {
///     total: f64,
/// }
///
/// impl EventHandler for Worker {
///     fn on(&mut self, event: Event) {
///         route!(match event {
///             SliceCompleted { elapsed } => {
///                 self.total += elapsed;
///             }
///         })
///     }
/// }
///
/// let mut sim = Simulation::new(123);
/// let worker = Rc::new(RefCell::new(Worker { total: 0.0 }));
/// let worker_id = sim.add_handler("worker", worker.clone());
/// let ctx = sim.create_context("driver");
/// ctx.emit(SliceCompleted { elapsed: 1.5 }, worker_id, 1.5);
/// sim.step_until_no_events();
/// assert_eq!(worker.borrow().total, 1.5);
/// ```
#[macro_export]
macro_rules! route {
    ( match $event:ident { $( $type:ident { $($fields:tt)* } => $body:block )+ } ) => {{
        let (__time, __source, __target) = ($event.time, $event.source, $event.target);
        let __unrouted = 'routed: {
            let mut __payload = $event.payload;
            $(
                __payload = match __payload.downcast::<$type>() {
                    Ok(__boxed) => {
                        let $type { $($fields)* } = *__boxed;
                        $body
                        break 'routed None;
                    }
                    Err(__payload) => __payload,
                };
            )+
            Some(__payload)
        };
        if let Some(__payload) = __unrouted {
            $crate::log::log_dropped_event("unrouted", __time, __source, __target, &*__payload);
        }
    }};
}
