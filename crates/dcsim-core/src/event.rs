//! Simulation events.

use downcast_rs::{impl_downcast, Downcast};

use crate::Id;

/// Event identifier, assigned sequentially starting from 0.
pub type EventId = u64;

/// Trait implemented by event payloads.
///
/// Any `'static` type that is `Serialize` gets this for free through the
/// blanket impl below. Payloads are serializable so the kernel can render
/// them in trace and error logs; handlers recover the concrete type by
/// downcasting. Payloads move with the event and are consumed on delivery,
/// so they do not need to be clonable.
pub trait Payload: Downcast + erased_serde::Serialize {}

impl_downcast!(Payload);

erased_serde::serialize_trait_object!(Payload);

impl<T: serde::Serialize + 'static> Payload for T {}

/// A scheduled occurrence delivered to a single target component.
///
/// Events carry no ordering of their own; the delivery order (by time, then
/// by creation id) is the concern of the kernel's internal queue.
pub struct Event {
    /// Unique event identifier.
    pub id: EventId,
    /// Simulated time of occurrence.
    pub time: f64,
    /// Identifier of the component that produced the event.
    pub source: Id,
    /// Identifier of the component the event is delivered to.
    pub target: Id,
    /// Erased event payload, consumed by the receiving handler.
    pub payload: Box<dyn Payload>,
}
