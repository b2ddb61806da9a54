//! Scheduling requests queued for placement.

use std::cell::Cell;

use crate::core::common::ResourceId;

/// A pending placement request for exactly one server.
///
/// Requests live in the service's FIFO queue. A cancelled request keeps its
/// queue slot and is reaped lazily when it reaches the head; the `dispatched`
/// flag marks requests already consumed by a dispatch pass so that late
/// cancellations become no-ops.
pub struct SchedulingRequest {
    pub server_id: ResourceId,
    cancelled: Cell<bool>,
    dispatched: Cell<bool>,
}

impl SchedulingRequest {
    pub fn new(server_id: ResourceId) -> Self {
        Self {
            server_id,
            cancelled: Cell::new(false),
            dispatched: Cell::new(false),
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.get()
    }

    pub fn cancel(&self) {
        self.cancelled.set(true);
    }

    pub fn is_dispatched(&self) -> bool {
        self.dispatched.get()
    }

    pub fn mark_dispatched(&self) {
        self.dispatched.set(true);
    }
}
