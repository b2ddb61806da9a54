//! Aggregate counters and the metrics event stream.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use serde::Serialize;

/// Lifetime counters of the compute service.
///
/// `submitted`, `finished` and `unscheduled` are cumulative totals; `queued`
/// and `running` are gauges of the current queue depth and active set size.
#[derive(Clone, Copy, Debug, Default, Serialize)]
pub struct ServiceCounters {
    pub submitted: u64,
    pub queued: u64,
    pub running: u64,
    pub finished: u64,
    pub unscheduled: u64,
}

/// Snapshot of the service state, emitted on every observable transition.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct MetricsAvailable {
    pub time: f64,
    pub host_count: u32,
    pub available_host_count: u32,
    pub submitted: u64,
    pub running: u64,
    pub finished: u64,
    pub queued: u64,
    pub unscheduled: u64,
}

/// Hot multi-subscriber broadcast of [`MetricsAvailable`] snapshots.
///
/// Each subscriber owns an unbounded queue; the service is a producer only
/// and never blocks, subscribers drain at their own pace.
pub struct MetricsBroadcast {
    subscribers: Vec<Rc<RefCell<VecDeque<MetricsAvailable>>>>,
}

impl MetricsBroadcast {
    pub fn new() -> Self {
        Self { subscribers: Vec::new() }
    }

    pub fn subscribe(&mut self) -> MetricsSubscription {
        let queue = Rc::new(RefCell::new(VecDeque::new()));
        self.subscribers.push(queue.clone());
        MetricsSubscription { queue }
    }

    pub fn publish(&self, snapshot: MetricsAvailable) {
        for subscriber in &self.subscribers {
            subscriber.borrow_mut().push_back(snapshot.clone());
        }
    }
}

impl Default for MetricsBroadcast {
    fn default() -> Self {
        Self::new()
    }
}

/// Consumer end of the metrics stream.
pub struct MetricsSubscription {
    queue: Rc<RefCell<VecDeque<MetricsAvailable>>>,
}

impl MetricsSubscription {
    /// Removes and returns the oldest pending snapshot, if any.
    pub fn poll(&self) -> Option<MetricsAvailable> {
        self.queue.borrow_mut().pop_front()
    }

    /// Removes and returns all pending snapshots.
    pub fn drain(&self) -> Vec<MetricsAvailable> {
        self.queue.borrow_mut().drain(..).collect()
    }

    pub fn len(&self) -> usize {
        self.queue.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.borrow().is_empty()
    }
}
