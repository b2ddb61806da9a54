use std::cmp::{Ordering, Reverse};
use std::collections::{BinaryHeap, HashSet};

use rand::distributions::uniform::{SampleRange, SampleUniform};
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg64;

use crate::event::{Event, EventId, Payload};
use crate::Id;

// Wrapper giving events their delivery order: by time, ties broken by
// creation id so simultaneous events keep emission order. Wrapped in
// `Reverse` below to turn the max-heap into an earliest-first queue.
struct QueuedEvent(Event);

impl PartialEq for QueuedEvent {
    fn eq(&self, other: &Self) -> bool {
        self.0.id == other.0.id
    }
}

impl Eq for QueuedEvent {}

impl Ord for QueuedEvent {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.time.total_cmp(&other.0.time).then_with(|| self.0.id.cmp(&other.0.id))
    }
}

impl PartialOrd for QueuedEvent {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// The mutable heart of a simulation: the clock, the pending-event queue,
/// the cancellation set and the seeded random number generator.
pub(crate) struct Engine {
    now: f64,
    issued: u64,
    pending: BinaryHeap<Reverse<QueuedEvent>>,
    cancelled: HashSet<EventId>,
    rng: Pcg64,
}

impl Engine {
    pub fn new(seed: u64) -> Self {
        Self {
            now: 0.0,
            issued: 0,
            pending: BinaryHeap::new(),
            cancelled: HashSet::new(),
            rng: Pcg64::seed_from_u64(seed),
        }
    }

    pub fn now(&self) -> f64 {
        self.now
    }

    pub fn schedule<T>(&mut self, payload: T, source: Id, target: Id, delay: f64) -> EventId
    where
        T: Payload,
    {
        assert!(delay >= 0., "cannot schedule an event in the past");
        let id = self.issued;
        self.issued += 1;
        self.pending.push(Reverse(QueuedEvent(Event {
            id,
            time: self.now + delay,
            source,
            target,
            payload: Box::new(payload),
        })));
        id
    }

    /// Removes the earliest live event, advancing the clock to its time.
    /// Cancelled events are silently discarded along the way.
    pub fn pop(&mut self) -> Option<Event> {
        while let Some(Reverse(QueuedEvent(event))) = self.pending.pop() {
            if self.cancelled.remove(&event.id) {
                continue;
            }
            self.now = event.time;
            return Some(event);
        }
        None
    }

    /// Time of the earliest live event, pruning cancelled queue heads so the
    /// answer is exact.
    pub fn next_time(&mut self) -> Option<f64> {
        loop {
            let (id, time) = match self.pending.peek() {
                Some(Reverse(QueuedEvent(event))) => (event.id, event.time),
                None => return None,
            };
            if self.cancelled.remove(&id) {
                self.pending.pop();
                continue;
            }
            return Some(time);
        }
    }

    pub fn cancel(&mut self, id: EventId) {
        self.cancelled.insert(id);
    }

    /// Total number of events created so far, cancelled ones included.
    pub fn issued(&self) -> u64 {
        self.issued
    }

    pub fn random(&mut self) -> f64 {
        self.rng.gen_range(0.0..1.0)
    }

    pub fn random_range<T, R>(&mut self, range: R) -> T
    where
        T: SampleUniform,
        R: SampleRange<T>,
    {
        self.rng.gen_range(range)
    }
}
