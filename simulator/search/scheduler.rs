//! Virtual clock and delivery queue.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use p2p_search::{MessageEnvelope, SimTime};

/// An envelope due at `time`. `seq` orders deliveries scheduled for the
/// same tick in scheduling order.
#[derive(Debug, Clone)]
pub struct ScheduledDelivery {
    pub time: SimTime,
    pub seq: u64,
    pub envelope: MessageEnvelope,
}

impl PartialEq for ScheduledDelivery {
    fn eq(&self, other: &Self) -> bool {
        self.time == other.time && self.seq == other.seq
    }
}

impl Eq for ScheduledDelivery {}

impl PartialOrd for ScheduledDelivery {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ScheduledDelivery {
    fn cmp(&self, other: &Self) -> Ordering {
        // reversed: BinaryHeap is a max-heap
        other.time.cmp(&self.time).then_with(|| other.seq.cmp(&self.seq))
    }
}

/// Min-queue of deliveries plus the current virtual time.
#[derive(Debug, Default)]
pub struct EventQueue {
    now: SimTime,
    next_seq: u64,
    heap: BinaryHeap<ScheduledDelivery>,
}

impl EventQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn now(&self) -> SimTime {
        self.now
    }

    /// Schedule `envelope` at `now + envelope.delay`, saturating at the end
    /// of time.
    pub fn schedule(&mut self, envelope: MessageEnvelope) {
        let time = self.now.saturating_add(envelope.delay);
        self.schedule_at(time, envelope);
    }

    /// Schedule at an absolute time. Times in the past are clamped to now.
    pub fn schedule_at(&mut self, time: SimTime, envelope: MessageEnvelope) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.heap.push(ScheduledDelivery {
            time: time.max(self.now),
            seq,
            envelope,
        });
    }

    /// Next delivery due at or before `end` (None = no end time). Advances
    /// the clock to its time.
    pub fn pop_due(&mut self, end: Option<SimTime>) -> Option<ScheduledDelivery> {
        let next_time = self.heap.peek()?.time;
        if end.map_or(false, |end| next_time > end) {
            return None;
        }
        let delivery = self.heap.pop()?;
        self.now = delivery.time;
        Some(delivery)
    }

    pub fn peek_time(&self) -> Option<SimTime> {
        self.heap.peek().map(|d| d.time)
    }

    pub fn len(&self) -> usize {
        self.heap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }
}
