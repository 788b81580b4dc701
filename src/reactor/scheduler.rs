use super::event::Event;
use super::queue::EventQueue;
use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::time::{Duration, Instant};

struct ScheduledEvent {
	emit_at: Instant,
	seq: u64,
	event: Event,
}

impl PartialEq for ScheduledEvent {
	fn eq(&self, other: &Self) -> bool {
		self.emit_at == other.emit_at && self.seq == other.seq
	}
}

impl Eq for ScheduledEvent {}

impl PartialOrd for ScheduledEvent {
	fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
		Some(self.cmp(other))
	}
}

impl Ord for ScheduledEvent {
	fn cmp(&self, other: &Self) -> Ordering {
		// Min-heap on (emit_at, seq)
		other
			.emit_at
			.cmp(&self.emit_at)
			.then_with(|| other.seq.cmp(&self.seq))
	}
}

pub struct Scheduler {
	pending: BinaryHeap<ScheduledEvent>,
	next_seq: u64,
}

impl Scheduler {
	pub fn new() -> Self {
		Self {
			pending: BinaryHeap::new(),
			next_seq: 0,
		}
	}

	/// Schedule an event to fire `delay` after `now`
	pub fn schedule(&mut self, event: Event, delay: Duration, now: Instant) {
		self.pending.push(ScheduledEvent {
			emit_at: now + delay,
			seq: self.next_seq,
			event,
		});
		self.next_seq += 1;
	}

	/// Drain events due at `now` into the queue
	pub fn tick(&mut self, now: Instant, queue: &mut EventQueue) {
		while let Some(scheduled) = self.pending.peek() {
			if scheduled.emit_at > now {
				break;
			}
			if let Some(scheduled) = self.pending.pop() {
				queue.push(scheduled.event);
			}
		}
	}

	pub fn pending(&self) -> usize {
		self.pending.len()
	}
}

impl Default for Scheduler {
	fn default() -> Self {
		Self::new()
	}
}
