use std::cmp::Ordering;
use std::collections::BinaryHeap;

use crate::error::SchedulingError;
use crate::models::Appointment;
use crate::services::records::{RecordArena, SlotId};

pub const SECONDS_PER_HOUR: i64 = 3600;

/// Snapshot of a record at the moment it was queued.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReminderEntry {
    pub time: i64,
    pub slot: SlotId,
    pub revision: u64,
}

impl ReminderEntry {
    pub fn for_record(slot: SlotId, appointment: &Appointment) -> Self {
        Self { time: appointment.time, slot, revision: appointment.revision }
    }

    /// Stale once the record is tombstoned or edited after queueing.
    fn is_live(&self, records: &RecordArena) -> bool {
        records
            .get(self.slot)
            .is_some_and(|appointment| appointment.valid && appointment.revision == self.revision)
    }
}

// Reversed so the std max-heap pops the earliest time first.
impl Ord for ReminderEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .time
            .cmp(&self.time)
            .then_with(|| other.slot.cmp(&self.slot))
            .then_with(|| other.revision.cmp(&self.revision))
    }
}

impl PartialOrd for ReminderEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Min-heap of upcoming appointments with lazy invalidation: cancelled or
/// edited records are left in place and discarded when they reach the root.
#[derive(Debug, Default)]
pub struct ReminderQueue {
    heap: BinaryHeap<ReminderEntry>,
}

impl ReminderQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, entry: ReminderEntry) {
        self.heap.push(entry);
    }

    pub fn pop(&mut self, records: &RecordArena) -> Result<ReminderEntry, SchedulingError> {
        self.discard_stale_roots(records);
        self.heap.pop().ok_or(SchedulingError::QueueEmpty)
    }

    pub fn peek(&mut self, records: &RecordArena) -> Result<ReminderEntry, SchedulingError> {
        self.discard_stale_roots(records);
        self.heap.peek().copied().ok_or(SchedulingError::QueueEmpty)
    }

    pub fn is_empty(&mut self, records: &RecordArena) -> bool {
        self.discard_stale_roots(records);
        self.heap.is_empty()
    }

    /// Slots due in `[now, now + hours_ahead)`, ascending by time.
    ///
    /// Drains the whole heap, so every stale entry is purged along the way;
    /// every live entry is pushed back afterwards.
    pub fn due_within(&mut self, now: i64, hours_ahead: i64, records: &RecordArena) -> Vec<SlotId> {
        let mut drained = Vec::with_capacity(self.heap.len());
        while let Ok(entry) = self.pop(records) {
            drained.push(entry);
        }

        let horizon = now.saturating_add(hours_ahead.saturating_mul(SECONDS_PER_HOUR));
        let due = drained
            .iter()
            .filter(|entry| entry.time >= now && entry.time < horizon)
            .map(|entry| entry.slot)
            .collect();

        self.heap.extend(drained);
        due
    }

    /// Earliest live entry at or after `now`. Past entries stay queued.
    pub fn peek_from(
        &mut self,
        now: i64,
        records: &RecordArena,
    ) -> Result<ReminderEntry, SchedulingError> {
        self.discard_stale_roots(records);
        self.heap
            .iter()
            .filter(|entry| entry.time >= now && entry.is_live(records))
            .max()
            .copied()
            .ok_or(SchedulingError::QueueEmpty)
    }

    fn discard_stale_roots(&mut self, records: &RecordArena) {
        while self.heap.peek().is_some_and(|entry| !entry.is_live(records)) {
            self.heap.pop();
        }
    }

    /// Raw heap size, stale entries included.
    pub fn len(&self) -> usize {
        self.heap.len()
    }
}
