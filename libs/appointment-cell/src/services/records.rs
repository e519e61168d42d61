use crate::models::Appointment;

/// Handle to a record in the [`RecordArena`]. Stable for the lifetime of the
/// arena; never reused while any index may still hold it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SlotId(usize);

impl SlotId {
    pub fn index(&self) -> usize {
        self.0
    }
}

/// Owns every appointment record. Cancelled records stay behind as tombstones
/// so the reminder heap and stale person buckets can still inspect them.
#[derive(Debug, Default)]
pub struct RecordArena {
    slots: Vec<Appointment>,
}

impl RecordArena {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, appointment: Appointment) -> SlotId {
        self.slots.push(appointment);
        SlotId(self.slots.len() - 1)
    }

    pub fn get(&self, slot: SlotId) -> Option<&Appointment> {
        self.slots.get(slot.0)
    }

    pub fn get_mut(&mut self, slot: SlotId) -> Option<&mut Appointment> {
        self.slots.get_mut(slot.0)
    }

    /// True when the slot holds a record that is visible to readers.
    pub fn is_valid(&self, slot: SlotId) -> bool {
        self.get(slot).is_some_and(|appointment| appointment.valid)
    }

    /// Backs out a slot allocated by an operation that failed part-way.
    /// The most recent slot is popped; any other slot is only tombstoned,
    /// since later handles must keep their positions.
    pub fn discard(&mut self, slot: SlotId) {
        if slot.0 + 1 == self.slots.len() {
            self.slots.pop();
        } else if let Some(appointment) = self.slots.get_mut(slot.0) {
            appointment.valid = false;
        }
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::InitialStatus;

    fn record(id: &str) -> Appointment {
        Appointment::new(id, "P1", "D1", 1_000, InitialStatus::Pending)
    }

    #[test]
    fn test_insert_and_lookup() {
        let mut arena = RecordArena::new();
        let a = arena.insert(record("A1"));
        let b = arena.insert(record("A2"));

        assert_ne!(a, b);
        assert_eq!(arena.get(a).unwrap().id, "A1");
        assert!(arena.is_valid(b));
        assert_eq!(arena.len(), 2);
    }

    #[test]
    fn test_discard_last_slot_pops() {
        let mut arena = RecordArena::new();
        let a = arena.insert(record("A1"));
        let b = arena.insert(record("A2"));

        arena.discard(b);
        assert_eq!(arena.len(), 1);
        assert!(arena.get(b).is_none());

        let c = arena.insert(record("A3"));
        arena.insert(record("A4"));
        arena.discard(c);
        assert_eq!(arena.len(), 3);
        assert!(!arena.is_valid(c));
        assert!(arena.is_valid(a));
    }
}
