use std::collections::hash_map::Entry;
use std::collections::HashMap;

use crate::error::SchedulingError;
use crate::services::records::SlotId;

/// Appointment id -> record slot. The authoritative existence check.
#[derive(Debug, Default)]
pub struct IdentityIndex {
    slots: HashMap<String, SlotId>,
}

impl IdentityIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, id: &str, slot: SlotId) -> Result<(), SchedulingError> {
        match self.slots.entry(id.to_string()) {
            Entry::Occupied(_) => Err(SchedulingError::DuplicateId(id.to_string())),
            Entry::Vacant(entry) => {
                entry.insert(slot);
                Ok(())
            }
        }
    }

    pub fn find(&self, id: &str) -> Option<SlotId> {
        self.slots.get(id).copied()
    }

    pub fn remove(&mut self, id: &str) -> Option<SlotId> {
        self.slots.remove(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.slots.contains_key(id)
    }

    pub fn slots(&self) -> impl Iterator<Item = SlotId> + '_ {
        self.slots.values().copied()
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}
