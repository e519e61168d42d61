use std::collections::HashMap;

use crate::services::records::{RecordArena, SlotId};

/// Per-patient and per-doctor buckets of record slots, in insertion order.
/// Buckets may hold tombstoned slots until the next prune of that bucket.
#[derive(Debug, Default)]
pub struct PersonIndex {
    by_patient: HashMap<String, Vec<SlotId>>,
    by_doctor: HashMap<String, Vec<SlotId>>,
}

impl PersonIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, patient_id: &str, doctor_id: &str, slot: SlotId) {
        self.by_patient.entry(patient_id.to_string()).or_default().push(slot);
        self.by_doctor.entry(doctor_id.to_string()).or_default().push(slot);
    }

    /// Drops `slot` from both buckets. Used to back out a failed insert.
    pub fn remove(&mut self, patient_id: &str, doctor_id: &str, slot: SlotId) {
        remove_from(&mut self.by_patient, patient_id, slot);
        remove_from(&mut self.by_doctor, doctor_id, slot);
    }

    pub fn move_doctor(&mut self, slot: SlotId, old_doctor_id: &str, new_doctor_id: &str) {
        remove_from(&mut self.by_doctor, old_doctor_id, slot);
        self.by_doctor.entry(new_doctor_id.to_string()).or_default().push(slot);
    }

    pub fn patient_bucket(&self, patient_id: &str) -> &[SlotId] {
        self.by_patient.get(patient_id).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn doctor_bucket(&self, doctor_id: &str) -> &[SlotId] {
        self.by_doctor.get(doctor_id).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Purges tombstoned slots from a doctor's bucket.
    pub fn prune_doctor(&mut self, doctor_id: &str, records: &RecordArena) {
        prune(&mut self.by_doctor, doctor_id, records);
    }

    pub fn prune_patient(&mut self, patient_id: &str, records: &RecordArena) {
        prune(&mut self.by_patient, patient_id, records);
    }
}

fn remove_from(buckets: &mut HashMap<String, Vec<SlotId>>, key: &str, slot: SlotId) {
    if let Some(bucket) = buckets.get_mut(key) {
        bucket.retain(|s| *s != slot);
        if bucket.is_empty() {
            buckets.remove(key);
        }
    }
}

fn prune(buckets: &mut HashMap<String, Vec<SlotId>>, key: &str, records: &RecordArena) {
    if let Some(bucket) = buckets.get_mut(key) {
        bucket.retain(|slot| records.is_valid(*slot));
        if bucket.is_empty() {
            buckets.remove(key);
        }
    }
}
