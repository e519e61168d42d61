use tracing::{debug, info, warn};

use shared_models::auth::RequesterRole;
use shared_utils::time::now_timestamp;

use crate::error::SchedulingError;
use crate::models::{
    Appointment, AppointmentStatus, AppointmentView, InitialStatus, SchedulingStats,
};
use crate::services::conflict::ConflictDetector;
use crate::services::doctor_sequence::DoctorSequence;
use crate::services::identity::IdentityIndex;
use crate::services::person::PersonIndex;
use crate::services::records::{RecordArena, SlotId};
use crate::services::reminder::{ReminderEntry, ReminderQueue};
use crate::services::time_index::TimeIndex;

/// Owns the appointment records and the four indexes over them, and is the
/// only code that mutates either.
///
/// Not safe for concurrent mutation; callers sharing one engine must put it
/// behind a single lock.
#[derive(Debug, Default)]
pub struct SchedulingEngine {
    records: RecordArena,
    identity: IdentityIndex,
    people: PersonIndex,
    timeline: TimeIndex,
    reminders: ReminderQueue,
    doctor_sequence: DoctorSequence,
    conflicts: ConflictDetector,
}

impl SchedulingEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_conflict_window(window_seconds: i64) -> Self {
        Self {
            conflicts: ConflictDetector::new(window_seconds),
            ..Self::default()
        }
    }

    pub fn conflict_window_seconds(&self) -> i64 {
        self.conflicts.window_seconds()
    }

    // ==========================================================================
    // LIFECYCLE
    // ==========================================================================

    /// Books a new appointment after checking the doctor's availability.
    ///
    /// Index order is identity, person buckets, time tree, reminder heap,
    /// doctor sequence. A failure after the identity insert backs out every
    /// earlier step, so no id is left without index entries.
    pub fn create(
        &mut self,
        id: &str,
        patient_id: &str,
        doctor_id: &str,
        time: i64,
        status: InitialStatus,
    ) -> Result<(), SchedulingError> {
        debug!(
            "Creating appointment {} for patient {} with doctor {} at {}",
            id, patient_id, doctor_id, time
        );

        self.people.prune_doctor(doctor_id, &self.records);
        self.people.prune_patient(patient_id, &self.records);
        self.conflicts.check_doctor_availability(
            doctor_id,
            self.people.doctor_bucket(doctor_id),
            &self.records,
            time,
            None,
        )?;

        let slot = self.records.insert(Appointment::new(id, patient_id, doctor_id, time, status));

        if let Err(err) = self.identity.insert(id, slot) {
            warn!("Rejected create for {}: {}", id, err);
            self.records.discard(slot);
            return Err(err);
        }

        self.people.insert(patient_id, doctor_id, slot);

        if let Err(err) = self.timeline.insert(slot, &self.records) {
            warn!("Rolling back create for {}: {}", id, err);
            self.people.remove(patient_id, doctor_id, slot);
            self.identity.remove(id);
            self.records.discard(slot);
            return Err(err);
        }

        self.queue_reminder(slot);
        self.doctor_sequence.append(slot);

        info!("Appointment {} booked with doctor {} at {}", id, doctor_id, time);
        Ok(())
    }

    /// Cancels on behalf of one of the appointment's parties. The record is
    /// tombstoned; the reminder heap and person buckets drop it lazily.
    pub fn cancel(
        &mut self,
        id: &str,
        requester_id: &str,
        role: RequesterRole,
    ) -> Result<(), SchedulingError> {
        debug!("Cancelling appointment {} as {} {}", id, role, requester_id);

        let slot = self
            .identity
            .find(id)
            .ok_or_else(|| SchedulingError::NotFound(id.to_string()))?;
        let record = self.record_mut(slot, id)?;

        let party = match role {
            RequesterRole::Doctor => &record.doctor_id,
            RequesterRole::Patient => &record.patient_id,
        };
        if party != requester_id {
            warn!("{} {} attempted to cancel appointment {}", role, requester_id, id);
            return Err(SchedulingError::PermissionDenied(format!(
                "{} is not the {} of appointment {}",
                requester_id, role, id
            )));
        }

        record.valid = false;
        self.identity.remove(id);
        self.timeline.remove(slot);
        self.doctor_sequence.remove(slot);

        info!("Appointment {} cancelled by {} {}", id, role, requester_id);
        Ok(())
    }

    /// Moves an appointment to `new_time` with `new_doctor_id`. All checks run
    /// before anything is mutated.
    pub fn edit(
        &mut self,
        id: &str,
        new_time: i64,
        new_doctor_id: &str,
    ) -> Result<(), SchedulingError> {
        debug!("Editing appointment {} to doctor {} at {}", id, new_doctor_id, new_time);

        let slot = self.live_slot(id)?;

        self.people.prune_doctor(new_doctor_id, &self.records);
        self.conflicts.check_doctor_availability(
            new_doctor_id,
            self.people.doctor_bucket(new_doctor_id),
            &self.records,
            new_time,
            Some(slot),
        )?;

        let (patient_id, old_doctor_id) = {
            let record = self.record_mut(slot, id)?;
            (record.patient_id.clone(), record.doctor_id.clone())
        };
        if self
            .timeline
            .has_collision(&patient_id, new_doctor_id, new_time, Some(slot), &self.records)
        {
            warn!("Rejected edit for {}: exact-time collision at {}", id, new_time);
            return Err(SchedulingError::TimeConflict { time: new_time });
        }

        self.timeline.remove(slot);
        self.doctor_sequence.remove(slot);
        self.people.move_doctor(slot, &old_doctor_id, new_doctor_id);

        let record = self.record_mut(slot, id)?;
        record.time = new_time;
        record.doctor_id = new_doctor_id.to_string();
        record.valid = true;
        record.revision += 1;

        self.timeline.insert(slot, &self.records)?;
        self.queue_reminder(slot);
        self.doctor_sequence.append(slot);

        info!(
            "Appointment {} moved from doctor {} to {} at {}",
            id, old_doctor_id, new_doctor_id, new_time
        );
        Ok(())
    }

    /// Doctor's decision on a booking. Rejection is terminal and hides the
    /// appointment from every query.
    pub fn confirm(
        &mut self,
        id: &str,
        doctor_id: &str,
        accept: bool,
    ) -> Result<(), SchedulingError> {
        let action = if accept { "confirming" } else { "rejecting" };
        debug!("Doctor {} {} appointment {}", doctor_id, action, id);

        let slot = self
            .identity
            .find(id)
            .ok_or_else(|| SchedulingError::NotFound(id.to_string()))?;
        let record = self.record_mut(slot, id)?;

        if record.doctor_id != doctor_id {
            warn!(
                "Doctor {} attempted to confirm appointment {} of doctor {}",
                doctor_id, id, record.doctor_id
            );
            return Err(SchedulingError::PermissionDenied(format!(
                "{} is not the doctor of appointment {}",
                doctor_id, id
            )));
        }
        if record.status.is_terminal() {
            return Err(SchedulingError::AlreadyRejected(id.to_string()));
        }

        record.status = if accept {
            AppointmentStatus::Confirmed
        } else {
            AppointmentStatus::Rejected
        };
        record.valid = accept;

        info!("Appointment {} is now {}", id, record.status);
        Ok(())
    }

    // ==========================================================================
    // QUERIES
    // ==========================================================================

    pub fn find_by_id(&self, id: &str) -> Option<AppointmentView> {
        let slot = self.identity.find(id)?;
        self.records
            .get(slot)
            .filter(|record| record.valid && record.id == id)
            .map(Appointment::view)
    }

    pub fn exists(&self, id: &str) -> bool {
        self.find_by_id(id).is_some()
    }

    /// Patient's appointments in booking order.
    pub fn find_by_patient(&self, patient_id: &str) -> Vec<AppointmentView> {
        self.views(self.people.patient_bucket(patient_id).iter().copied())
    }

    /// Doctor's appointments in booking order (an edit re-books at the end).
    pub fn find_by_doctor(&self, doctor_id: &str) -> Vec<AppointmentView> {
        self.views(self.doctor_sequence.list_by_doctor(doctor_id, &self.records))
    }

    /// Appointments with `time` in `[start, end]`, ascending by time.
    pub fn find_by_time_range(
        &self,
        start: i64,
        end: i64,
    ) -> Result<Vec<AppointmentView>, SchedulingError> {
        if end < start {
            return Err(SchedulingError::InvalidRange { start, end });
        }
        Ok(self.views(self.timeline.range(start, end, &self.records)))
    }

    /// Appointments of `doctor_id` that would clash with a booking at `time`.
    pub fn find_conflicts(&self, doctor_id: &str, time: i64) -> Vec<AppointmentView> {
        let slots = self.conflicts.conflicting_slots(
            self.people.doctor_bucket(doctor_id),
            &self.records,
            time,
            None,
        );
        self.views(slots)
    }

    pub fn due_within(&mut self, hours_ahead: i64) -> Vec<AppointmentView> {
        self.due_within_at(now_timestamp(), hours_ahead)
    }

    /// Appointments in `[now, now + hours_ahead)`, soonest first. Leaves every
    /// live reminder queued.
    pub fn due_within_at(&mut self, now: i64, hours_ahead: i64) -> Vec<AppointmentView> {
        let due = self.reminders.due_within(now, hours_ahead, &self.records);
        debug!("{} appointments due within {}h of {}", due.len(), hours_ahead, now);
        self.views(due)
    }

    pub fn next_upcoming(&mut self) -> Result<AppointmentView, SchedulingError> {
        self.next_upcoming_at(now_timestamp())
    }

    /// Soonest queued appointment at or after `now`; nothing is dequeued.
    pub fn next_upcoming_at(&mut self, now: i64) -> Result<AppointmentView, SchedulingError> {
        let entry = self.reminders.peek_from(now, &self.records)?;
        self.records
            .get(entry.slot)
            .map(Appointment::view)
            .ok_or(SchedulingError::QueueEmpty)
    }

    pub fn stats(&self) -> SchedulingStats {
        let mut stats = SchedulingStats {
            reminder_backlog: self.reminders.len(),
            ..SchedulingStats::default()
        };

        for record in self.identity.slots().filter_map(|slot| self.records.get(slot)) {
            match (record.status, record.valid) {
                (AppointmentStatus::Rejected, _) => stats.rejected += 1,
                (AppointmentStatus::Pending, true) => stats.pending += 1,
                (AppointmentStatus::Confirmed, true) => stats.confirmed += 1,
                _ => {}
            }
        }
        stats.active = stats.pending + stats.confirmed;
        stats
    }

    // ==========================================================================
    // HELPERS
    // ==========================================================================

    fn live_slot(&self, id: &str) -> Result<SlotId, SchedulingError> {
        self.identity
            .find(id)
            .filter(|slot| self.records.is_valid(*slot))
            .ok_or_else(|| SchedulingError::NotFound(id.to_string()))
    }

    fn record_mut(&mut self, slot: SlotId, id: &str) -> Result<&mut Appointment, SchedulingError> {
        self.records
            .get_mut(slot)
            .ok_or_else(|| SchedulingError::NotFound(id.to_string()))
    }

    fn queue_reminder(&mut self, slot: SlotId) {
        if let Some(record) = self.records.get(slot) {
            self.reminders.push(ReminderEntry::for_record(slot, record));
        }
    }

    fn views(&self, slots: impl IntoIterator<Item = SlotId>) -> Vec<AppointmentView> {
        slots
            .into_iter()
            .filter_map(|slot| self.records.get(slot))
            .filter(|record| record.valid)
            .map(Appointment::view)
            .collect()
    }
}
