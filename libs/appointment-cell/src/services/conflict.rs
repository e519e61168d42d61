use tracing::{debug, warn};

use shared_config::DEFAULT_CONFLICT_WINDOW_SECONDS;

use crate::error::SchedulingError;
use crate::services::records::{RecordArena, SlotId};

/// Per-doctor double-booking rule: two valid appointments of one doctor must
/// be at least `window_seconds` apart.
#[derive(Debug, Clone, Copy)]
pub struct ConflictDetector {
    window_seconds: i64,
}

impl Default for ConflictDetector {
    fn default() -> Self {
        Self::new(DEFAULT_CONFLICT_WINDOW_SECONDS)
    }
}

impl ConflictDetector {
    pub fn new(window_seconds: i64) -> Self {
        Self { window_seconds: window_seconds.max(0) }
    }

    pub fn window_seconds(&self) -> i64 {
        self.window_seconds
    }

    /// Exactly one window apart is not a conflict.
    pub fn overlaps(&self, a: i64, b: i64) -> bool {
        a.abs_diff(b) < self.window_seconds.unsigned_abs()
    }

    /// Valid slots among `candidates` that clash with `time`, skipping
    /// `exclude` (the appointment being moved).
    pub fn conflicting_slots(
        &self,
        candidates: &[SlotId],
        records: &RecordArena,
        time: i64,
        exclude: Option<SlotId>,
    ) -> Vec<SlotId> {
        candidates
            .iter()
            .copied()
            .filter(|slot| Some(*slot) != exclude)
            .filter(|slot| {
                records
                    .get(*slot)
                    .is_some_and(|record| record.valid && self.overlaps(record.time, time))
            })
            .collect()
    }

    /// Fails with `DoctorUnavailable` when any candidate clashes with `time`.
    pub fn check_doctor_availability(
        &self,
        doctor_id: &str,
        candidates: &[SlotId],
        records: &RecordArena,
        time: i64,
        exclude: Option<SlotId>,
    ) -> Result<(), SchedulingError> {
        debug!("Checking availability for doctor {} at {}", doctor_id, time);

        let conflicts = self.conflicting_slots(candidates, records, time, exclude);
        if conflicts.is_empty() {
            return Ok(());
        }

        warn!(
            "Conflict detected for doctor {} at {} - {} conflicting appointments",
            doctor_id,
            time,
            conflicts.len()
        );
        Err(SchedulingError::DoctorUnavailable {
            doctor_id: doctor_id.to_string(),
            time,
        })
    }
}
