// libs/appointment-cell/src/models.rs
use serde::{Deserialize, Serialize};
use std::fmt;

use shared_utils::time::{format_display_time, TimeInput};

// ==============================================================================
// CORE APPOINTMENT MODELS
// ==============================================================================

/// The record every index refers to. Owned by the record arena; the indexes
/// only hold slot handles.
#[derive(Debug, Clone, PartialEq)]
pub struct Appointment {
    pub id: String,
    pub patient_id: String,
    pub doctor_id: String,
    /// Seconds since the Unix epoch, timezone-free.
    pub time: i64,
    pub status: AppointmentStatus,
    /// Tombstone flag. `false` hides the record from every read path.
    pub valid: bool,
    /// Bumped on every edit so reminder entries pushed earlier go stale.
    pub revision: u64,
}

impl Appointment {
    pub fn new(
        id: impl Into<String>,
        patient_id: impl Into<String>,
        doctor_id: impl Into<String>,
        time: i64,
        status: InitialStatus,
    ) -> Self {
        Self {
            id: id.into(),
            patient_id: patient_id.into(),
            doctor_id: doctor_id.into(),
            time,
            status: status.into(),
            valid: true,
            revision: 0,
        }
    }

    pub fn view(&self) -> AppointmentView {
        AppointmentView::from(self)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AppointmentStatus {
    Pending,
    Confirmed,
    Rejected,
}

impl AppointmentStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, AppointmentStatus::Rejected)
    }
}

impl fmt::Display for AppointmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppointmentStatus::Pending => write!(f, "pending"),
            AppointmentStatus::Confirmed => write!(f, "confirmed"),
            AppointmentStatus::Rejected => write!(f, "rejected"),
        }
    }
}

/// Statuses an appointment may be created with.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum InitialStatus {
    #[default]
    Pending,
    Confirmed,
}

impl From<InitialStatus> for AppointmentStatus {
    fn from(status: InitialStatus) -> Self {
        match status {
            InitialStatus::Pending => AppointmentStatus::Pending,
            InitialStatus::Confirmed => AppointmentStatus::Confirmed,
        }
    }
}

/// Read-only snapshot handed out by every query.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AppointmentView {
    pub id: String,
    pub patient_id: String,
    pub doctor_id: String,
    pub time: i64,
    pub status: AppointmentStatus,
}

impl From<&Appointment> for AppointmentView {
    fn from(appointment: &Appointment) -> Self {
        Self {
            id: appointment.id.clone(),
            patient_id: appointment.patient_id.clone(),
            doctor_id: appointment.doctor_id.clone(),
            time: appointment.time,
            status: appointment.status,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct SchedulingStats {
    pub active: usize,
    pub pending: usize,
    pub confirmed: usize,
    /// Rejected appointments still holding their id.
    pub rejected: usize,
    /// Raw heap length, stale entries included.
    pub reminder_backlog: usize,
}

// ==============================================================================
// REQUEST/RESPONSE MODELS
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateAppointmentRequest {
    pub id: String,
    pub patient_id: String,
    pub doctor_id: String,
    pub time: TimeInput,
    #[serde(default)]
    pub status: InitialStatus,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RescheduleAppointmentRequest {
    pub time: TimeInput,
    pub doctor_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfirmAppointmentRequest {
    pub accept: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppointmentResponse {
    #[serde(flatten)]
    pub appointment: AppointmentView,
    pub local_time: String,
}

impl AppointmentResponse {
    pub fn new(appointment: AppointmentView, utc_offset_seconds: i32) -> Self {
        let local_time = format_display_time(appointment.time, utc_offset_seconds);
        Self { appointment, local_time }
    }

    pub fn list(appointments: Vec<AppointmentView>, utc_offset_seconds: i32) -> Vec<Self> {
        appointments
            .into_iter()
            .map(|appointment| Self::new(appointment, utc_offset_seconds))
            .collect()
    }
}
