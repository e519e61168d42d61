// libs/appointment-cell/src/router.rs
use std::sync::Arc;

use axum::{
    routing::{get, patch, post},
    Router,
};

use crate::handlers;
use crate::state::AppState;

/// Static segments that `/{appointment_id}` can never match.
pub const RESERVED_APPOINTMENT_IDS: &[&str] = &[
    "search",
    "today",
    "stats",
    "conflicts",
    "reminders",
    "patients",
    "doctors",
];

pub fn appointment_routes(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", post(handlers::create_appointment))
        .route("/search", get(handlers::search_appointments))
        .route("/today", get(handlers::get_today_appointments))
        .route("/stats", get(handlers::get_appointment_stats))
        .route("/conflicts/check", get(handlers::check_appointment_conflicts))

        // Reminders
        .route("/reminders", get(handlers::get_due_reminders))
        .route("/reminders/next", get(handlers::get_next_reminder))

        // Appointment listings
        .route("/patients/{patient_id}", get(handlers::get_patient_appointments))
        .route("/doctors/{doctor_id}", get(handlers::get_doctor_appointments))

        // Single appointment
        .route("/{appointment_id}", get(handlers::get_appointment))
        .route("/{appointment_id}/exists", get(handlers::appointment_exists))
        .route("/{appointment_id}/reschedule", patch(handlers::reschedule_appointment))
        .route("/{appointment_id}/cancel", post(handlers::cancel_appointment))
        .route("/{appointment_id}/confirm", post(handlers::confirm_appointment))

        .with_state(state)
}
