// libs/appointment-cell/src/handlers.rs
use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};

use shared_models::error::AppError;
use shared_utils::extractor::RequesterIdentity;
use shared_utils::time::{local_day_bounds, now_timestamp, parse_time_param};
use shared_utils::validation::{ensure_future, validate_identifier};

use crate::models::{
    AppointmentResponse, ConfirmAppointmentRequest, CreateAppointmentRequest,
    RescheduleAppointmentRequest,
};
use crate::router::RESERVED_APPOINTMENT_IDS;
use crate::state::AppState;

// ==============================================================================
// QUERY PARAMETER STRUCTS
// ==============================================================================

/// `from`/`to` accept epoch seconds or `DD-MM-YYYY HH:MM`.
#[derive(Debug, Deserialize)]
pub struct TimeRangeQuery {
    pub from: String,
    pub to: String,
}

#[derive(Debug, Deserialize)]
pub struct RemindersQuery {
    pub hours_ahead: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct ConflictCheckQuery {
    pub doctor_id: String,
    pub time: String,
}

// ==============================================================================
// LIFECYCLE HANDLERS
// ==============================================================================

#[axum::debug_handler]
pub async fn create_appointment(
    State(state): State<Arc<AppState>>,
    Json(request): Json<CreateAppointmentRequest>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let id = validate_identifier("appointment id", &request.id)?;
    if RESERVED_APPOINTMENT_IDS.contains(&id.as_str()) {
        return Err(AppError::ValidationError(format!(
            "appointment id '{}' is reserved",
            id
        )));
    }
    let patient_id = validate_identifier("patient id", &request.patient_id)?;
    let doctor_id = validate_identifier("doctor id", &request.doctor_id)?;

    let offset = state.utc_offset();
    let time = request.time.resolve(offset)?;
    ensure_future(time, now_timestamp())?;

    let mut engine = state.engine.write().await;
    engine.create(&id, &patient_id, &doctor_id, time, request.status)?;

    let appointment = engine
        .find_by_id(&id)
        .ok_or_else(|| AppError::Internal(format!("Appointment {} missing after create", id)))?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "appointment": AppointmentResponse::new(appointment, offset),
            "message": "Appointment booked successfully"
        })),
    ))
}

#[axum::debug_handler]
pub async fn reschedule_appointment(
    State(state): State<Arc<AppState>>,
    Path(appointment_id): Path<String>,
    Json(request): Json<RescheduleAppointmentRequest>,
) -> Result<Json<Value>, AppError> {
    let doctor_id = validate_identifier("doctor id", &request.doctor_id)?;

    let offset = state.utc_offset();
    let time = request.time.resolve(offset)?;
    ensure_future(time, now_timestamp())?;

    let mut engine = state.engine.write().await;
    engine.edit(&appointment_id, time, &doctor_id)?;

    let appointment = engine.find_by_id(&appointment_id).ok_or_else(|| {
        AppError::Internal(format!("Appointment {} missing after edit", appointment_id))
    })?;

    Ok(Json(json!({
        "success": true,
        "appointment": AppointmentResponse::new(appointment, offset),
        "message": "Appointment rescheduled successfully"
    })))
}

#[axum::debug_handler]
pub async fn cancel_appointment(
    State(state): State<Arc<AppState>>,
    Path(appointment_id): Path<String>,
    RequesterIdentity(requester): RequesterIdentity,
) -> Result<Json<Value>, AppError> {
    let mut engine = state.engine.write().await;
    engine.cancel(&appointment_id, &requester.id, requester.role)?;

    Ok(Json(json!({
        "success": true,
        "message": format!("Appointment {} cancelled", appointment_id)
    })))
}

#[axum::debug_handler]
pub async fn confirm_appointment(
    State(state): State<Arc<AppState>>,
    Path(appointment_id): Path<String>,
    RequesterIdentity(requester): RequesterIdentity,
    Json(request): Json<ConfirmAppointmentRequest>,
) -> Result<Json<Value>, AppError> {
    if !requester.is_doctor() {
        return Err(AppError::Forbidden(
            "Only the appointment's doctor can confirm or reject it".to_string(),
        ));
    }

    let mut engine = state.engine.write().await;
    engine.confirm(&appointment_id, &requester.id, request.accept)?;

    Ok(Json(json!({
        "success": true,
        "status": if request.accept { "confirmed" } else { "rejected" },
        "message": format!(
            "Appointment {} {}",
            appointment_id,
            if request.accept { "confirmed" } else { "rejected" }
        )
    })))
}

// ==============================================================================
// QUERY HANDLERS
// ==============================================================================

#[axum::debug_handler]
pub async fn get_appointment(
    State(state): State<Arc<AppState>>,
    Path(appointment_id): Path<String>,
) -> Result<Json<Value>, AppError> {
    let engine = state.engine.read().await;
    let appointment = engine
        .find_by_id(&appointment_id)
        .ok_or_else(|| AppError::NotFound(format!("Appointment {} not found", appointment_id)))?;

    Ok(Json(json!(AppointmentResponse::new(appointment, state.utc_offset()))))
}

#[axum::debug_handler]
pub async fn appointment_exists(
    State(state): State<Arc<AppState>>,
    Path(appointment_id): Path<String>,
) -> Json<Value> {
    let exists = state.engine.read().await.exists(&appointment_id);
    Json(json!({
        "id": appointment_id,
        "exists": exists
    }))
}

#[axum::debug_handler]
pub async fn get_patient_appointments(
    State(state): State<Arc<AppState>>,
    Path(patient_id): Path<String>,
) -> Json<Value> {
    let appointments = state.engine.read().await.find_by_patient(&patient_id);
    Json(json!({
        "patient_id": patient_id,
        "appointments": AppointmentResponse::list(appointments, state.utc_offset())
    }))
}

#[axum::debug_handler]
pub async fn get_doctor_appointments(
    State(state): State<Arc<AppState>>,
    Path(doctor_id): Path<String>,
) -> Json<Value> {
    let appointments = state.engine.read().await.find_by_doctor(&doctor_id);
    Json(json!({
        "doctor_id": doctor_id,
        "appointments": AppointmentResponse::list(appointments, state.utc_offset())
    }))
}

#[axum::debug_handler]
pub async fn search_appointments(
    State(state): State<Arc<AppState>>,
    Query(query): Query<TimeRangeQuery>,
) -> Result<Json<Value>, AppError> {
    let offset = state.utc_offset();
    let start = parse_time_param(&query.from, offset)?;
    let end = parse_time_param(&query.to, offset)?;

    let appointments = state.engine.read().await.find_by_time_range(start, end)?;

    Ok(Json(json!({
        "from": start,
        "to": end,
        "appointments": AppointmentResponse::list(appointments, offset)
    })))
}

/// Appointments in the current calendar day of the display zone.
#[axum::debug_handler]
pub async fn get_today_appointments(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Value>, AppError> {
    let offset = state.utc_offset();
    let (start, end) = local_day_bounds(now_timestamp(), offset);

    let appointments = state.engine.read().await.find_by_time_range(start, end)?;

    Ok(Json(json!({
        "from": start,
        "to": end,
        "appointments": AppointmentResponse::list(appointments, offset)
    })))
}

#[axum::debug_handler]
pub async fn get_due_reminders(
    State(state): State<Arc<AppState>>,
    Query(query): Query<RemindersQuery>,
) -> Result<Json<Value>, AppError> {
    let hours_ahead = query.hours_ahead.unwrap_or(state.config.default_reminder_hours);
    if hours_ahead < 1 || hours_ahead > state.config.max_reminder_hours {
        return Err(AppError::ValidationError(format!(
            "hours_ahead must be between 1 and {}",
            state.config.max_reminder_hours
        )));
    }

    let appointments = state.engine.write().await.due_within(hours_ahead);

    Ok(Json(json!({
        "hours_ahead": hours_ahead,
        "reminders": AppointmentResponse::list(appointments, state.utc_offset())
    })))
}

#[axum::debug_handler]
pub async fn get_next_reminder(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Value>, AppError> {
    let appointment = state.engine.write().await.next_upcoming()?;
    Ok(Json(json!(AppointmentResponse::new(appointment, state.utc_offset()))))
}

#[axum::debug_handler]
pub async fn check_appointment_conflicts(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ConflictCheckQuery>,
) -> Result<Json<Value>, AppError> {
    let offset = state.utc_offset();
    let time = parse_time_param(&query.time, offset)?;

    let conflicts = state.engine.read().await.find_conflicts(&query.doctor_id, time);

    Ok(Json(json!({
        "doctor_id": query.doctor_id,
        "time": time,
        "has_conflict": !conflicts.is_empty(),
        "conflicting_appointments": AppointmentResponse::list(conflicts, offset)
    })))
}

#[axum::debug_handler]
pub async fn get_appointment_stats(State(state): State<Arc<AppState>>) -> Json<Value> {
    let stats = state.engine.read().await.stats();
    Json(json!(stats))
}
