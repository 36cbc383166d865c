// libs/appointment-cell/src/handlers.rs
use axum::{
    extract::{rejection::JsonRejection, Extension, Path, State},
    http::StatusCode,
    Json,
};
use serde_json::{json, Value};
use tracing::debug;
use uuid::Uuid;

use shared_models::auth::User;
use shared_models::error::AppError;
use shared_utils::extractor::{require_doctor, require_patient};

use crate::models::{Appointment, AppointmentError, BookAppointmentRequest, UpdateStatusRequest};
use crate::state::AppointmentState;

impl From<AppointmentError> for AppError {
    fn from(e: AppointmentError) -> Self {
        match e {
            AppointmentError::SlotAlreadyBooked { .. } => {
                AppError::Conflict(format!("{}. Please choose another slot.", e))
            }
            AppointmentError::TerminalStatus(_) => AppError::Conflict(e.to_string()),
            AppointmentError::InvalidStatus(_) | AppointmentError::ValidationError(_) => {
                AppError::BadRequest(e.to_string())
            }
            AppointmentError::SlotNotOffered { .. } => AppError::BadRequest(e.to_string()),
            AppointmentError::TransitionNotYetEligible { .. } => AppError::Unprocessable(format!(
                "{}. Wait until the appointment time has passed.",
                e
            )),
            AppointmentError::SlotInPast(_) => {
                AppError::Unprocessable(format!("{}. Please choose a later slot.", e))
            }
            AppointmentError::NotFound(_) | AppointmentError::DoctorNotFound(_) => {
                AppError::NotFound(e.to_string())
            }
            AppointmentError::Unauthorized => AppError::Forbidden(e.to_string()),
            AppointmentError::StorageUnavailable(_) => AppError::Unavailable(e.to_string()),
            AppointmentError::DatabaseError(msg) => AppError::Database(msg),
        }
    }
}

fn can_view(user: &User, appointment: &Appointment) -> bool {
    if user.is_doctor() {
        appointment.doctor_id == user.id
    } else {
        appointment.patient_id.as_deref() == Some(user.id.as_str())
    }
}

// ==============================================================================
// PUBLIC HANDLERS (NO AUTHENTICATION REQUIRED)
// ==============================================================================

#[axum::debug_handler]
pub async fn get_available_slots(
    State(state): State<AppointmentState>,
    Path(doctor_id): Path<String>,
) -> Result<Json<Value>, AppError> {
    let response = state.booking.available_slots(&doctor_id).await?;

    Ok(Json(json!({
        "doctor_id": response.doctor_id,
        "available_slots": response.labels(),
        "slots": response.slots,
        "as_of": response.as_of,
    })))
}

// ==============================================================================
// PATIENT HANDLERS
// ==============================================================================

#[axum::debug_handler]
pub async fn book_appointment(
    State(state): State<AppointmentState>,
    Extension(user): Extension<User>,
    payload: Result<Json<BookAppointmentRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    require_patient(&user)?;

    let Json(request) = payload
        .map_err(|rejection| AppointmentError::ValidationError(rejection.body_text()))?;

    let appointment = state.booking.book_appointment(request, Some(&user.id)).await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "appointment": appointment,
            "message": "Appointment booked successfully",
        })),
    ))
}

#[axum::debug_handler]
pub async fn cancel_appointment(
    State(state): State<AppointmentState>,
    Extension(user): Extension<User>,
    Path(appointment_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    require_patient(&user)?;

    let appointment = state.booking.get_appointment(appointment_id).await?;
    if appointment.patient_id.as_deref() != Some(user.id.as_str()) {
        return Err(AppointmentError::Unauthorized.into());
    }

    let cancelled = state.booking.cancel_appointment(appointment_id).await?;

    Ok(Json(json!({
        "success": true,
        "appointment": cancelled,
        "message": "Appointment cancelled",
    })))
}

// ==============================================================================
// SHARED HANDLERS
// ==============================================================================

/// Doctors see their own book; patients see their own appointments.
#[axum::debug_handler]
pub async fn list_appointments(
    State(state): State<AppointmentState>,
    Extension(user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    let appointments = if user.is_doctor() {
        state.booking.doctor_appointments(&user.id).await?
    } else {
        require_patient(&user)?;
        state.booking.patient_appointments(&user.id).await?
    };

    debug!("Listing {} appointments for {}", appointments.len(), user.id);

    Ok(Json(json!({
        "appointments": appointments,
        "total": appointments.len(),
    })))
}

#[axum::debug_handler]
pub async fn get_appointment(
    State(state): State<AppointmentState>,
    Extension(user): Extension<User>,
    Path(appointment_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    let appointment = state.booking.get_appointment(appointment_id).await?;

    if !can_view(&user, &appointment) {
        return Err(AppointmentError::Unauthorized.into());
    }

    Ok(Json(json!(appointment)))
}

// ==============================================================================
// DOCTOR HANDLERS
// ==============================================================================

#[axum::debug_handler]
pub async fn get_doctor_schedule(
    State(state): State<AppointmentState>,
    Extension(user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    require_doctor(&user)?;

    let schedule = state.booking.doctor_schedule(&user.id).await?;
    Ok(Json(json!(schedule)))
}

#[axum::debug_handler]
pub async fn update_appointment_status(
    State(state): State<AppointmentState>,
    Extension(user): Extension<User>,
    Path(appointment_id): Path<Uuid>,
    Json(request): Json<UpdateStatusRequest>,
) -> Result<Json<Value>, AppError> {
    require_doctor(&user)?;

    let appointment = state.booking.get_appointment(appointment_id).await?;
    if appointment.doctor_id != user.id {
        return Err(AppointmentError::Unauthorized.into());
    }

    let updated = state
        .booking
        .update_status(appointment_id, &request.status)
        .await?;

    Ok(Json(json!({
        "success": true,
        "appointment": updated,
    })))
}
