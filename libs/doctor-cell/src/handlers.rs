use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde_json::{json, Value};

use shared_models::error::AppError;

use crate::models::{DoctorError, DoctorSearchFilters};
use crate::services::doctor::DoctorService;

impl From<DoctorError> for AppError {
    fn from(e: DoctorError) -> Self {
        match e {
            DoctorError::NotFound(id) => AppError::NotFound(format!("Doctor {} not found", id)),
            other => AppError::Internal(other.to_string()),
        }
    }
}

// ==============================================================================
// PUBLIC HANDLERS (NO AUTHENTICATION REQUIRED)
// ==============================================================================

#[axum::debug_handler]
pub async fn search_doctors(
    State(doctors): State<Arc<DoctorService>>,
    Query(filters): Query<DoctorSearchFilters>,
) -> Result<Json<Value>, AppError> {
    let results = doctors.search_doctors(&filters);

    Ok(Json(json!({
        "doctors": results,
        "total": results.len(),
    })))
}

#[axum::debug_handler]
pub async fn get_doctor(
    State(doctors): State<Arc<DoctorService>>,
    Path(doctor_id): Path<String>,
) -> Result<Json<Value>, AppError> {
    let doctor = doctors.get_doctor(&doctor_id)?;
    Ok(Json(json!(doctor)))
}

#[axum::debug_handler]
pub async fn list_specializations(
    State(doctors): State<Arc<DoctorService>>,
) -> Result<Json<Value>, AppError> {
    Ok(Json(json!({
        "specializations": doctors.specializations(),
    })))
}
