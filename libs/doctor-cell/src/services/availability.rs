// libs/doctor-cell/src/services/availability.rs
use std::collections::HashSet;
use std::sync::Arc;

use chrono::NaiveDateTime;
use tracing::debug;

use shared_models::slot;

use crate::models::{AvailableSlot, AvailableSlotsResponse, Doctor, DoctorError};
use crate::services::directory::DoctorDirectory;

/// Slots from `catalog` that are neither booked nor at/before `now`, in
/// catalog order. Booked slots are matched by exact label.
pub fn available_slots(
    catalog: &[String],
    booked_slots: &HashSet<String>,
    now: NaiveDateTime,
) -> Vec<String> {
    catalog
        .iter()
        .filter(|label| !booked_slots.contains(label.as_str()))
        .filter(|label| slot::is_future(label, now))
        .cloned()
        .collect()
}

pub struct AvailabilityService {
    directory: Arc<dyn DoctorDirectory>,
}

impl AvailabilityService {
    pub fn new(directory: Arc<dyn DoctorDirectory>) -> Self {
        Self { directory }
    }

    /// Bookable slots for one doctor given the labels already held by active
    /// appointments.
    pub fn doctor_available_slots(
        &self,
        doctor_id: &str,
        booked_slots: &HashSet<String>,
        now: NaiveDateTime,
    ) -> Result<AvailableSlotsResponse, DoctorError> {
        let doctor = self
            .directory
            .get(doctor_id)
            .ok_or_else(|| DoctorError::NotFound(doctor_id.to_string()))?;

        Ok(Self::slots_for(doctor, booked_slots, now))
    }

    /// Same as [`doctor_available_slots`](Self::doctor_available_slots) for a
    /// doctor the caller already looked up.
    pub fn slots_for(
        doctor: Doctor,
        booked_slots: &HashSet<String>,
        now: NaiveDateTime,
    ) -> AvailableSlotsResponse {
        let slots: Vec<AvailableSlot> = available_slots(&doctor.available_slots, booked_slots, now)
            .into_iter()
            .map(|label| AvailableSlot {
                starts_at: slot::resolve(&label, now),
                label,
            })
            .collect();

        debug!(
            "Doctor {}: {} of {} slots bookable ({} booked)",
            doctor.id,
            slots.len(),
            doctor.available_slots.len(),
            booked_slots.len()
        );

        AvailableSlotsResponse {
            doctor_id: doctor.id,
            slots,
            as_of: now,
        }
    }
}
