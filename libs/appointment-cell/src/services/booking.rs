// libs/appointment-cell/src/services/booking.rs
use std::collections::HashSet;
use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use doctor_cell::models::AvailableSlotsResponse;
use doctor_cell::services::availability::AvailabilityService;
use doctor_cell::services::directory::DoctorDirectory;
use shared_models::clock::Clock;
use shared_models::slot;

use crate::models::{
    Appointment, AppointmentError, AppointmentFilter, AppointmentStatus, AppointmentValidationRules,
    BookAppointmentRequest, DoctorSchedule,
};
use crate::services::lifecycle::AppointmentLifecycleService;
use crate::services::schedule::ScheduleAggregator;
use crate::services::store::{AppointmentStore, StoreError};

impl From<StoreError> for AppointmentError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::SlotTaken { doctor_id, slot } => {
                AppointmentError::SlotAlreadyBooked { doctor_id, slot }
            }
            StoreError::NotFound(id) => AppointmentError::NotFound(id),
            // Lost a race with another status change; report what won
            StoreError::StatusChanged { actual, .. } => AppointmentError::TerminalStatus(actual),
            StoreError::Unavailable(msg) => AppointmentError::StorageUnavailable(msg),
            StoreError::Backend(msg) => AppointmentError::DatabaseError(msg),
        }
    }
}

pub struct AppointmentBookingService {
    store: Arc<dyn AppointmentStore>,
    directory: Arc<dyn DoctorDirectory>,
    clock: Arc<dyn Clock>,
    lifecycle_service: AppointmentLifecycleService,
    aggregator: ScheduleAggregator,
    validation_rules: AppointmentValidationRules,
}

impl AppointmentBookingService {
    pub fn new(
        store: Arc<dyn AppointmentStore>,
        directory: Arc<dyn DoctorDirectory>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            store,
            directory,
            clock,
            lifecycle_service: AppointmentLifecycleService::new(),
            aggregator: ScheduleAggregator::new(),
            validation_rules: AppointmentValidationRules::default(),
        }
    }

    pub fn with_validation_rules(mut self, rules: AppointmentValidationRules) -> Self {
        self.validation_rules = rules;
        self
    }

    pub fn directory(&self) -> Arc<dyn DoctorDirectory> {
        Arc::clone(&self.directory)
    }

    // ==============================================================================
    // AVAILABILITY
    // ==============================================================================

    /// Slot labels currently held by non-cancelled appointments.
    pub async fn booked_slots(&self, doctor_id: &str) -> Result<HashSet<String>, AppointmentError> {
        let held = self
            .store
            .list(&AppointmentFilter::for_doctor(doctor_id).slot_holding())
            .await?;

        Ok(held.into_iter().map(|a| a.slot).collect())
    }

    pub async fn available_slots(&self, doctor_id: &str) -> Result<AvailableSlotsResponse, AppointmentError> {
        let doctor = self
            .directory
            .get(doctor_id)
            .ok_or_else(|| AppointmentError::DoctorNotFound(doctor_id.to_string()))?;

        let booked = self.booked_slots(doctor_id).await?;
        Ok(AvailabilityService::slots_for(doctor, &booked, self.clock.now()))
    }

    // ==============================================================================
    // BOOKING
    // ==============================================================================

    /// Validate and book. `patient_id` links the appointment to the caller's
    /// account.
    #[instrument(skip(self, request), fields(doctor_id = %request.doctor_id, slot = %request.slot))]
    pub async fn book_appointment(
        &self,
        request: BookAppointmentRequest,
        patient_id: Option<&str>,
    ) -> Result<Appointment, AppointmentError> {
        self.validate_booking_request(&request)?;

        let doctor = self
            .directory
            .get(&request.doctor_id)
            .ok_or_else(|| AppointmentError::DoctorNotFound(request.doctor_id.clone()))?;

        if !doctor.offers_slot(&request.slot) {
            return Err(AppointmentError::SlotNotOffered {
                doctor_id: request.doctor_id.clone(),
                slot: request.slot.clone(),
            });
        }

        let now = self.clock.now();
        if !slot::is_future(&request.slot, now) {
            debug!("Slot {} resolves at or before {}", request.slot, now);
            return Err(AppointmentError::SlotInPast(request.slot.clone()));
        }

        self.try_book(request, patient_id).await
    }

    /// Commit a booking if the doctor's slot is still free. The store makes
    /// the check and the insert a single atomic step.
    pub async fn try_book(
        &self,
        request: BookAppointmentRequest,
        patient_id: Option<&str>,
    ) -> Result<Appointment, AppointmentError> {
        let appointment = Appointment {
            id: Uuid::new_v4(),
            doctor_id: request.doctor_id,
            patient_name: request.patient_name.trim().to_string(),
            patient_id: patient_id.map(str::to_string),
            slot: request.slot,
            notes: request.notes.filter(|n| !n.trim().is_empty()),
            gender: request.gender,
            age: request.age,
            status: AppointmentStatus::Upcoming,
            created_at: Utc::now(),
        };

        match self.store.create_if_absent(appointment).await {
            Ok(created) => {
                info!(
                    "Booked appointment {} with {} at '{}'",
                    created.id, created.doctor_id, created.slot
                );
                Ok(created)
            }
            Err(StoreError::SlotTaken { doctor_id, slot }) => {
                warn!("Slot '{}' with {} already booked", slot, doctor_id);
                Err(AppointmentError::SlotAlreadyBooked { doctor_id, slot })
            }
            Err(e) => Err(e.into()),
        }
    }

    fn validate_booking_request(&self, request: &BookAppointmentRequest) -> Result<(), AppointmentError> {
        let rules = &self.validation_rules;
        let name = request.patient_name.trim();

        if name.is_empty() {
            return Err(AppointmentError::ValidationError(
                "Patient name is required".to_string(),
            ));
        }
        if name.chars().count() > rules.max_patient_name_length {
            return Err(AppointmentError::ValidationError(format!(
                "Patient name must be at most {} characters",
                rules.max_patient_name_length
            )));
        }
        if request.age > rules.max_age {
            return Err(AppointmentError::ValidationError(format!(
                "Age must be between 0 and {}",
                rules.max_age
            )));
        }
        if let Some(notes) = &request.notes {
            if notes.chars().count() > rules.max_notes_length {
                return Err(AppointmentError::ValidationError(format!(
                    "Notes must be at most {} characters",
                    rules.max_notes_length
                )));
            }
        }
        if request.slot.trim().is_empty() {
            return Err(AppointmentError::ValidationError("Slot is required".to_string()));
        }

        Ok(())
    }

    // ==============================================================================
    // LIFECYCLE
    // ==============================================================================

    pub async fn get_appointment(&self, id: Uuid) -> Result<Appointment, AppointmentError> {
        Ok(self.store.get(id).await?)
    }

    /// Apply a raw status string. The store only accepts the write if the
    /// status is still the one that was validated.
    #[instrument(skip(self))]
    pub async fn update_status(&self, id: Uuid, raw_status: &str) -> Result<Appointment, AppointmentError> {
        let target = self.lifecycle_service.parse_target(raw_status)?;
        let appointment = self.store.get(id).await?;

        self.lifecycle_service
            .validate_status_transition(&appointment, target, self.clock.now())?;

        let updated = self
            .store
            .update_status(id, appointment.status, target)
            .await?;

        info!("Appointment {} is now {}", id, updated.status);
        Ok(updated)
    }

    pub async fn cancel_appointment(&self, id: Uuid) -> Result<Appointment, AppointmentError> {
        self.update_status(id, AppointmentStatus::Cancelled.as_str()).await
    }

    // ==============================================================================
    // LISTINGS
    // ==============================================================================

    /// The patient's own appointments, cancelled ones hidden.
    pub async fn patient_appointments(&self, patient_id: &str) -> Result<Vec<Appointment>, AppointmentError> {
        let appointments = self
            .store
            .list(&AppointmentFilter::for_patient(patient_id).slot_holding())
            .await?;
        Ok(self.sorted_by_slot(appointments))
    }

    /// Every non-cancelled appointment with the doctor.
    pub async fn doctor_appointments(&self, doctor_id: &str) -> Result<Vec<Appointment>, AppointmentError> {
        let appointments = self
            .store
            .list(&AppointmentFilter::for_doctor(doctor_id).slot_holding())
            .await?;
        Ok(self.sorted_by_slot(appointments))
    }

    pub async fn doctor_schedule(&self, doctor_id: &str) -> Result<DoctorSchedule, AppointmentError> {
        let appointments = self
            .store
            .list(&AppointmentFilter::for_doctor(doctor_id).slot_holding())
            .await?;
        Ok(self.aggregator.aggregate(appointments, self.clock.now()))
    }

    fn sorted_by_slot(&self, mut appointments: Vec<Appointment>) -> Vec<Appointment> {
        let now = self.clock.now();
        appointments.sort_by_cached_key(|a| a.scheduled_at(now));
        appointments
    }
}
