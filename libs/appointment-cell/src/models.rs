// libs/appointment-cell/src/models.rs
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ==============================================================================
// CORE APPOINTMENT MODELS
// ==============================================================================

/// One reservation of a doctor's slot. Only `status` changes after creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Appointment {
    pub id: Uuid,
    pub doctor_id: String,
    pub patient_name: String,
    /// Account of the patient who booked, when booked through an account.
    pub patient_id: Option<String>,
    /// The slot label exactly as published in the doctor's catalog.
    pub slot: String,
    pub notes: Option<String>,
    pub gender: Gender,
    pub age: u8,
    pub status: AppointmentStatus,
    pub created_at: DateTime<Utc>,
}

impl Appointment {
    /// Resolved start of the slot as of `now`.
    pub fn scheduled_at(&self, now: NaiveDateTime) -> NaiveDateTime {
        shared_models::slot::resolve(&self.slot, now)
    }

    pub fn holds_slot(&self) -> bool {
        self.status.holds_slot()
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum AppointmentStatus {
    Upcoming,
    Done,
    NoShow,
    Cancelled,
}

impl AppointmentStatus {
    /// Statuses that keep the doctor's slot occupied.
    pub const SLOT_HOLDING: [AppointmentStatus; 3] = [
        AppointmentStatus::Upcoming,
        AppointmentStatus::Done,
        AppointmentStatus::NoShow,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AppointmentStatus::Upcoming => "upcoming",
            AppointmentStatus::Done => "done",
            AppointmentStatus::NoShow => "no_show",
            AppointmentStatus::Cancelled => "cancelled",
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, AppointmentStatus::Upcoming)
    }

    pub fn holds_slot(&self) -> bool {
        !matches!(self, AppointmentStatus::Cancelled)
    }

    /// Outcomes that only make sense once the visit time has passed.
    pub fn requires_elapsed_slot(&self) -> bool {
        matches!(self, AppointmentStatus::Done | AppointmentStatus::NoShow)
    }
}

impl fmt::Display for AppointmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AppointmentStatus {
    type Err = AppointmentError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim() {
            "upcoming" => Ok(AppointmentStatus::Upcoming),
            "done" => Ok(AppointmentStatus::Done),
            "no_show" => Ok(AppointmentStatus::NoShow),
            "cancelled" => Ok(AppointmentStatus::Cancelled),
            other => Err(AppointmentError::InvalidStatus(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum Gender {
    Male,
    Female,
    Other,
}

// ==============================================================================
// REQUEST/RESPONSE MODELS
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookAppointmentRequest {
    pub doctor_id: String,
    pub slot: String,
    pub patient_name: String,
    pub notes: Option<String>,
    pub gender: Gender,
    pub age: u8,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateStatusRequest {
    /// Raw target status; validated by the lifecycle service.
    pub status: String,
}

/// Store-level query. `None` fields do not filter.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AppointmentFilter {
    pub doctor_id: Option<String>,
    pub patient_id: Option<String>,
    pub statuses: Option<Vec<AppointmentStatus>>,
}

impl AppointmentFilter {
    pub fn for_doctor(doctor_id: &str) -> Self {
        Self {
            doctor_id: Some(doctor_id.to_string()),
            ..Self::default()
        }
    }

    pub fn for_patient(patient_id: &str) -> Self {
        Self {
            patient_id: Some(patient_id.to_string()),
            ..Self::default()
        }
    }

    pub fn slot_holding(mut self) -> Self {
        self.statuses = Some(AppointmentStatus::SLOT_HOLDING.to_vec());
        self
    }

    pub fn matches(&self, appointment: &Appointment) -> bool {
        self.doctor_id.as_ref().map_or(true, |d| &appointment.doctor_id == d)
            && self
                .patient_id
                .as_ref()
                .map_or(true, |p| appointment.patient_id.as_ref() == Some(p))
            && self
                .statuses
                .as_ref()
                .map_or(true, |s| s.contains(&appointment.status))
    }
}

// ==============================================================================
// SCHEDULE VIEW MODELS
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleEntry {
    pub appointment: Appointment,
    pub scheduled_at: NaiveDateTime,
    pub is_past: bool,
    /// Status changes the doctor may apply right now.
    pub available_actions: Vec<AppointmentStatus>,
    /// Set when the slot label could only be partly resolved.
    pub slot_warning: Option<String>,
}

/// Doctor calendar for the month containing "now".
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DoctorSchedule {
    pub today_count: usize,
    pub upcoming_count: usize,
    pub year: i32,
    pub month: u32,
    pub days_in_month: u32,
    /// Weekday of the 1st, counted from Sunday = 0.
    pub first_weekday_offset: u32,
    /// Index 0 is day 1.
    pub per_day_counts: Vec<u32>,
    /// Heat-map shade per day, 0 through 5.
    pub heat_levels: Vec<u8>,
    /// Chronological.
    pub entries: Vec<ScheduleEntry>,
}

impl DoctorSchedule {
    /// Appointments on a 1-indexed day of the month; 0 outside the month.
    pub fn count_for_day(&self, day: u32) -> u32 {
        day.checked_sub(1)
            .and_then(|idx| self.per_day_counts.get(idx as usize))
            .copied()
            .unwrap_or(0)
    }
}

// ==============================================================================
// ERROR TYPES
// ==============================================================================

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum AppointmentError {
    #[error("Appointment {0} not found")]
    NotFound(Uuid),

    #[error("Doctor {0} not found")]
    DoctorNotFound(String),

    #[error("Slot '{slot}' with doctor {doctor_id} is already booked")]
    SlotAlreadyBooked { doctor_id: String, slot: String },

    #[error("Doctor {doctor_id} does not offer slot '{slot}'")]
    SlotNotOffered { doctor_id: String, slot: String },

    #[error("Slot '{0}' is no longer in the future")]
    SlotInPast(String),

    #[error("Invalid status: '{0}' (expected one of done, no_show, cancelled)")]
    InvalidStatus(String),

    #[error("Appointment cannot be marked {status} before {scheduled_at}")]
    TransitionNotYetEligible {
        status: AppointmentStatus,
        scheduled_at: NaiveDateTime,
    },

    #[error("Appointment is already {0} and cannot change status")]
    TerminalStatus(AppointmentStatus),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Unauthorized access to appointment")]
    Unauthorized,

    #[error("Appointment storage temporarily unavailable: {0}")]
    StorageUnavailable(String),

    #[error("Database error: {0}")]
    DatabaseError(String),
}

// ==============================================================================
// VALIDATION MODELS
// ==============================================================================

#[derive(Debug, Clone)]
pub struct AppointmentValidationRules {
    pub max_patient_name_length: usize,
    pub max_notes_length: usize,
    pub max_age: u8,
}

impl Default for AppointmentValidationRules {
    fn default() -> Self {
        Self {
            max_patient_name_length: 100,
            max_notes_length: 1000,
            max_age: 130,
        }
    }
}
