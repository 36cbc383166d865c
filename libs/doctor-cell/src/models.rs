use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use shared_models::slot::{self, MalformedSlotLabel};

/// A doctor as published in the directory. `available_slots` is the slot
/// catalog: display labels such as `"Today, 09:00 AM"`, in publication order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Doctor {
    pub id: String,
    pub name: String,
    pub specialization: String,
    #[serde(default)]
    pub bio: String,
    #[serde(default, alias = "imageUrl")]
    pub image_url: Option<String>,
    #[serde(alias = "availableSlots")]
    pub available_slots: Vec<String>,
    #[serde(default)]
    pub rating: f32,
    #[serde(default, alias = "experience")]
    pub experience_years: u32,
    /// OPD name, e.g. "Sanjeevani OPD".
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub city: String,
}

impl Doctor {
    pub fn offers_slot(&self, slot: &str) -> bool {
        self.available_slots.iter().any(|s| s == slot)
    }

    /// Catalog labels that do not fully resolve as of `now`.
    pub fn malformed_slots(&self, now: NaiveDateTime) -> Vec<MalformedSlotLabel> {
        self.available_slots
            .iter()
            .filter_map(|label| slot::try_resolve(label, now).err())
            .collect()
    }

    /// Case-insensitive match on name, specialization, OPD and city.
    pub fn matches_search(&self, term: &str) -> bool {
        let term = term.trim().to_lowercase();
        if term.is_empty() {
            return true;
        }
        [&self.name, &self.specialization, &self.location, &self.city]
            .iter()
            .any(|field| field.to_lowercase().contains(&term))
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DoctorSearchFilters {
    pub search: Option<String>,
    pub specialization: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AvailableSlot {
    pub label: String,
    pub starts_at: NaiveDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AvailableSlotsResponse {
    pub doctor_id: String,
    pub slots: Vec<AvailableSlot>,
    pub as_of: NaiveDateTime,
}

impl AvailableSlotsResponse {
    pub fn labels(&self) -> Vec<&str> {
        self.slots.iter().map(|s| s.label.as_str()).collect()
    }
}

#[derive(Debug, Error)]
pub enum DoctorError {
    #[error("Doctor not found: {0}")]
    NotFound(String),

    #[error("Duplicate doctor id in directory: {0}")]
    DuplicateId(String),

    #[error("Failed to read doctor directory: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid doctor directory: {0}")]
    Parse(#[from] serde_json::Error),
}
