// libs/doctor-cell/src/services/directory.rs
use std::collections::HashSet;
use std::fs;
use std::path::Path;

use tracing::{debug, info, warn};

use shared_models::clock::{Clock, SystemClock};

use crate::models::{Doctor, DoctorError};

/// Read-only lookup of doctors and their slot catalogs.
pub trait DoctorDirectory: Send + Sync {
    fn get(&self, doctor_id: &str) -> Option<Doctor>;

    /// All doctors in publication order.
    fn list(&self) -> Vec<Doctor>;
}

/// Directory held entirely in memory, loaded once at startup.
#[derive(Debug, Clone)]
pub struct StaticDoctorDirectory {
    doctors: Vec<Doctor>,
}

impl StaticDoctorDirectory {
    pub fn from_doctors(doctors: Vec<Doctor>) -> Result<Self, DoctorError> {
        let mut seen = HashSet::new();
        for doctor in &doctors {
            if !seen.insert(doctor.id.as_str()) {
                return Err(DoctorError::DuplicateId(doctor.id.clone()));
            }
        }

        let now = SystemClock.now();
        for doctor in &doctors {
            for malformed in doctor.malformed_slots(now) {
                warn!("Doctor {}: {}", doctor.id, malformed);
            }
        }

        Ok(Self { doctors })
    }

    /// Load a JSON array of doctors.
    pub fn from_json_file(path: &Path) -> Result<Self, DoctorError> {
        debug!("Loading doctor directory from {}", path.display());
        let raw = fs::read_to_string(path)?;
        let doctors: Vec<Doctor> = serde_json::from_str(&raw)?;
        let directory = Self::from_doctors(doctors)?;
        info!("Loaded {} doctors from {}", directory.doctors.len(), path.display());
        Ok(directory)
    }

    /// The built-in QuickCare roster.
    pub fn quickcare_roster() -> Self {
        Self { doctors: roster() }
    }
}

impl DoctorDirectory for StaticDoctorDirectory {
    fn get(&self, doctor_id: &str) -> Option<Doctor> {
        self.doctors.iter().find(|d| d.id == doctor_id).cloned()
    }

    fn list(&self) -> Vec<Doctor> {
        self.doctors.clone()
    }
}

fn slots(labels: &[&str]) -> Vec<String> {
    labels.iter().map(|s| s.to_string()).collect()
}

fn roster() -> Vec<Doctor> {
    vec![
        Doctor {
            id: "doc1".to_string(),
            name: "Dr. Priya Sharma".to_string(),
            specialization: "Cardiologist".to_string(),
            bio: "Board-certified cardiologist with over 15 years of experience in complex heart conditions and preventive care.".to_string(),
            image_url: None,
            available_slots: slots(&[
                "Today, 09:00 AM", "Today, 09:30 AM", "Today, 10:00 AM", "Today, 02:00 PM",
                "Today, 02:30 PM", "Tomorrow, 09:00 AM", "Tomorrow, 10:30 AM", "Tomorrow, 03:00 PM",
            ]),
            rating: 4.8,
            experience_years: 15,
            location: "Sanjeevani OPD".to_string(),
            city: "Satara".to_string(),
        },
        Doctor {
            id: "doc2".to_string(),
            name: "Dr. Rohan Patel".to_string(),
            specialization: "Pediatrician".to_string(),
            bio: "Pediatrician with expertise in child development and common pediatric illnesses.".to_string(),
            image_url: None,
            available_slots: slots(&[
                "Today, 08:00 AM", "Today, 08:30 AM", "Today, 11:00 AM", "Today, 03:00 PM",
                "Tomorrow, 08:30 AM", "Tomorrow, 11:30 AM", "Tomorrow, 04:00 PM",
            ]),
            rating: 4.9,
            experience_years: 12,
            location: "Arogya Clinic".to_string(),
            city: "Satara".to_string(),
        },
        Doctor {
            id: "doc3".to_string(),
            name: "Dr. Ananya Reddy".to_string(),
            specialization: "Dermatologist".to_string(),
            bio: "Medical and cosmetic dermatology, from acne treatment to anti-aging therapies.".to_string(),
            image_url: None,
            available_slots: slots(&[
                "Today, 10:00 AM", "Today, 10:30 AM", "Today, 11:30 AM", "Today, 01:00 PM",
                "Tomorrow, 10:00 AM", "Tomorrow, 01:30 PM", "Tomorrow, 02:00 PM",
            ]),
            rating: 4.7,
            experience_years: 10,
            location: "Sahyadri Polyclinic".to_string(),
            city: "Satara".to_string(),
        },
        Doctor {
            id: "doc4".to_string(),
            name: "Dr. Vikram Singh".to_string(),
            specialization: "Neurologist".to_string(),
            bio: "Diagnoses and treats neurological disorders.".to_string(),
            image_url: None,
            available_slots: slots(&[
                "Today, 09:30 AM", "Today, 11:00 AM", "Today, 02:30 PM",
                "Tomorrow, 09:00 AM", "Tomorrow, 11:00 AM", "Tomorrow, 03:30 PM",
            ]),
            rating: 4.6,
            experience_years: 18,
            location: "Krishna Wellness Hub".to_string(),
            city: "Satara".to_string(),
        },
    ]
}
