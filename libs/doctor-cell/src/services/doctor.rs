use std::collections::BTreeSet;
use std::sync::Arc;

use tracing::debug;

use crate::models::{Doctor, DoctorError, DoctorSearchFilters};
use crate::services::directory::DoctorDirectory;

pub struct DoctorService {
    directory: Arc<dyn DoctorDirectory>,
}

impl DoctorService {
    pub fn new(directory: Arc<dyn DoctorDirectory>) -> Self {
        Self { directory }
    }

    pub fn directory(&self) -> Arc<dyn DoctorDirectory> {
        Arc::clone(&self.directory)
    }

    pub fn get_doctor(&self, doctor_id: &str) -> Result<Doctor, DoctorError> {
        self.directory
            .get(doctor_id)
            .ok_or_else(|| DoctorError::NotFound(doctor_id.to_string()))
    }

    /// Free-text search plus an exact specialization filter.
    pub fn search_doctors(&self, filters: &DoctorSearchFilters) -> Vec<Doctor> {
        let doctors: Vec<Doctor> = self
            .directory
            .list()
            .into_iter()
            .filter(|d| {
                filters
                    .search
                    .as_deref()
                    .map_or(true, |term| d.matches_search(term))
            })
            .filter(|d| {
                filters
                    .specialization
                    .as_deref()
                    .filter(|s| !s.is_empty())
                    .map_or(true, |s| d.specialization == s)
            })
            .collect();

        debug!("Doctor search {:?} matched {} doctors", filters, doctors.len());
        doctors
    }

    /// Distinct specializations, sorted.
    pub fn specializations(&self) -> Vec<String> {
        self.directory
            .list()
            .into_iter()
            .map(|d| d.specialization)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }
}
