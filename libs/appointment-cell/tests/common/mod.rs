#![allow(dead_code)]

use std::sync::Arc;

use chrono::NaiveDateTime;

use appointment_cell::models::{BookAppointmentRequest, Gender};
use appointment_cell::services::{AppointmentBookingService, AppointmentStore, InMemoryAppointmentStore};
use doctor_cell::models::Doctor;
use doctor_cell::services::StaticDoctorDirectory;
use shared_models::clock::FixedClock;
use shared_utils::test_utils::local_time;

/// Wednesday 2024-03-06, 10:00 local.
pub fn wednesday_morning() -> NaiveDateTime {
    local_time(2024, 3, 6, 10, 0)
}

pub fn doctor(id: &str, slots: &[&str]) -> Doctor {
    Doctor {
        id: id.to_string(),
        name: format!("Dr. {}", id),
        specialization: "General Physician".to_string(),
        bio: String::new(),
        image_url: None,
        available_slots: slots.iter().map(|s| s.to_string()).collect(),
        rating: 4.6,
        experience_years: 8,
        location: "City Clinic OPD".to_string(),
        city: "Pune".to_string(),
    }
}

pub fn directory() -> Arc<StaticDoctorDirectory> {
    Arc::new(
        StaticDoctorDirectory::from_doctors(vec![
            doctor(
                "d1",
                &[
                    "Today, 09:00 AM",
                    "Today, 02:00 PM",
                    "Tomorrow, 09:00 AM",
                    "Tomorrow, 11:30 AM",
                    "Mar 12, 10:00 AM",
                ],
            ),
            doctor("d2", &["Tomorrow, 09:00 AM", "Fri, 04:00 PM"]),
        ])
        .expect("unique doctor ids"),
    )
}

pub struct Harness {
    pub store: Arc<InMemoryAppointmentStore>,
    pub clock: Arc<FixedClock>,
    pub booking: Arc<AppointmentBookingService>,
}

pub fn harness() -> Harness {
    harness_with_store_at(wednesday_morning())
}

pub fn harness_with_store_at(now: NaiveDateTime) -> Harness {
    let store = Arc::new(InMemoryAppointmentStore::new());
    let clock = Arc::new(FixedClock::at(now));
    let booking = Arc::new(AppointmentBookingService::new(
        store.clone() as Arc<dyn AppointmentStore>,
        directory(),
        clock.clone(),
    ));

    Harness { store, clock, booking }
}

pub fn request(doctor_id: &str, slot: &str) -> BookAppointmentRequest {
    BookAppointmentRequest {
        doctor_id: doctor_id.to_string(),
        slot: slot.to_string(),
        patient_name: "Meera Kulkarni".to_string(),
        notes: Some("Follow-up for blood pressure".to_string()),
        gender: Gender::Female,
        age: 41,
    }
}
