pub mod availability;
pub mod directory;
pub mod doctor;

pub use availability::{available_slots, AvailabilityService};
pub use directory::{DoctorDirectory, StaticDoctorDirectory};
pub use doctor::DoctorService;
